use serde::{Deserialize, Serialize};

use super::error::ReferenceError;
use super::me_ids::Dimension;
use super::medata::{BinAxis, MEData};

/// An area normalized, integrated 1D ME of a run next to the same ME of a reference run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceOverlay {
    pub me: String,
    pub bins: Vec<f64>,
    pub current: Vec<f64>,
    pub reference: Vec<f64>,
}

impl ReferenceOverlay {
    /// current / reference per bin; bins where the reference is empty are 0
    pub fn ratio(&self) -> Vec<f64> {
        self.current
            .iter()
            .zip(self.reference.iter())
            .map(|(c, r)| if *r == 0.0 { 0.0 } else { c / r })
            .collect()
    }

    /// Largest absolute bin difference between the two shapes
    pub fn max_deviation(&self) -> f64 {
        self.current
            .iter()
            .zip(self.reference.iter())
            .map(|(c, r)| (c - r).abs())
            .fold(0.0, f64::max)
    }
}

/// Overlay the selected MEs (all if None) of a run onto a reference run.
///
/// Both runs are integrated with area normalization first, which overwrites their integral
/// views. Each run keeps its own exclusion list.
pub fn reference_overlay(
    current: &mut MEData,
    reference: &mut MEData,
    mes: Option<&[&str]>,
) -> Result<Vec<ReferenceOverlay>, ReferenceError> {
    let names: Vec<String> = match mes {
        Some(names) => names.iter().map(|n| n.to_string()).collect(),
        None => current.get_me_names().iter().map(|n| n.to_string()).collect(),
    };

    current.integrate_data(true, &[])?;
    reference.integrate_data(true, &[])?;

    let mut overlays = Vec::with_capacity(names.len());
    for name in names {
        for run in [&*current, &*reference] {
            if run.get_dims(&name)? != Dimension::One {
                return Err(ReferenceError::ReferenceDimension(name));
            }
        }
        let bins = current.get_bins(&name, BinAxis::X)?;
        let ref_bins = reference.get_bins(&name, BinAxis::X)?;
        if bins.len() != ref_bins.len() {
            return Err(ReferenceError::BinMismatch(name, bins.len(), ref_bins.len()));
        }
        overlays.push(ReferenceOverlay {
            bins: bins.to_vec(),
            current: current.get_integral(&name)?.iter().copied().collect(),
            reference: reference.get_integral(&name)?.iter().copied().collect(),
            me: name,
        });
    }
    Ok(overlays)
}

/// The names of the MEs that can be overlaid on the reference run: 1D and present in both
pub fn overlayable_mes<'a>(current: &'a MEData, reference: &MEData) -> Vec<&'a str> {
    current
        .get_me_names()
        .into_iter()
        .filter(|name| {
            matches!(current.get_dims(name), Ok(Dimension::One))
                && matches!(reference.get_dims(name), Ok(Dimension::One))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::tests::{record_1d, record_2d};
    use crate::error::MEDataError;
    use crate::me_ids::MEIdTable;

    fn run(scale: f64) -> MEData {
        let records = vec![
            record_1d("charge", 1, 1, vec![scale, 3.0 * scale]),
            record_1d("charge", 2, 1, vec![0.0, 0.0]),
            record_2d("occupancy", 1, 100, vec![vec![1.0]]),
        ];
        MEData::build(&records, &MEIdTable::default()).unwrap()
    }

    #[test]
    fn test_overlay() {
        let mut current = run(1.0);
        let mut reference = run(5.0);
        let overlays = reference_overlay(&mut current, &mut reference, Some(&["charge"][..])).unwrap();
        assert_eq!(overlays.len(), 1);
        assert_eq!(overlays[0].me, "charge");
        assert_eq!(overlays[0].bins, vec![0.0, 10.0]);
        assert_eq!(overlays[0].current, vec![0.25, 0.75]);
        assert_eq!(overlays[0].reference, vec![0.25, 0.75]);
        assert_eq!(overlays[0].ratio(), vec![1.0, 1.0]);
        assert_eq!(overlays[0].max_deviation(), 0.0);
    }

    #[test]
    fn test_overlay_rejects_2d() {
        let mut current = run(1.0);
        let mut reference = run(1.0);
        assert_eq!(
            reference_overlay(&mut current, &mut reference, None).unwrap_err(),
            ReferenceError::ReferenceDimension(String::from("occupancy"))
        );
        assert_eq!(overlayable_mes(&current, &reference), vec!["charge"]);
    }

    #[test]
    fn test_overlay_bin_mismatch() {
        let mut current = run(1.0);
        let mut reference = MEData::build(
            &[record_1d("charge", 1, 1, vec![1.0, 1.0, 1.0])],
            &MEIdTable::default(),
        )
        .unwrap();
        assert_eq!(
            reference_overlay(&mut current, &mut reference, Some(&["charge"][..])).unwrap_err(),
            ReferenceError::BinMismatch(String::from("charge"), 2, 3)
        );
    }

    #[test]
    fn test_overlay_missing_me() {
        let mut current = run(1.0);
        let mut reference = MEData::build(
            &[record_1d("other", 1, 1, vec![1.0, 1.0])],
            &MEIdTable::default(),
        )
        .unwrap();
        assert_eq!(
            reference_overlay(&mut current, &mut reference, Some(&["charge"][..])).unwrap_err(),
            ReferenceError::MEDataError(MEDataError::UnknownME(String::from("charge")))
        );
        assert!(overlayable_mes(&current, &reference).is_empty());
    }
}
