//! The normalization and integration transforms.
//!
//! Every function here works on a per-lumisection stack (lumisection axis first) or on a
//! whole MEMap. MEData only ever calls into these, so a stack normalized through the
//! model and one normalized directly are the same numbers.
use bit_set::BitSet;
use ndarray::{Array1, ArrayD, IxDyn};

use super::builder::{Cached, MEMap};
use super::error::{MEDataError, TriggerRateError};
use super::trigger_rate::TriggerRates;

fn nan_to_zero(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value
    }
}

/// Divide each lumisection by its own total. Lumisections with a zero total become all zeros.
pub fn area_normalize(stack: &ArrayD<f64>) -> ArrayD<f64> {
    let mut normed = stack.clone();
    for mut lumi in normed.outer_iter_mut() {
        let total = lumi.sum();
        lumi.mapv_inplace(|v| nan_to_zero(v / total));
    }
    normed
}

/// Divide each lumisection by its trigger rate, broadcast over every bin.
///
/// Rates are matched by position. A zero rate is not special cased and yields
/// non-finite values for that lumisection.
pub fn trigger_normalize(
    stack: &ArrayD<f64>,
    rates: &Array1<f64>,
) -> Result<ArrayD<f64>, TriggerRateError> {
    let n_lumis = stack.shape().first().copied().unwrap_or(0);
    if rates.len() != n_lumis {
        return Err(TriggerRateError::Length(rates.len(), n_lumis));
    }
    let mut normed = stack.clone();
    for (mut lumi, rate) in normed.outer_iter_mut().zip(rates.iter()) {
        lumi.mapv_inplace(|v| v / rate);
    }
    Ok(normed)
}

/// Map 1-based excluded lumisection numbers onto the rows of a stack with n_lumis rows.
/// Numbers outside of 1..=n_lumis are dropped.
pub fn exclusion_mask(excluded: &[u32], n_lumis: usize) -> BitSet {
    excluded
        .iter()
        .filter(|ls| **ls >= 1 && (**ls as usize) <= n_lumis)
        .map(|ls| (*ls - 1) as usize)
        .collect()
}

/// Sum a stack over its lumisection axis, skipping the masked rows.
///
/// With norm the result is divided by its grand total; a zero total yields all zeros.
pub fn integrate(stack: &ArrayD<f64>, excluded_rows: &BitSet, norm: bool) -> ArrayD<f64> {
    let bin_shape = stack.shape().get(1..).unwrap_or(&[]).to_vec();
    let mut integral = ArrayD::<f64>::zeros(IxDyn(&bin_shape));
    for (row, lumi) in stack.outer_iter().enumerate() {
        if !excluded_rows.contains(row) {
            integral += &lumi;
        }
    }
    if norm {
        let total = integral.sum();
        integral.mapv_inplace(|v| nan_to_zero(v / total));
    }
    integral
}

/// Check that every requested ME exists, returning the names to work on
fn select(entries: &MEMap, mes: Option<&[&str]>) -> Result<Vec<String>, MEDataError> {
    match mes {
        None => Ok(entries.keys().cloned().collect()),
        Some(names) => names
            .iter()
            .map(|name| {
                if entries.contains_key(*name) {
                    Ok(name.to_string())
                } else {
                    Err(MEDataError::UnknownME(name.to_string()))
                }
            })
            .collect(),
    }
}

/// Area normalize the raw data of the selected MEs (all if None) into their normalized view
pub fn normalize_entries(entries: &mut MEMap, mes: Option<&[&str]>) -> Result<(), MEDataError> {
    for name in select(entries, mes)? {
        if let Some(entry) = entries.get_mut(&name) {
            entry.normalized = Cached::Computed(area_normalize(&entry.data));
        }
    }
    Ok(())
}

/// Trigger normalize the raw data of the selected MEs (all if None) into their
/// trigger-normalized view.
///
/// Every selected ME is aligned before any cache is written, so a failure leaves all views
/// as they were.
pub fn trigger_normalize_entries(
    entries: &mut MEMap,
    rates: &TriggerRates,
    mes: Option<&[&str]>,
) -> Result<(), MEDataError> {
    let mut results = Vec::new();
    for name in select(entries, mes)? {
        if let Some(entry) = entries.get(&name) {
            let aligned = rates.align(&entry.lumisections)?;
            results.push((name, trigger_normalize(&entry.data, &aligned)?));
        }
    }
    for (name, normed) in results {
        if non_finite_count(&normed) > 0 {
            log::warn!("ME {name} has non-finite values after trigger normalization, check for zero rates");
        }
        if let Some(entry) = entries.get_mut(&name) {
            entry.trigger_normalized = Cached::Computed(normed);
        }
    }
    Ok(())
}

fn non_finite_count(normed: &ArrayD<f64>) -> usize {
    normed.iter().filter(|v| !v.is_finite()).count()
}

/// Integrate the raw data of every ME into its integral view, skipping excluded lumisections
pub fn integrate_entries(entries: &mut MEMap, excluded: &[u32], norm: bool) {
    for entry in entries.values_mut() {
        let mask = exclusion_mask(excluded, entry.num_lumisections());
        entry.integral = Cached::Computed(integrate(&entry.data, &mask, norm));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_me_entries;
    use crate::builder::tests::{record_1d, record_2d};
    use crate::me_ids::MEIdTable;
    use ndarray::{array, Array2};

    fn close(a: &ArrayD<f64>, b: &ArrayD<f64>) -> bool {
        a.shape() == b.shape() && a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-12)
    }

    #[test]
    fn test_area_normalize() {
        let stack = array![[1.0, 3.0], [0.0, 0.0], [2.0, 2.0]].into_dyn();
        let normed = area_normalize(&stack);
        assert!(close(
            &normed,
            &array![[0.25, 0.75], [0.0, 0.0], [0.5, 0.5]].into_dyn()
        ));
    }

    #[test]
    fn test_area_normalize_idempotent() {
        let stack = array![[1.0, 3.0, 7.0], [0.5, 0.25, 9.0]].into_dyn();
        let once = area_normalize(&stack);
        let twice = area_normalize(&once);
        assert!(close(&once, &twice));
    }

    #[test]
    fn test_area_normalize_2d_uses_whole_lumisection() {
        let stack = array![[[1.0, 1.0], [1.0, 1.0]]].into_dyn();
        let normed = area_normalize(&stack);
        assert!(normed.iter().all(|v| *v == 0.25));
    }

    #[test]
    fn test_trigger_normalize_1d() {
        let stack = array![[2.0, 2.0], [4.0, 4.0]].into_dyn();
        let normed = trigger_normalize(&stack, &array![2.0, 4.0]).unwrap();
        assert_eq!(normed, array![[1.0, 1.0], [1.0, 1.0]].into_dyn());
    }

    #[test]
    fn test_trigger_normalize_2d() {
        let stack = array![[[2.0, 4.0], [6.0, 8.0]], [[3.0, 3.0], [3.0, 0.0]]].into_dyn();
        let normed = trigger_normalize(&stack, &array![2.0, 3.0]).unwrap();
        assert_eq!(
            normed,
            array![[[1.0, 2.0], [3.0, 4.0]], [[1.0, 1.0], [1.0, 0.0]]].into_dyn()
        );
        assert_eq!(
            trigger_normalize(&stack, &array![1.0]),
            Err(TriggerRateError::Length(1, 2))
        );
    }

    #[test]
    fn test_integrate() {
        let stack = array![[1.0, 0.0], [2.0, 2.0], [0.0, 5.0]].into_dyn();
        let all = integrate(&stack, &BitSet::new(), false);
        assert_eq!(all, array![3.0, 7.0].into_dyn());

        let normed = integrate(&stack, &BitSet::new(), true);
        assert!((normed.sum() - 1.0).abs() < 1e-12);

        let mask = exclusion_mask(&[2], 3);
        assert_eq!(integrate(&stack, &mask, false), array![1.0, 5.0].into_dyn());
    }

    #[test]
    fn test_excluding_empty_row_is_noop() {
        let stack = array![[1.0, 0.0], [0.0, 0.0], [0.0, 5.0]].into_dyn();
        let all = integrate(&stack, &BitSet::new(), false);
        let skipped = integrate(&stack, &exclusion_mask(&[2], 3), false);
        assert_eq!(all, skipped);
        let skipped = integrate(&stack, &exclusion_mask(&[3], 3), false);
        assert_ne!(all, skipped);
    }

    #[test]
    fn test_exclude_everything() {
        let stack = array![[1.0, 0.0], [2.0, 2.0]].into_dyn();
        let mask = exclusion_mask(&[1, 2], 2);
        let integral = integrate(&stack, &mask, true);
        assert_eq!(integral, array![0.0, 0.0].into_dyn());
    }

    #[test]
    fn test_exclusion_mask_bounds() {
        let mask = exclusion_mask(&[0, 1, 3, 7], 3);
        assert_eq!(mask.iter().collect::<Vec<usize>>(), vec![0, 2]);
    }

    #[test]
    fn test_integrate_2d_shape() {
        let stack = Array2::<f64>::ones((4, 6)).into_shape((2, 3, 4)).unwrap().into_dyn();
        let integral = integrate(&stack, &BitSet::new(), false);
        assert_eq!(integral.shape(), &[3, 4]);
        assert!(integral.iter().all(|v| *v == 2.0));
    }

    #[test]
    fn test_entries_transforms() {
        let records = vec![
            record_1d("a", 1, 1, vec![2.0, 2.0]),
            record_1d("a", 2, 1, vec![4.0, 4.0]),
            record_2d("b", 1, 100, vec![vec![2.0, 0.0], vec![0.0, 2.0]]),
            record_2d("b", 2, 100, vec![vec![4.0, 0.0], vec![0.0, 0.0]]),
        ];
        let mut entries = build_me_entries(&records, &MEIdTable::default()).unwrap();

        normalize_entries(&mut entries, Some(&["a"][..])).unwrap();
        assert!(entries["a"].normalized.is_computed());
        assert!(!entries["b"].normalized.is_computed());

        let rates = TriggerRates::positional(vec![2.0, 4.0]);
        trigger_normalize_entries(&mut entries, &rates, None).unwrap();
        assert_eq!(
            entries["a"].trigger_normalized.get().unwrap(),
            &array![[1.0, 1.0], [1.0, 1.0]].into_dyn()
        );
        assert_eq!(
            entries["b"].trigger_normalized.get().unwrap(),
            &array![[[1.0, 0.0], [0.0, 1.0]], [[1.0, 0.0], [0.0, 0.0]]].into_dyn()
        );

        integrate_entries(&mut entries, &[1], false);
        assert_eq!(
            entries["a"].integral.get().unwrap(),
            &array![4.0, 4.0].into_dyn()
        );

        assert_eq!(
            normalize_entries(&mut entries, Some(&["c"][..])),
            Err(MEDataError::UnknownME(String::from("c")))
        );
    }

    #[test]
    fn test_failed_alignment_writes_nothing() {
        let records = vec![
            record_1d("a", 1, 1, vec![2.0, 2.0]),
            record_1d("a", 2, 1, vec![4.0, 4.0]),
            record_1d("b", 1, 1, vec![2.0, 2.0]),
        ];
        let mut entries = build_me_entries(&records, &MEIdTable::default()).unwrap();
        let rates = TriggerRates::positional(vec![2.0, 4.0]);
        assert!(trigger_normalize_entries(&mut entries, &rates, None).is_err());
        assert!(!entries["a"].trigger_normalized.is_computed());

        let keyed = TriggerRates::keyed(&[1, 2], &[2.0, 4.0]).unwrap();
        trigger_normalize_entries(&mut entries, &keyed, None).unwrap();
        assert_eq!(
            entries["b"].trigger_normalized.get().unwrap(),
            &array![[1.0, 1.0]].into_dyn()
        );
    }
}
