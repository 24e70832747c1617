use ndarray::{Array1, ArrayD, ArrayViewD, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::ops::Index;

use super::builder::{build_me_entries, MEEntry, MEMap};
use super::constants::DEFAULT_EMPTY_THRESHOLD;
use super::empty::classify;
use super::error::MEDataError;
use super::me_ids::{Dimension, MEIdTable};
use super::normalize::{integrate_entries, normalize_entries, trigger_normalize_entries};
use super::record::HistogramRecord;
use super::trigger_rate::TriggerRates;

/// The views of an ME's data that MEData can hand out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Data,
    Norm,
    TrigNorm,
    Integral,
}

impl Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Data => write!(f, "data"),
            Self::Norm => write!(f, "norm"),
            Self::TrigNorm => write!(f, "trignorm"),
            Self::Integral => write!(f, "integral"),
        }
    }
}

/// Which bin axis to request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinAxis {
    X,
    Y,
}

/// A lumisection, or an inclusive range of lumisections, to exclude.
///
/// In YAML a single lumisection is written as `5`, a range as `[2, 3]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LumiSelection {
    Single(u32),
    Range(Vec<u32>),
}

impl From<u32> for LumiSelection {
    fn from(value: u32) -> Self {
        Self::Single(value)
    }
}

impl From<(u32, u32)> for LumiSelection {
    fn from(value: (u32, u32)) -> Self {
        Self::Range(vec![value.0, value.1])
    }
}

/// Expand singles and ranges into an ascending, deduplicated list of lumisection numbers
pub fn expand_selections(selections: &[LumiSelection]) -> Result<Vec<u32>, MEDataError> {
    let mut lumis = BTreeSet::new();
    for selection in selections {
        match selection {
            LumiSelection::Single(ls) => {
                check_lumisection(*ls)?;
                lumis.insert(*ls);
            }
            LumiSelection::Range(bounds) => {
                if bounds.len() != 2 {
                    return Err(MEDataError::InvalidRange(format!(
                        "{bounds:?} does not have exactly two endpoints"
                    )));
                }
                let (start, stop) = (bounds[0], bounds[1]);
                if start > stop {
                    return Err(MEDataError::InvalidRange(format!(
                        "start {start} is larger than end {stop}"
                    )));
                }
                check_lumisection(start)?;
                lumis.extend(start..=stop);
            }
        }
    }
    Ok(lumis.into_iter().collect())
}

fn check_lumisection(ls: u32) -> Result<(), MEDataError> {
    if ls == 0 {
        Err(MEDataError::InvalidArgument(String::from(
            "lumisection numbers start at 1",
        )))
    } else {
        Ok(())
    }
}

/// MEData holds every monitoring element of a single run along with their derived views.
///
/// Built once from the histogram record table of a run. Normalization and integration fill in
/// (and overwrite) the `norm`, `trignorm`, and `integral` views. The exclusion list is shared
/// by all MEs and only affects integration.
#[derive(Debug, Clone)]
pub struct MEData {
    entries: MEMap,
    excluded: Vec<u32>,
    num_lumisections: usize,
}

impl MEData {
    /// Build from a record table, marking lumisections with no entries as empty
    pub fn build(records: &[HistogramRecord], table: &MEIdTable) -> Result<Self, MEDataError> {
        Self::build_with_threshold(records, table, DEFAULT_EMPTY_THRESHOLD)
    }

    /// Build from a record table, marking lumisections with at most `threshold` entries as empty
    pub fn build_with_threshold(
        records: &[HistogramRecord],
        table: &MEIdTable,
        threshold: u64,
    ) -> Result<Self, MEDataError> {
        let mut entries = build_me_entries(records, table)?;
        for entry in entries.values_mut() {
            entry.empty_lumisections = classify(&entry.entries, threshold);
        }
        let num_lumisections = entries
            .values()
            .next()
            .map(|e| e.num_lumisections())
            .unwrap_or(0);
        Ok(Self {
            entries,
            excluded: Vec::new(),
            num_lumisections,
        })
    }

    fn entry(&self, me: &str) -> Result<&MEEntry, MEDataError> {
        self.entries
            .get(me)
            .ok_or_else(|| MEDataError::UnknownME(me.to_string()))
    }

    /// Get one view of an ME, either in full or for the 1-based lumisection `ls`
    pub fn get_data(
        &self,
        me: &str,
        ls: Option<usize>,
        view: View,
    ) -> Result<ArrayViewD<'_, f64>, MEDataError> {
        if ls.is_some() && view == View::Integral {
            return Err(MEDataError::InvalidArgument(String::from(
                "cannot select a lumisection in integrated data",
            )));
        }

        let entry = self.entry(me)?;
        let stack: &ArrayD<f64> = match view {
            View::Data => Some(&entry.data),
            View::Norm => entry.normalized.get(),
            View::TrigNorm => entry.trigger_normalized.get(),
            View::Integral => entry.integral.get(),
        }
        .ok_or_else(|| MEDataError::ViewNotComputed(view, me.to_string()))?;

        match ls {
            None => Ok(stack.view()),
            Some(0) => Err(MEDataError::InvalidArgument(String::from(
                "lumisection numbers start at 1",
            ))),
            Some(ls) if ls > entry.num_lumisections() => {
                Err(MEDataError::InvalidArgument(format!(
                    "lumisection {ls} is out of range; ME {me} has {} lumisections",
                    entry.num_lumisections()
                )))
            }
            Some(ls) => Ok(stack.index_axis(Axis(0), ls - 1)),
        }
    }

    pub fn get_norm(&self, me: &str) -> Result<ArrayViewD<'_, f64>, MEDataError> {
        self.get_data(me, None, View::Norm)
    }

    pub fn get_trig_norm(&self, me: &str) -> Result<ArrayViewD<'_, f64>, MEDataError> {
        self.get_data(me, None, View::TrigNorm)
    }

    pub fn get_integral(&self, me: &str) -> Result<ArrayViewD<'_, f64>, MEDataError> {
        self.get_data(me, None, View::Integral)
    }

    pub fn get_bins(&self, me: &str, axis: BinAxis) -> Result<&Array1<f64>, MEDataError> {
        let entry = self.entry(me)?;
        match axis {
            BinAxis::X => Ok(&entry.bins.x),
            BinAxis::Y => entry
                .bins
                .y
                .as_ref()
                .ok_or_else(|| MEDataError::InvalidDimension(me.to_string())),
        }
    }

    pub fn get_entries(&self, me: &str) -> Result<&Array1<u64>, MEDataError> {
        Ok(&self.entry(me)?.entries)
    }

    pub fn get_dims(&self, me: &str) -> Result<Dimension, MEDataError> {
        Ok(self.entry(me)?.dimension)
    }

    pub fn get_me_id(&self, me: &str) -> Result<u32, MEDataError> {
        Ok(self.entry(me)?.me_id)
    }

    /// The lumisection numbers backing each row of an ME
    pub fn get_lumisections(&self, me: &str) -> Result<&[u32], MEDataError> {
        Ok(&self.entry(me)?.lumisections)
    }

    pub fn get_empty_lumisections(&self, me: &str) -> Result<&[u32], MEDataError> {
        Ok(&self.entry(me)?.empty_lumisections)
    }

    pub fn get_me_names(&self) -> Vec<&str> {
        self.entries.keys().map(|k| k.as_str()).collect()
    }

    pub fn get_excluded(&self) -> &[u32] {
        &self.excluded
    }

    /// Lumisection count of the run, taken from the first ME
    pub fn get_num_lumisections(&self) -> usize {
        self.num_lumisections
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MEEntry)> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &MEMap {
        &self.entries
    }

    /// Replace the run-wide exclusion list. An empty slice clears it.
    ///
    /// The list is only replaced once every selection has been validated.
    pub fn set_excluded(&mut self, selections: &[LumiSelection]) -> Result<(), MEDataError> {
        self.excluded = expand_selections(selections)?;
        Ok(())
    }

    /// Area normalize (no trigger rate) or trigger normalize the selected MEs (all if None)
    pub fn norm_data(
        &mut self,
        trigger_rate: Option<&TriggerRates>,
        mes: Option<&[&str]>,
    ) -> Result<(), MEDataError> {
        match trigger_rate {
            None => normalize_entries(&mut self.entries, mes),
            Some(rates) => trigger_normalize_entries(&mut self.entries, rates, mes),
        }
    }

    /// Integrate every ME over its lumisections, skipping the excluded ones.
    ///
    /// A non-empty `exclude` replaces the exclusion list first. With `norm` the integral is
    /// divided by its total.
    pub fn integrate_data(
        &mut self,
        norm: bool,
        exclude: &[LumiSelection],
    ) -> Result<(), MEDataError> {
        if !exclude.is_empty() {
            self.set_excluded(exclude)?;
        }
        let out_of_range = self
            .excluded
            .iter()
            .filter(|ls| **ls as usize > self.num_lumisections)
            .count();
        if out_of_range > 0 {
            log::warn!(
                "{out_of_range} excluded lumisections are beyond the {} lumisections of this run and were ignored",
                self.num_lumisections
            );
        }
        integrate_entries(&mut self.entries, &self.excluded, norm);
        Ok(())
    }
}

impl Index<&str> for MEData {
    type Output = MEEntry;

    fn index(&self, me: &str) -> &Self::Output {
        &self.entries[me]
    }
}
