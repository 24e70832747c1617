use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::error::{RecordError, TriggerRateError};
use super::record::read_table;

/// One row of the operations-monitoring dataset rate table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerRateRecord {
    #[serde(default)]
    pub run_number: Option<i32>,
    pub last_lumisection_number: u32,
    pub rate: f64,
}

/// Read the trigger rate table for a run
pub fn read_trigger_rate_records(path: &Path) -> Result<Vec<TriggerRateRecord>, RecordError> {
    read_table(path)
}

/// Per-lumisection trigger rates for a run.
///
/// Positional rates are matched to histogram rows by index, so they must have exactly one
/// value per lumisection. Keyed rates are matched by lumisection number, which also works
/// when the histogram service and the monitoring service disagree on which lumisections
/// exist.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerRates {
    Positional(Array1<f64>),
    Keyed(BTreeMap<u32, f64>),
}

impl TriggerRates {
    pub fn positional(rates: Vec<f64>) -> Self {
        Self::Positional(Array1::from(rates))
    }

    pub fn keyed(lumisections: &[u32], rates: &[f64]) -> Result<Self, TriggerRateError> {
        if lumisections.len() != rates.len() {
            return Err(TriggerRateError::KeyLength(lumisections.len(), rates.len()));
        }
        Ok(Self::Keyed(
            lumisections
                .iter()
                .copied()
                .zip(rates.iter().copied())
                .collect(),
        ))
    }

    /// Build keyed rates from monitoring service rows. A repeated lumisection keeps its last rate.
    pub fn from_records(records: &[TriggerRateRecord]) -> Self {
        Self::Keyed(
            records
                .iter()
                .map(|r| (r.last_lumisection_number, r.rate))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Positional(rates) => rates.len(),
            Self::Keyed(rates) => rates.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Produce the rate vector matching a sorted list of lumisection numbers
    pub fn align(&self, lumisections: &[u32]) -> Result<Array1<f64>, TriggerRateError> {
        match self {
            Self::Positional(rates) => {
                if rates.len() != lumisections.len() {
                    return Err(TriggerRateError::Length(rates.len(), lumisections.len()));
                }
                Ok(rates.clone())
            }
            Self::Keyed(rates) => lumisections
                .iter()
                .map(|ls| {
                    rates
                        .get(ls)
                        .copied()
                        .ok_or(TriggerRateError::MissingLumisection(*ls))
                })
                .collect::<Result<Vec<f64>, TriggerRateError>>()
                .map(Array1::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_alignment() {
        let rates = TriggerRates::positional(vec![2.0, 4.0]);
        assert_eq!(rates.align(&[1, 2]).unwrap().to_vec(), vec![2.0, 4.0]);
        assert_eq!(rates.align(&[1, 2, 3]), Err(TriggerRateError::Length(2, 3)));
    }

    #[test]
    fn test_keyed_alignment() {
        let rates = TriggerRates::keyed(&[3, 1, 2], &[30.0, 10.0, 20.0]).unwrap();
        assert_eq!(rates.align(&[1, 3]).unwrap().to_vec(), vec![10.0, 30.0]);
        assert_eq!(
            rates.align(&[1, 4]),
            Err(TriggerRateError::MissingLumisection(4))
        );
        assert_eq!(
            TriggerRates::keyed(&[1, 2], &[1.0]),
            Err(TriggerRateError::KeyLength(2, 1))
        );
    }

    #[test]
    fn test_from_records() {
        let json = r#"[
            {"run_number": 380238, "last_lumisection_number": 2, "rate": 5.5, "dataset_name": "ZeroBias"},
            {"run_number": 380238, "last_lumisection_number": 1, "rate": 4.0, "dataset_name": "ZeroBias"}
        ]"#;
        let records: Vec<TriggerRateRecord> = crate::record::parse_table(json).unwrap();
        let rates = TriggerRates::from_records(&records);
        assert_eq!(rates.len(), 2);
        assert_eq!(rates.align(&[1, 2]).unwrap().to_vec(), vec![4.0, 5.5]);
    }
}
