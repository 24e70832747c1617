use ndarray::{Array1, Array2, Array3, ArrayD, ArrayView1};
use std::collections::BTreeMap;

use super::bins::{AxisSpec, BinGeometry};
use super::error::BuilderError;
use super::me_ids::{Dimension, MEIdTable};
use super::record::{HistogramData, HistogramRecord};

/// A derived view that is either not yet computed or holds its full result
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Cached<T> {
    #[default]
    Uncomputed,
    Computed(T),
}

impl<T> Cached<T> {
    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Uncomputed => None,
            Self::Computed(value) => Some(value),
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Self::Computed(_))
    }
}

/// All of the data for one monitoring element within a run.
///
/// `data` is stacked with the lumisection axis first, in ascending lumisection order, so row
/// `i` is the `(i+1)`-th lumisection. For 1D MEs it has shape `(n_ls, x_bin)`, for 2D MEs
/// `(n_ls, x_bin, y_bin)`.
#[derive(Debug, Clone)]
pub struct MEEntry {
    pub name: String,
    pub me_id: u32,
    pub dimension: Dimension,
    pub bins: BinGeometry,
    pub lumisections: Vec<u32>,
    pub data: ArrayD<f64>,
    pub entries: Array1<u64>,
    pub empty_lumisections: Vec<u32>,
    pub normalized: Cached<ArrayD<f64>>,
    pub trigger_normalized: Cached<ArrayD<f64>>,
    pub integral: Cached<ArrayD<f64>>,
}

impl MEEntry {
    pub fn num_lumisections(&self) -> usize {
        self.lumisections.len()
    }
}

/// Monitoring elements of a run, keyed by ME name
pub type MEMap = BTreeMap<String, MEEntry>;

fn bad_shape(record: &HistogramRecord, expected: &[usize]) -> BuilderError {
    BuilderError::BadShape {
        me: record.me.clone(),
        ls: record.ls_number,
        expected: expected.to_vec(),
        found: record.data.shape(),
    }
}

/// Stack 1D rows into an (n_ls, x_bin) array
fn stack_one_d(rows: &[&HistogramRecord], x_bin: usize) -> Result<ArrayD<f64>, BuilderError> {
    let mut stack = Array2::<f64>::zeros((rows.len(), x_bin));
    for (mut lumi, record) in stack.outer_iter_mut().zip(rows.iter()) {
        match &record.data {
            HistogramData::OneD(values) if values.len() == x_bin => {
                lumi.assign(&ArrayView1::from(values.as_slice()))
            }
            _ => return Err(bad_shape(record, &[x_bin])),
        }
    }
    Ok(stack.into_dyn())
}

/// Stack 2D rows into an (n_ls, x_bin, y_bin) array
fn stack_two_d(
    rows: &[&HistogramRecord],
    x_bin: usize,
    y_bin: usize,
) -> Result<ArrayD<f64>, BuilderError> {
    let mut stack = Array3::<f64>::zeros((rows.len(), x_bin, y_bin));
    for (mut lumi, record) in stack.outer_iter_mut().zip(rows.iter()) {
        let values = match &record.data {
            HistogramData::TwoD(values)
                if values.len() == x_bin && values.iter().all(|r| r.len() == y_bin) =>
            {
                values
            }
            _ => return Err(bad_shape(record, &[x_bin, y_bin])),
        };
        for (mut x_row, y_values) in lumi.outer_iter_mut().zip(values.iter()) {
            x_row.assign(&ArrayView1::from(y_values.as_slice()));
        }
    }
    Ok(stack.into_dyn())
}

/// Build the entry of a single ME from its (unsorted) rows
fn build_entry(
    name: &str,
    mut rows: Vec<&HistogramRecord>,
    table: &MEIdTable,
) -> Result<MEEntry, BuilderError> {
    rows.sort_by_key(|r| r.ls_number);
    // Axis declarations are constant within a run; only the first row is read
    let first = rows[0];
    let dimension = table
        .classify(first.me_id)
        .ok_or_else(|| BuilderError::UnrecognizedMEId {
            id: first.me_id,
            me: name.to_string(),
        })?;

    let x_axis = AxisSpec::new(first.x_min, first.x_max, first.x_bin);
    let (bins, data) = match dimension {
        Dimension::One => (BinGeometry::one_d(&x_axis), stack_one_d(&rows, first.x_bin)?),
        Dimension::Two => {
            let y_axis = match (first.y_min, first.y_max, first.y_bin) {
                (Some(min), Some(max), Some(count)) => AxisSpec::new(min, max, count),
                _ => return Err(BuilderError::MissingYAxis(name.to_string())),
            };
            (
                BinGeometry::two_d(&x_axis, &y_axis),
                stack_two_d(&rows, x_axis.count, y_axis.count)?,
            )
        }
    };

    let lumisections: Vec<u32> = rows.iter().map(|r| r.ls_number).collect();
    if lumisections.windows(2).any(|w| w[0] == w[1]) {
        log::warn!("ME {name} has more than one record for the same lumisection");
    }

    Ok(MEEntry {
        name: name.to_string(),
        me_id: first.me_id,
        dimension,
        bins,
        lumisections,
        data,
        entries: rows.iter().map(|r| r.entries).collect(),
        empty_lumisections: Vec::new(),
        normalized: Cached::Uncomputed,
        trigger_normalized: Cached::Uncomputed,
        integral: Cached::Uncomputed,
    })
}

/// Reshape a flat histogram record table for a single run into one MEEntry per ME name.
///
/// Empty lumisections are left unset; MEData fills them in with its threshold.
pub fn build_me_entries(
    records: &[HistogramRecord],
    table: &MEIdTable,
) -> Result<MEMap, BuilderError> {
    if records.is_empty() {
        return Err(BuilderError::EmptyTable);
    }

    let mut groups: BTreeMap<&str, Vec<&HistogramRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.me.as_str()).or_default().push(record);
    }

    let mut entries = MEMap::new();
    for (name, rows) in groups {
        entries.insert(name.to_string(), build_entry(name, rows, table)?);
    }

    let mut counts = entries.values().map(|e| e.num_lumisections());
    if let Some(first) = counts.next() {
        if counts.any(|n| n != first) {
            log::warn!(
                "Monitoring elements in this table do not share a lumisection count; positional trigger rates will only fit some of them"
            );
        }
    }

    Ok(entries)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn record_1d(me: &str, ls: u32, me_id: u32, data: Vec<f64>) -> HistogramRecord {
        HistogramRecord {
            me: me.to_string(),
            ls_number: ls,
            me_id,
            entries: data.iter().sum::<f64>() as u64,
            x_bin: data.len(),
            data: HistogramData::OneD(data),
            x_min: 0.0,
            x_max: 10.0,
            y_min: None,
            y_max: None,
            y_bin: None,
            run_number: Some(380238),
        }
    }

    pub fn record_2d(me: &str, ls: u32, me_id: u32, data: Vec<Vec<f64>>) -> HistogramRecord {
        let y_bin = data.first().map(|r| r.len()).unwrap_or(0);
        HistogramRecord {
            me: me.to_string(),
            ls_number: ls,
            me_id,
            entries: data.iter().flatten().sum::<f64>() as u64,
            x_bin: data.len(),
            data: HistogramData::TwoD(data),
            x_min: 0.0,
            x_max: 1.0,
            y_min: Some(-1.0),
            y_max: Some(1.0),
            y_bin: Some(y_bin),
            run_number: Some(380238),
        }
    }

    #[test]
    fn test_sorted_stacking() {
        let records = vec![
            record_1d("charge", 3, 1, vec![3.0, 3.0]),
            record_1d("charge", 1, 1, vec![1.0, 1.0]),
            record_1d("charge", 2, 1, vec![2.0, 2.0]),
        ];
        let entries = build_me_entries(&records, &MEIdTable::default()).unwrap();
        let charge = &entries["charge"];
        assert_eq!(charge.dimension, Dimension::One);
        assert_eq!(charge.lumisections, vec![1, 2, 3]);
        assert_eq!(charge.data.shape(), &[3, 2]);
        assert_eq!(charge.data.iter().copied().collect::<Vec<f64>>(), vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
        assert_eq!(charge.entries.to_vec(), vec![2, 4, 6]);
        assert_eq!(charge.bins.x.to_vec(), vec![0.0, 10.0]);
        assert!(!charge.integral.is_computed());
    }

    #[test]
    fn test_row_count_per_me() {
        let mut records = Vec::new();
        for ls in 1..=4 {
            records.push(record_1d("a", ls, 1, vec![1.0]));
        }
        for ls in 1..=2 {
            records.push(record_2d("b", ls, 100, vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0, 0.0]]));
        }
        let entries = build_me_entries(&records, &MEIdTable::default()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries["a"].num_lumisections(), 4);
        assert_eq!(entries["b"].num_lumisections(), 2);
        assert_eq!(entries["b"].dimension, Dimension::Two);
        assert_eq!(entries["b"].data.shape(), &[2, 3, 2]);
        assert_eq!(entries["b"].data[[0, 1, 1]], 1.0);
        assert_eq!(entries["b"].bins.y.as_ref().unwrap().to_vec(), vec![-1.0, 1.0]);
    }

    #[test]
    fn test_axis_from_first_row() {
        let mut late = record_1d("a", 2, 1, vec![1.0, 1.0]);
        late.x_max = 99.0;
        let records = vec![late, record_1d("a", 1, 1, vec![0.0, 1.0])];
        let entries = build_me_entries(&records, &MEIdTable::default()).unwrap();
        assert_eq!(entries["a"].bins.x.to_vec(), vec![0.0, 10.0]);
    }

    #[test]
    fn test_unrecognized_id() {
        let records = vec![record_1d("mystery", 1, 999, vec![1.0])];
        assert_eq!(
            build_me_entries(&records, &MEIdTable::default()).unwrap_err(),
            BuilderError::UnrecognizedMEId {
                id: 999,
                me: String::from("mystery")
            }
        );
    }

    #[test]
    fn test_fixture_table() {
        let records = vec![record_1d("custom", 1, 999, vec![1.0])];
        let table = MEIdTable::new([999], []);
        assert!(build_me_entries(&records, &table).is_ok());
    }

    #[test]
    fn test_bad_shape() {
        let mut short = record_1d("a", 2, 1, vec![1.0]);
        short.x_bin = 2;
        let records = vec![record_1d("a", 1, 1, vec![1.0, 1.0]), short];
        match build_me_entries(&records, &MEIdTable::default()) {
            Err(BuilderError::BadShape { ls, expected, found, .. }) => {
                assert_eq!(ls, 2);
                assert_eq!(expected, vec![2]);
                assert_eq!(found, vec![1]);
            }
            _ => panic!(),
        }

        // 1D data for a 2D id
        let records = vec![record_1d("b", 1, 100, vec![1.0, 1.0])];
        assert!(matches!(
            build_me_entries(&records, &MEIdTable::default()),
            Err(BuilderError::MissingYAxis(_))
        ));
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(
            build_me_entries(&[], &MEIdTable::default()).unwrap_err(),
            BuilderError::EmptyTable
        );
    }
}
