// Whether an ME id is a 1D or a 2D histogram comes from a classification table handed to
// the builder. In YAML the table is written as inclusive id ranges per dimension.
use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::constants::{MAX_1D_ME_ID, MAX_2D_ME_ID, MIN_ME_ID};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    One,
    Two,
}

impl Dimension {
    /// Number of bin axes
    pub fn rank(&self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

impl Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}D", self.rank())
    }
}

/// An inclusive span of ME ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRange {
    pub first: u32,
    pub last: u32,
}

/// Serialized layout of an MEIdTable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MEIdRanges {
    pub one_d: Vec<IdRange>,
    pub two_d: Vec<IdRange>,
}

/// MEIdTable maps monitoring element ids to the dimensionality of their histograms.
///
/// If an id is listed as both 1D and 2D, the 1D classification wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MEIdRanges", into = "MEIdRanges")]
pub struct MEIdTable {
    map: FxHashMap<u32, Dimension>,
}

impl Default for MEIdTable {
    /// The standard table: ids up to 95 are 1D, the following ids up to 191 are 2D
    fn default() -> Self {
        Self::new(MIN_ME_ID..=MAX_1D_ME_ID, (MAX_1D_ME_ID + 1)..=MAX_2D_ME_ID)
    }
}

impl MEIdTable {
    pub fn new<I, J>(one_d: I, two_d: J) -> Self
    where
        I: IntoIterator<Item = u32>,
        J: IntoIterator<Item = u32>,
    {
        let mut map = FxHashMap::default();
        for id in two_d {
            map.insert(id, Dimension::Two);
        }
        for id in one_d {
            map.insert(id, Dimension::One);
        }
        Self { map }
    }

    /// Look up the dimension of an id. None if the id is not in the table.
    pub fn classify(&self, me_id: u32) -> Option<Dimension> {
        self.map.get(&me_id).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Collapse the ids of one dimension into sorted inclusive ranges
    fn ranges_of(&self, dim: Dimension) -> Vec<IdRange> {
        let mut ids: Vec<u32> = self
            .map
            .iter()
            .filter(|(_, d)| **d == dim)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();

        let mut ranges: Vec<IdRange> = Vec::new();
        for id in ids {
            match ranges.last_mut() {
                Some(range) if range.last + 1 == id => range.last = id,
                _ => ranges.push(IdRange {
                    first: id,
                    last: id,
                }),
            }
        }
        ranges
    }
}

impl From<MEIdRanges> for MEIdTable {
    fn from(value: MEIdRanges) -> Self {
        Self::new(
            value.one_d.iter().flat_map(|r| r.first..=r.last),
            value.two_d.iter().flat_map(|r| r.first..=r.last),
        )
    }
}

impl From<MEIdTable> for MEIdRanges {
    fn from(value: MEIdTable) -> Self {
        Self {
            one_d: value.ranges_of(Dimension::One),
            two_d: value.ranges_of(Dimension::Two),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let table = MEIdTable::default();
        assert_eq!(table.classify(1), Some(Dimension::One));
        assert_eq!(table.classify(95), Some(Dimension::One));
        assert_eq!(table.classify(96), Some(Dimension::Two));
        assert_eq!(table.classify(191), Some(Dimension::Two));
        assert_eq!(table.classify(0), None);
        assert_eq!(table.classify(192), None);
    }

    #[test]
    fn test_one_d_wins_on_overlap() {
        let table = MEIdTable::new([5, 6], [6, 7]);
        assert_eq!(table.classify(6), Some(Dimension::One));
        assert_eq!(table.classify(7), Some(Dimension::Two));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_yaml_ranges() {
        let table = MEIdTable::new([1, 2, 3, 7], [10, 11]);
        let yaml = serde_yaml::to_string(&table).unwrap();
        let ranges: MEIdRanges = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(
            ranges.one_d,
            vec![IdRange { first: 1, last: 3 }, IdRange { first: 7, last: 7 }]
        );
        assert_eq!(ranges.two_d, vec![IdRange { first: 10, last: 11 }]);

        let parsed: MEIdTable = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn test_dimension_display() {
        assert_eq!(Dimension::One.to_string(), "1D");
        assert_eq!(Dimension::Two.to_string(), "2D");
    }
}
