use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::me_ids::Dimension;

/// The declared axis of a histogram: lower edge, upper edge, and number of bins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisSpec {
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl AxisSpec {
    pub fn new(min: f64, max: f64, count: usize) -> Self {
        Self { min, max, count }
    }

    /// Evenly spaced bin coordinates from min to max (both inclusive).
    ///
    /// A single bin sits at min, zero bins give an empty axis.
    pub fn coordinates(&self) -> Array1<f64> {
        let mut coords = Array1::linspace(self.min, self.max, self.count);
        // Pin the endpoint, accumulated steps can drift off max
        if self.count > 1 {
            coords[self.count - 1] = self.max;
        }
        coords
    }
}

/// The bin coordinates of a 1D or 2D monitoring element
#[derive(Debug, Clone, PartialEq)]
pub struct BinGeometry {
    pub x: Array1<f64>,
    pub y: Option<Array1<f64>>,
}

impl BinGeometry {
    pub fn one_d(x: &AxisSpec) -> Self {
        Self {
            x: x.coordinates(),
            y: None,
        }
    }

    pub fn two_d(x: &AxisSpec, y: &AxisSpec) -> Self {
        Self {
            x: x.coordinates(),
            y: Some(y.coordinates()),
        }
    }

    pub fn dimension(&self) -> Dimension {
        if self.y.is_some() {
            Dimension::Two
        } else {
            Dimension::One
        }
    }

    /// Shape of a single lumisection histogram on this geometry
    pub fn histogram_shape(&self) -> Vec<usize> {
        match &self.y {
            Some(y) => vec![self.x.len(), y.len()],
            None => vec![self.x.len()],
        }
    }
}
