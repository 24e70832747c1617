use ndarray::{Array1, ArrayView1, ArrayViewD, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::MEDataError;
use super::medata::{BinAxis, MEData, View};
use super::trigger_rate::TriggerRates;

/// The per-lumisection quantities a TrendSummary tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Mean,
    Stdev,
    Mpv,
    Max,
    StdErrOnMean,
}

/// Summary statistics of a single histogram
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramStats {
    pub mean: f64,
    pub stdev: f64,
    pub mpv: f64,
    pub max: f64,
}

impl HistogramStats {
    /// Statistics of the bin coordinates weighted by the bin counts.
    ///
    /// A histogram with no weight has a mean and stdev of 0. The mpv is the coordinate of the
    /// first highest bin.
    pub fn new(counts: ArrayView1<f64>, coords: ArrayView1<f64>) -> Self {
        let weight: f64 = counts.sum();
        let mean = nan_to_zero(
            counts
                .iter()
                .zip(coords.iter())
                .map(|(w, x)| w * x)
                .sum::<f64>()
                / weight,
        );
        let variance = nan_to_zero(
            counts
                .iter()
                .zip(coords.iter())
                .map(|(w, x)| w * (x - mean).powi(2))
                .sum::<f64>()
                / weight,
        );

        let mut peak: Option<(usize, f64)> = None;
        for (idx, count) in counts.iter().enumerate() {
            match peak {
                Some((_, max)) if *count <= max => (),
                _ => peak = Some((idx, *count)),
            }
        }
        let (mpv, max) = match peak {
            Some((idx, max)) => (coords.get(idx).copied().unwrap_or(0.0), max),
            None => (0.0, 0.0),
        };

        Self {
            mean,
            stdev: variance.sqrt(),
            mpv,
            max,
        }
    }
}

fn nan_to_zero(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value
    }
}

/// Per-lumisection trends of one monitoring element.
///
/// The mean and the mpv are both kept; for skewed (Landau-like) distributions they disagree
/// and neither alone is a good peak estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub mean: Vec<f64>,
    pub stdev: Vec<f64>,
    pub mpv: Vec<f64>,
    pub max: Vec<f64>,
    pub std_err_on_mean: Vec<f64>,
    pub empty_lss: Vec<u32>,
}

impl TrendSummary {
    /// Compute the trends of a per-lumisection stack. 2D histograms are projected onto x first.
    pub fn from_histograms(
        stack: ArrayViewD<f64>,
        x_bins: ArrayView1<f64>,
        empty_lss: Vec<u32>,
    ) -> Self {
        let n_lumis = stack.shape().first().copied().unwrap_or(0);
        let mut summary = Self {
            mean: Vec::with_capacity(n_lumis),
            stdev: Vec::with_capacity(n_lumis),
            mpv: Vec::with_capacity(n_lumis),
            max: Vec::with_capacity(n_lumis),
            std_err_on_mean: Vec::with_capacity(n_lumis),
            empty_lss,
        };
        let sqrt_bins = (x_bins.len() as f64).sqrt();

        for lumi in stack.outer_iter() {
            let counts = project_x(lumi);
            let stats = HistogramStats::new(counts.view(), x_bins);
            summary.mean.push(stats.mean);
            summary.stdev.push(stats.stdev);
            summary.mpv.push(stats.mpv);
            summary.max.push(stats.max);
            summary.std_err_on_mean.push(stats.stdev / sqrt_bins);
        }
        summary
    }

    pub fn get(&self, trend: Trend) -> &[f64] {
        match trend {
            Trend::Mean => &self.mean,
            Trend::Stdev => &self.stdev,
            Trend::Mpv => &self.mpv,
            Trend::Max => &self.max,
            Trend::StdErrOnMean => &self.std_err_on_mean,
        }
    }

    /// A trend divided by its own sum, for comparing runs of different lengths
    pub fn normalized(&self, trend: Trend) -> Vec<f64> {
        let values = self.get(trend);
        let total: f64 = values.iter().sum();
        values.iter().map(|v| nan_to_zero(v / total)).collect()
    }

    pub fn num_lumisections(&self) -> usize {
        self.mean.len()
    }

    /// The 1-based lumisections that are not empty
    pub fn good_lumisections(&self) -> Vec<u32> {
        (1..=self.num_lumisections() as u32)
            .filter(|ls| self.empty_lss.binary_search(ls).is_err())
            .collect()
    }
}

/// Sum a 2D lumisection over y; 1D lumisections pass through
fn project_x(lumi: ArrayViewD<f64>) -> Array1<f64> {
    if lumi.ndim() > 1 {
        lumi.sum_axis(Axis(1)).iter().copied().collect()
    } else {
        lumi.iter().copied().collect()
    }
}

/// Compute the trends of every ME in the run.
///
/// With trigger rates the MEs are trigger normalized first (overwriting their `trignorm`
/// view) and the trends are taken from the normalized data.
pub fn compute_trends(
    medata: &mut MEData,
    trigger_rate: Option<&TriggerRates>,
) -> Result<BTreeMap<String, TrendSummary>, MEDataError> {
    let view = match trigger_rate {
        Some(rates) => {
            medata.norm_data(Some(rates), None)?;
            View::TrigNorm
        }
        None => View::Data,
    };

    let mut trends = BTreeMap::new();
    for name in medata.get_me_names() {
        let stack = medata.get_data(name, None, view)?;
        let x_bins = medata.get_bins(name, BinAxis::X)?;
        let empty_lss = medata.get_empty_lumisections(name)?.to_vec();
        trends.insert(
            name.to_string(),
            TrendSummary::from_histograms(stack, x_bins.view(), empty_lss),
        );
    }
    Ok(trends)
}
