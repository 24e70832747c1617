use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::constants::REPORT_FORMAT_VERSION;
use super::error::ReportError;
use super::me_ids::Dimension;
use super::medata::{BinAxis, MEData};
use super::reference::ReferenceOverlay;
use super::trends::TrendSummary;

/// The summary of a single monitoring element within a run report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MEReport {
    pub me_id: u32,
    pub dimension: Dimension,
    pub num_lumisections: usize,
    pub total_entries: u64,
    pub empty_lumisections: Vec<u32>,
    pub x_bins: Vec<f64>,
    pub y_bins: Option<Vec<f64>>,
    /// Integral flattened in row-major order (x outer, y inner for 2D)
    pub integral: Vec<f64>,
    pub trends: TrendSummary,
    pub reference: Option<ReferenceOverlay>,
}

/// RunReport is the YAML document written for each processed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub version: String,
    pub run_number: i32,
    pub num_lumisections: usize,
    pub excluded_lumisections: Vec<u32>,
    pub normalized: bool,
    pub trigger_normalized: bool,
    pub reference_run: Option<i32>,
    pub mes: BTreeMap<String, MEReport>,
}

impl RunReport {
    /// Collect the report of an integrated run. Every ME must have an integral and a trend summary.
    pub fn new(
        run_number: i32,
        medata: &MEData,
        trends: BTreeMap<String, TrendSummary>,
        normalized: bool,
        trigger_normalized: bool,
    ) -> Result<Self, ReportError> {
        let mut mes = BTreeMap::new();
        let mut trends = trends;
        for name in medata.get_me_names() {
            let Some(summary) = trends.remove(name) else {
                log::warn!("ME {name} has no trend summary and was left out of the report");
                continue;
            };
            let y_bins = match medata.get_dims(name)? {
                Dimension::One => None,
                Dimension::Two => Some(medata.get_bins(name, BinAxis::Y)?.to_vec()),
            };
            mes.insert(
                name.to_string(),
                MEReport {
                    me_id: medata.get_me_id(name)?,
                    dimension: medata.get_dims(name)?,
                    num_lumisections: medata.get_lumisections(name)?.len(),
                    total_entries: medata.get_entries(name)?.sum(),
                    empty_lumisections: medata.get_empty_lumisections(name)?.to_vec(),
                    x_bins: medata.get_bins(name, BinAxis::X)?.to_vec(),
                    y_bins,
                    integral: medata.get_integral(name)?.iter().copied().collect(),
                    trends: summary,
                    reference: None,
                },
            );
        }

        Ok(Self {
            version: format!("{}:{}", env!("CARGO_PKG_NAME"), REPORT_FORMAT_VERSION),
            run_number,
            num_lumisections: medata.get_num_lumisections(),
            excluded_lumisections: medata.get_excluded().to_vec(),
            normalized,
            trigger_normalized,
            reference_run: None,
            mes,
        })
    }

    /// Attach reference overlays. Overlays of MEs missing from the report are dropped.
    pub fn add_reference(&mut self, reference_run: i32, overlays: Vec<ReferenceOverlay>) {
        self.reference_run = Some(reference_run);
        for overlay in overlays {
            match self.mes.get_mut(&overlay.me) {
                Some(me) => me.reference = Some(overlay),
                None => log::warn!("Reference overlay for unknown ME {} was dropped", overlay.me),
            }
        }
    }

    pub fn write(&self, path: &Path) -> Result<(), ReportError> {
        let yaml_str = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml_str)?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self, ReportError> {
        let yaml_str = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }
}
