use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::constants::{DEFAULT_EMPTY_THRESHOLD, RUN_NUMBER_WIDTH};
use super::error::ConfigError;
use super::me_ids::MEIdTable;
use super::medata::LumiSelection;

/// Structure representing the application configuration. Contains pathing, run, and analysis information
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub records_path: PathBuf,
    pub trigger_rate_path: Option<PathBuf>,
    pub report_path: PathBuf,
    pub reference_run: Option<i32>,
    pub first_run_number: i32,
    pub last_run_number: i32,
    pub exclude: Vec<LumiSelection>,
    pub normalize: bool,
    pub empty_threshold: u64,
    pub me_ids: MEIdTable,
    pub n_threads: i32,
}

impl Default for Config {
    /// Generate a new Config object. All paths will be empty/invalid
    fn default() -> Self {
        Self {
            records_path: PathBuf::from("None"),
            trigger_rate_path: None,
            report_path: PathBuf::from("None"),
            reference_run: None,
            first_run_number: 0,
            last_run_number: 0,
            exclude: Vec::new(),
            normalize: false,
            empty_threshold: DEFAULT_EMPTY_THRESHOLD,
            me_ids: MEIdTable::default(),
            n_threads: 1,
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Write the configuration to a YAML file
    pub fn write_config_file(&self, config_path: &Path) -> Result<(), ConfigError> {
        let yaml_str = serde_yaml::to_string(self)?;
        std::fs::write(config_path, yaml_str)?;
        Ok(())
    }

    /// Check if a specific run exists by evaluating the existance of its histogram record table
    /// Trigger rates are optional
    pub fn does_run_exist(&self, run_number: i32) -> bool {
        self.records_path
            .join(format!("{}.json", self.get_run_str(run_number)))
            .exists()
    }

    /// Get the path to the histogram record table of a run
    pub fn get_records_file(&self, run_number: i32) -> Result<PathBuf, ConfigError> {
        let path = self
            .records_path
            .join(format!("{}.json", self.get_run_str(run_number)));
        if path.exists() {
            Ok(path)
        } else {
            Err(ConfigError::BadFilePath(path))
        }
    }

    /// Get the path to the trigger rate table of a run, if trigger rates are in use
    pub fn get_trigger_rate_file(&self, run_number: i32) -> Result<Option<PathBuf>, ConfigError> {
        let Some(rate_dir) = self.trigger_rate_path.as_ref() else {
            return Ok(None);
        };
        let path = rate_dir.join(format!("{}_rates.json", self.get_run_str(run_number)));
        if path.exists() {
            Ok(Some(path))
        } else {
            Err(ConfigError::BadFilePath(path))
        }
    }

    /// Get the path to the output report
    pub fn get_report_file_name(&self, run_number: i32) -> Result<PathBuf, ConfigError> {
        let report_path = self
            .report_path
            .join(format!("{}_report.yml", self.get_run_str(run_number)));
        if self.report_path.exists() {
            Ok(report_path)
        } else {
            Err(ConfigError::BadFilePath(self.report_path.clone()))
        }
    }

    /// Construct the run string, zero padded to the width of a run number
    fn get_run_str(&self, run_number: i32) -> String {
        format!("run_{run_number:0>width$}", width = RUN_NUMBER_WIDTH)
    }

    pub fn is_n_threads_valid(&self) -> bool {
        self.n_threads >= 1
    }

    pub fn has_trigger_rates(&self) -> bool {
        self.trigger_rate_path.is_some()
    }

    pub fn has_reference(&self) -> bool {
        self.reference_run.is_some()
    }
}
