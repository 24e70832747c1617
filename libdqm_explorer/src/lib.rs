//! # dqm_explorer
//!
//! dqm_explorer is a toolkit for exploring the per-lumisection monitoring elements (MEs)
//! recorded by the CMS Data Quality Monitoring (DQM) system, written in Rust. It takes the
//! histogram records of a run, as exported from the DQM/DIALS services, and assembles them
//! into dense per-ME stacks that can be normalized, integrated, trended, and compared to a
//! reference run.
//!
//! ## Installation
//!
//! Currently the only method of install is from source.
//!
//! ### Rust
//!
//! If you have not used Rust before, you will most likely need to install the Rust tool
//! chain. See the [Rust docs](https://www.rust-lang.org/tools/install) for installation
//! instructions.
//!
//! ### Building & Install
//!
//! To build and install the CLI use `cargo install --path ./dqm_explorer_cli` from the top
//! level dqm_explorer repository. The binary will be installed to your cargo install
//! location (typically something like `~/.cargo/bin/`). To use the CLI see the
//! `dqm_explorer_cli` README.
//!
//! ## Using the library
//!
//! The core of the library is [`medata::MEData`], which is built from the histogram
//! record table of a single run:
//!
//! ```no_run
//! use libdqm_explorer::me_ids::MEIdTable;
//! use libdqm_explorer::medata::{LumiSelection, MEData, View};
//! use libdqm_explorer::record::read_records;
//!
//! let records = read_records(std::path::Path::new("run_380238.json")).unwrap();
//! let mut medata = MEData::build(&records, &MEIdTable::default()).unwrap();
//! medata.norm_data(None, None).unwrap();
//! medata
//!     .integrate_data(true, &[LumiSelection::Range(vec![1, 10])])
//!     .unwrap();
//! let first_lumi = medata
//!     .get_data("PixelPhase1/Tracks/charge_PXBarrel", Some(1), View::Norm)
//!     .unwrap();
//! ```
//!
//! Every ME keeps its raw stack along with three derived views (`norm`, `trignorm`, and
//! `integral`). Normalizing or integrating again overwrites the previous view.
//!
//! ## Configuration
//!
//! The batch processor (and CLI) is driven by a YAML configuration:
//!
//! ```yml
//! records_path: /data/dqm/records
//! trigger_rate_path: null
//! report_path: /data/dqm/reports
//! reference_run: null
//! first_run_number: 380238
//! last_run_number: 380240
//! exclude:
//! - 1
//! - [40, 45]
//! normalize: true
//! empty_threshold: 0
//! me_ids:
//!   one_d:
//!   - first: 1
//!     last: 95
//!   two_d:
//!   - first: 96
//!     last: 191
//! n_threads: 1
//! ```
//!
//! - `records_path`: directory holding `run_<run>.json` histogram record tables
//! - `trigger_rate_path`: optional directory holding `run_<run>_rates.json` trigger rate
//! tables. If set, trends are computed on trigger normalized data.
//! - `report_path`: directory to which run reports are written
//! - `reference_run`: optional run whose 1D MEs are overlaid on every processed run
//! - `exclude`: lumisections left out of the integration, as single numbers or inclusive
//! `[start, end]` ranges
//! - `empty_threshold`: lumisections with at most this many entries are marked empty
//! - `me_ids`: the id ranges of 1D and 2D MEs. Records with an id outside these ranges
//! are rejected.
//! - `n_threads`: the number of parallel workers the run range is divided amongst
//!
//! Run numbers are zero padded to six digits in all file names.
//!
//! ## Output
//!
//! Each processed run produces a `run_<run>_report.yml` containing, per ME, the bin axes,
//! the empty lumisections, the integral, the per-lumisection trends (mean, stdev, mpv,
//! max, and standard error on the mean), and the reference overlay if one was requested.
pub mod bins;
pub mod builder;
pub mod config;
pub mod constants;
pub mod empty;
pub mod error;
pub mod me_ids;
pub mod medata;
pub mod normalize;
pub mod process;
pub mod record;
pub mod reference;
pub mod report;
pub mod trends;
pub mod trigger_rate;
pub mod worker_status;
