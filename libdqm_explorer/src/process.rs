use std::sync::mpsc::Sender;

use super::config::Config;
use super::error::ProcessorError;
use super::medata::MEData;
use super::record::read_records;
use super::reference::{overlayable_mes, reference_overlay};
use super::report::RunReport;
use super::trends::compute_trends;
use super::trigger_rate::{read_trigger_rate_records, TriggerRates};
use super::worker_status::{WorkerPhase, WorkerStatus};

/// Read the record table of a run and build its MEData
fn load_run(config: &Config, run_number: i32) -> Result<MEData, ProcessorError> {
    let records = read_records(&config.get_records_file(run_number)?)?;
    log::info!(
        "Loaded {} histogram records for run {}",
        records.len(),
        run_number
    );
    Ok(MEData::build_with_threshold(
        &records,
        &config.me_ids,
        config.empty_threshold,
    )?)
}

/// Read the trigger rates of a run, if trigger rates are configured
fn load_trigger_rates(
    config: &Config,
    run_number: i32,
) -> Result<Option<TriggerRates>, ProcessorError> {
    match config.get_trigger_rate_file(run_number)? {
        Some(path) => {
            let rates = TriggerRates::from_records(&read_trigger_rate_records(&path)?);
            log::info!(
                "Loaded {} trigger rates for run {}",
                rates.len(),
                run_number
            );
            Ok(Some(rates))
        }
        None => Ok(None),
    }
}

/// Overlay the 1D MEs of a run onto the configured reference run.
/// A missing reference run is skipped with a warning.
fn overlay_reference(
    config: &Config,
    reference_run: i32,
    medata: &mut MEData,
    report: &mut RunReport,
) -> Result<(), ProcessorError> {
    if !config.does_run_exist(reference_run) {
        log::warn!("Reference run {reference_run} does not exist, skipping overlays...");
        return Ok(());
    }
    let mut reference = load_run(config, reference_run)?;
    let names: Vec<String> = overlayable_mes(medata, &reference)
        .into_iter()
        .map(String::from)
        .collect();
    let names: Vec<&str> = names.iter().map(|n| n.as_str()).collect();
    let overlays = reference_overlay(medata, &mut reference, Some(&names[..]))?;
    log::info!(
        "Overlaid {} MEs onto reference run {}",
        overlays.len(),
        reference_run
    );
    report.add_reference(reference_run, overlays);
    Ok(())
}

/// The main loop of dqm_explorer.
///
/// This takes in a config (and progress monitor) and turns the record table of a run into a run report.
pub fn process_run(
    config: &Config,
    run_number: i32,
    tx: &Sender<WorkerStatus>,
    worker_id: &usize,
) -> Result<(), ProcessorError> {
    // Grab the report path first, no point in loading a run we can't write
    let report_path = config.get_report_file_name(run_number)?;

    tx.send(WorkerStatus::new(
        0.0,
        run_number,
        *worker_id,
        WorkerPhase::Loading,
    ))?;
    let mut medata = load_run(config, run_number)?;
    let trigger_rates = load_trigger_rates(config, run_number)?;
    tx.send(WorkerStatus::new(
        1.0,
        run_number,
        *worker_id,
        WorkerPhase::Loading,
    ))?;

    log::info!(
        "Processing {} MEs over {} lumisections...",
        medata.len(),
        medata.get_num_lumisections()
    );
    tx.send(WorkerStatus::new(
        0.0,
        run_number,
        *worker_id,
        WorkerPhase::Processing,
    ))?;
    medata.integrate_data(config.normalize, &config.exclude)?;
    tx.send(WorkerStatus::new(
        0.5,
        run_number,
        *worker_id,
        WorkerPhase::Processing,
    ))?;
    let trends = compute_trends(&mut medata, trigger_rates.as_ref())?;
    let mut report = RunReport::new(
        run_number,
        &medata,
        trends,
        config.normalize,
        trigger_rates.is_some(),
    )?;
    if let Some(reference_run) = config.reference_run {
        overlay_reference(config, reference_run, &mut medata, &mut report)?;
    }
    tx.send(WorkerStatus::new(
        1.0,
        run_number,
        *worker_id,
        WorkerPhase::Processing,
    ))?;

    tx.send(WorkerStatus::new(
        0.0,
        run_number,
        *worker_id,
        WorkerPhase::Writing,
    ))?;
    report.write(&report_path)?;
    tx.send(WorkerStatus::new(
        1.0,
        run_number,
        *worker_id,
        WorkerPhase::Writing,
    ))?;
    log::info!("Wrote report to {}", report_path.to_string_lossy());
    Ok(())
}

/// The function to be called by a separate thread.
/// Allows multiple runs to be processed
pub fn process(
    config: Config,
    tx: Sender<WorkerStatus>,
    worker_id: usize,
) -> Result<(), ProcessorError> {
    let runs: Vec<i32> = (config.first_run_number..(config.last_run_number + 1)).collect();
    process_subset(config, tx, worker_id, runs)
}

/// Process a subset of runs
pub fn process_subset(
    config: Config,
    tx: Sender<WorkerStatus>,
    worker_id: usize,
    subset: Vec<i32>,
) -> Result<(), ProcessorError> {
    for run in subset {
        if config.does_run_exist(run) {
            log::info!("Processing run {}...", run);
            process_run(&config, run, &tx, &worker_id)?;
            log::info!("Finished processing run {}.", run);
        } else {
            log::info!("Run {} does not exist, skipping...", run);
        }
    }
    Ok(())
}

/// Divide a run range in to a set of subranges (per thread/worker)
pub fn create_subsets(config: &Config) -> Vec<Vec<i32>> {
    let mut subsets: Vec<Vec<i32>> = vec![Vec::new(); config.n_threads.max(1) as usize];
    let n_subsets = subsets.len();

    for (idx, run) in (config.first_run_number..(config.last_run_number + 1)).enumerate() {
        subsets[idx % n_subsets].push(run)
    }

    subsets
}
