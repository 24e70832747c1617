use clap::{Arg, Command};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use libdqm_explorer::config::Config;
use libdqm_explorer::process::{create_subsets, process_subset};
use libdqm_explorer::worker_status::{WorkerPhase, WorkerStatus};

fn make_template_config(path: &Path) {
    match Config::default().write_config_file(path) {
        Ok(()) => log::info!("Done."),
        Err(e) => log::error!("Could not write template config: {e}"),
    }
}

/// Each phase gets its own bar color
fn bar_style(phase: WorkerPhase) -> ProgressStyle {
    let (label, color) = match phase {
        WorkerPhase::Loading => ("Loading", "yellow"),
        WorkerPhase::Processing => ("Processing", "cyan"),
        WorkerPhase::Writing => ("Writing", "green"),
    };
    ProgressStyle::with_template(&format!(
        "{{prefix}} {label:<10} {{msg}} [{{bar:40.{color}/blue}}] {{pos:>3}}%"
    ))
    .unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn main() {
    // Create a cli
    let matches = Command::new("dqm_explorer_cli")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .global(true)
                .help("Path to the configuration file"),
        )
        .get_matches();

    // Initialize feedback
    let logger = simplelog::TermLogger::new(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    let pb_manager = MultiProgress::new();

    if let Err(e) = LogWrapper::new(pb_manager.clone(), logger).try_init() {
        eprintln!("Could not create logging/progress: {e}");
        return;
    }
    log::set_max_level(simplelog::LevelFilter::Info);

    // Parse the cli
    let config_path = match matches.get_one::<String>("path") {
        Some(p) => PathBuf::from(p),
        None => {
            log::error!("A configuration path is required (--path)");
            return;
        }
    };

    if let Some(("new", _)) = matches.subcommand() {
        log::info!(
            "Making a template config at {}...",
            config_path.to_string_lossy()
        );
        make_template_config(&config_path);
        return;
    }

    // Load our config
    log::info!("Loading config from {}...", config_path.to_string_lossy());
    let config = match Config::read_config_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };
    if !config.is_n_threads_valid() {
        log::error!("Number of workers must be at least 1, found {}", config.n_threads);
        return;
    }
    log::info!("Config successfully loaded.");
    log::info!("Records Path: {}", config.records_path.to_string_lossy());
    log::info!("Report Path: {}", config.report_path.to_string_lossy());
    match &config.trigger_rate_path {
        Some(p) => log::info!("Trigger Rate Path: {}", p.to_string_lossy()),
        None => log::info!("Trigger Rate Path: None"),
    }
    log::info!(
        "First Run: {} Last Run: {}",
        config.first_run_number,
        config.last_run_number
    );
    if let Some(run) = config.reference_run {
        log::info!("Reference Run: {run}");
    }
    log::info!("Normalize: {}", config.normalize);
    log::info!("Number of Workers: {}", config.n_threads);

    // Spawn the workers, one progress bar each
    let (tx, rx) = mpsc::channel::<WorkerStatus>();
    let mut bars: BTreeMap<usize, ProgressBar> = BTreeMap::new();
    let mut workers = Vec::new();
    for (idx, subset) in create_subsets(&config).into_iter().enumerate() {
        // Dont make empty workers
        if subset.is_empty() {
            continue;
        }
        let bar = pb_manager.add(ProgressBar::new(100));
        bar.set_style(bar_style(WorkerPhase::default()));
        bar.set_prefix(format!("Worker {idx}"));
        bars.insert(idx, bar);

        let conf = config.clone();
        let worker_tx = tx.clone();
        workers.push((
            idx,
            std::thread::spawn(move || process_subset(conf, worker_tx, idx, subset)),
        ));
    }
    // Only the workers hold senders now, so the loop below ends when they all do
    drop(tx);

    for status in rx.iter() {
        if let Some(bar) = bars.get(&status.worker_id) {
            bar.set_style(bar_style(status.phase));
            bar.set_message(format!("run {}", status.run_number));
            bar.set_position((status.progress * 100.0) as u64);
        }
    }

    for (idx, handle) in workers {
        match handle.join() {
            Ok(Ok(())) => log::info!("Worker {idx} successfully processed its runs!"),
            Ok(Err(e)) => log::error!("Worker {idx} failed with error: {e}"),
            Err(_) => log::error!("Failed to join worker {idx}!"),
        }
    }

    for bar in bars.values() {
        bar.finish();
    }

    log::info!("Done.");
}
