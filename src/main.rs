use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use cycle_detector_rs::console::TerminalConsole;
use cycle_detector_rs::discovery;
use cycle_detector_rs::session::SessionWorkflow;
use cycle_detector_rs::storage::CycleStore;
use cycle_detector_rs::table::{self, RecordTable};
use cycle_detector_rs::types::DetectionParameters;
use cycle_detector_rs::{Pattern, SignalKind};

#[derive(Parser, Debug)]
#[command(name = "cycle_detector")]
#[command(about = "Adaptive cycle detection for motion-capture records", long_about = None)]
struct Args {
    /// Path to the data directory
    #[arg(short = 'd', long)]
    data_path: PathBuf,

    /// Directory to save cycle detection results
    #[arg(short = 'o', long, default_value = "output")]
    output_dir: PathBuf,

    /// Sampling frequency in Hz
    #[arg(short = 'f', long)]
    fs: f64,

    /// Detection pattern (on_peak, between_peak, both)
    #[arg(long, default_value = "both")]
    pattern: String,

    /// Data source keyword to filter files (e.g. "c3d", "xsens")
    #[arg(short = 's', long)]
    data_source: String,

    /// Experimental condition keyword to filter files
    #[arg(short = 'c', long)]
    condition: String,

    /// Name of the position column in the data
    #[arg(long)]
    position_col: String,

    /// Signal to use for cycle detection (position, velocity, abs_velocity)
    #[arg(long, default_value = "abs_velocity")]
    signal: String,

    /// Threshold value for cycle detection
    #[arg(short = 't', long)]
    threshold: Option<f64>,

    /// Minimum peak distance in seconds
    #[arg(long)]
    distance: Option<f64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let pattern = Pattern::parse(&args.pattern)?;
    let signal = SignalKind::parse(&args.signal)?;

    let store = CycleStore::new(&args.output_dir)?;
    let mut console = TerminalConsole::new();

    // Seed from the last run; the CLI always decides pattern and signal,
    // threshold and distance only when given.
    let last = store.load_last_parameters();
    let mut parameters = DetectionParameters {
        threshold: last.threshold,
        distance: last.distance,
        pattern,
        signal,
    };
    if let Some(threshold) = args.threshold {
        parameters.threshold = threshold;
    }
    if let Some(distance) = args.distance {
        parameters.distance = distance;
    }

    let records = discovery::find_records(&args.data_path, &args.data_source, &args.condition)?;
    if records.is_empty() {
        anyhow::bail!("no CSV records found matching the specified data source and condition");
    }

    let mut workflow = SessionWorkflow::new(&store, &mut console, parameters);
    for record_path in &records {
        let record_name = table::record_name(record_path);
        let outcome = RecordTable::from_csv(record_path)
            .and_then(|record| workflow.process_record(&record_name, &record, &args.position_col, args.fs));
        if let Err(e) = outcome {
            // One bad record never takes down the run.
            eprintln!("Error processing '{record_name}': {e}");
        }
    }

    println!("Processing completed for all records.");
    Ok(())
}
