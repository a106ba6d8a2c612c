use std::path::PathBuf;

use clap::Parser;

use pace_charts::config::{ChartFormat, RenderConfig, ResolvedOutputs};
use pace_charts::logging::init_logging;
use pace_charts::runner::ChartRunner;

/// Season-long teammate consistency charts from per-race lap CV data.
#[derive(Debug, Parser)]
#[command(
    name = "pace-charts",
    author,
    version,
    about = "Render per-pair season consistency comparison charts"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "charts.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the pace_per_race CSV path.
    #[arg(long, value_name = "CSV")]
    input: Option<String>,

    /// Override the output directory for charts.
    #[arg(long, value_name = "DIR")]
    charts_dir: Option<String>,

    /// Override the minimum number of shared races per pair.
    #[arg(long, value_name = "COUNT")]
    min_races: Option<usize>,

    /// Override the image format.
    #[arg(long, value_enum)]
    format: Option<ChartFormat>,

    /// Exit after validating the configuration (no charts are rendered).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = RenderConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(input) = cli.input {
        config.input.csv = input;
    }

    if let Some(charts_dir) = cli.charts_dir {
        config.outputs.charts_dir = charts_dir;
    }

    if let Some(min_races) = cli.min_races {
        config.pairs.min_races = min_races;
    }

    if let Some(format) = cli.format {
        config.outputs.format = format;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();

    println!(
        "Loaded configuration '{run_id}': {} -> {} (min {} races)",
        outputs.input_csv.display(),
        outputs.charts_dir.display(),
        config.pairs.min_races
    );

    let logging = config.logging.clone();
    let runner = ChartRunner::new(config, outputs.clone())?;

    if cli.validate_only {
        let races = runner.calendar().races();
        println!(
            "Validation-only mode: {} races in calendar ({} .. {}), rendering skipped.",
            races.len(),
            races.first().map(String::as_str).unwrap_or("-"),
            races.last().map(String::as_str).unwrap_or("-")
        );
        return Ok(());
    }

    let logging_guard = init_logging(&logging, &outputs, &run_id)?;

    let summary = runner.run()?;
    println!(
        "Render complete for '{run_id}': {} records ({} dropped), {} pairs -> {} charts, \
         {} skipped",
        summary.records_loaded,
        summary.records_dropped,
        summary.pairs_seen,
        summary.charts.len(),
        summary.skipped.len()
    );
    if let Some(log_path) = logging_guard.log_path.as_ref() {
        println!("Structured log: {}", log_path.display());
    }

    if !summary.is_clean() {
        for failure in &summary.failures {
            eprintln!("ERROR: {}: {}", failure.key, failure.error);
        }
        anyhow::bail!("{} chart(s) failed to render", summary.failures.len());
    }

    Ok(())
}
