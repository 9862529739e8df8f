use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::{error, info};

use basic_cleaning::artifact::local::LocalArtifactStore;
use basic_cleaning::artifact::run::RunRecord;
use basic_cleaning::config::{CleaningConfig, DEFAULT_OUTPUT_FILE};
use basic_cleaning::{logging, pipeline};

#[derive(Parser)]
#[command(
    name = "basic-cleaning",
    version,
    about = "A very basic cleaning: drop price outliers and parse review dates"
)]
struct Cli {
    /// Name of the input artifact (`name`, `name:latest` or `name:v<N>`)
    #[arg(long = "input_artifact", alias = "input-artifact")]
    input_artifact: String,

    /// Name of the cleaned artifact
    #[arg(long = "output_artifact", alias = "output-artifact")]
    output_artifact: String,

    /// Type of the cleaned artifact
    #[arg(long = "output_type", alias = "output-type")]
    output_type: String,

    /// Description of the cleaned artifact
    #[arg(long = "output_description", alias = "output-description")]
    output_description: String,

    /// Minimum price to consider
    #[arg(long = "min_price", alias = "min-price", allow_negative_numbers = true)]
    min_price: f64,

    /// Maximum price to consider
    #[arg(long = "max_price", alias = "max-price", allow_negative_numbers = true)]
    max_price: f64,

    /// Root directory of the artifact store
    #[arg(long, env = "ARTIFACT_ROOT", default_value = "artifacts")]
    artifact_root: PathBuf,

    /// Local file the cleaned table is written to before upload
    #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
    output_file: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn config(&self) -> CleaningConfig {
        CleaningConfig {
            input_artifact: self.input_artifact.clone(),
            output_artifact: self.output_artifact.clone(),
            output_type: self.output_type.clone(),
            output_description: self.output_description.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            output_file: self.output_file.clone(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);
    execute(&cli)
}

fn execute(cli: &Cli) -> anyhow::Result<()> {
    // Rejected parameters leave no trace in the store, not even a run record.
    let config = cli.config();
    config.validate().context("basic cleaning failed")?;

    let store = LocalArtifactStore::new(&cli.artifact_root);
    let mut run = RunRecord::start(&config);
    info!("Starting run {}", run.id);
    let result = pipeline::run(&config, &store, &store);

    match &result {
        Ok(report) => run.succeed(report),
        Err(err) => run.fail(err),
    }
    // A run record that cannot be written must not hide the pipeline's outcome.
    match store.record_run(&run) {
        Ok(path) => info!("Run metadata written to {}", path.display()),
        Err(err) => error!("Could not record run {}: {err:#}", run.id),
    }

    let report = result.context("basic cleaning failed")?;
    info!(
        "Done: {} ({} of {} rows kept)",
        report.output, report.stats.rows_kept, report.stats.rows_in
    );
    Ok(())
}
