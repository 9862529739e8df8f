//! One cleaning run: resolve → load → clean → write → publish.
//!
//! Each step runs exactly once. The first failure stops the run and is
//! returned as-is; nothing is published unless every earlier step worked.

use std::path::PathBuf;

use log::{info, warn};

use crate::artifact::{ArtifactRef, ArtifactSink, ArtifactSource};
use crate::config::CleaningConfig;
use crate::data::clean::{CleanStats, clean};
use crate::data::loader::load_file;
use crate::data::writer::save_csv;
use crate::error::{PipelineError, Stage};

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct CleaningReport {
    /// Local file the input artifact resolved to.
    pub input_path: PathBuf,
    /// Where the cleaned table was written before publishing.
    pub output_file: PathBuf,
    pub output: ArtifactRef,
    pub stats: CleanStats,
}

pub fn run(
    config: &CleaningConfig,
    source: &dyn ArtifactSource,
    sink: &dyn ArtifactSink,
) -> Result<CleaningReport, PipelineError> {
    config.validate()?;
    let bounds = config.bounds();
    if bounds.is_inverted() {
        warn!(
            "min_price {} is greater than max_price {}; no row can be kept",
            bounds.min_price, bounds.max_price
        );
    }

    info!("Download input artifact {}", config.input_artifact);
    let input_path = source
        .resolve(&config.input_artifact)
        .map_err(|e| PipelineError::collaborator(Stage::Resolve, e))?;
    let table = load_file(&input_path).map_err(|e| PipelineError::collaborator(Stage::Load, e))?;
    info!(
        "Loaded {} rows x {} columns from {}",
        table.len(),
        table.columns.len(),
        input_path.display()
    );

    info!(
        "Drop outliers: keeping the values between the min_price and the max_price ({}..={})",
        bounds.min_price, bounds.max_price
    );
    let cleaned = clean(&table, bounds)?;
    let stats = cleaned.stats;
    info!("Kept {} of {} rows", stats.rows_kept, stats.rows_in);
    info!("Convert the column last_review to datetime");
    if stats.unparsed_dates > 0 {
        warn!("{} last_review values could not be parsed and were left empty", stats.unparsed_dates);
    }

    info!("Save the cleaned table to {}", config.output_file.display());
    save_csv(&cleaned.table, &config.output_file)
        .map_err(|e| PipelineError::collaborator(Stage::Write, e))?;

    info!("Upload the cleaned artifact {}", config.output_artifact);
    let output = sink
        .publish(&config.output(), &config.output_file)
        .map_err(|e| PipelineError::collaborator(Stage::Publish, e))?;
    info!("Published {output}");

    Ok(CleaningReport {
        input_path,
        output_file: config.output_file.clone(),
        output,
        stats,
    })
}
