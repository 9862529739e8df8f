use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::artifact::{NewArtifact, validate_name};
use crate::data::clean::PriceBounds;
use crate::error::PipelineError;

/// File name the cleaned table is written to before it is published.
pub const DEFAULT_OUTPUT_FILE: &str = "clean_sample.csv";

/// Everything one cleaning run needs, passed explicitly to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningConfig {
    /// Identifier of the raw dataset, e.g. `sample.csv:latest`.
    pub input_artifact: String,
    /// Name of the cleaned artifact.
    pub output_artifact: String,
    /// Type tag of the cleaned artifact.
    pub output_type: String,
    /// Free-text description of the cleaned artifact.
    pub output_description: String,
    pub min_price: f64,
    pub max_price: f64,
    /// Local file the cleaned table is written to.
    pub output_file: PathBuf,
}

impl CleaningConfig {
    /// Reject values no run could succeed with. Inverted bounds are allowed;
    /// they just produce an empty table.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.input_artifact.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "input_artifact must not be empty".into(),
            ));
        }
        validate_name(&self.output_artifact)
            .map_err(|e| PipelineError::Configuration(format!("output_artifact: {e}")))?;
        if self.output_type.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "output_type must not be empty".into(),
            ));
        }
        for (name, value) in [("min_price", self.min_price), ("max_price", self.max_price)] {
            if !value.is_finite() {
                return Err(PipelineError::Configuration(format!(
                    "{name} must be a finite number, got {value}"
                )));
            }
        }
        if self.output_file.file_name().is_none() {
            return Err(PipelineError::Configuration(format!(
                "output file {} has no file name",
                self.output_file.display()
            )));
        }
        Ok(())
    }

    pub fn bounds(&self) -> PriceBounds {
        PriceBounds::new(self.min_price, self.max_price)
    }

    pub fn output(&self) -> NewArtifact {
        NewArtifact {
            name: self.output_artifact.clone(),
            artifact_type: self.output_type.clone(),
            description: self.output_description.clone(),
        }
    }
}
