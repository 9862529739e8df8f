use std::fmt;

use thiserror::Error;

/// The loaded table does not have the shape the cleaner needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("missing required column '{0}'")]
    MissingColumn(String),
}

/// Step of the cleaning job that talks to an external collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Load,
    Write,
    Publish,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Resolve => "resolving input artifact",
            Stage::Load => "loading input table",
            Stage::Write => "writing cleaned table",
            Stage::Publish => "publishing output artifact",
        };
        f.write_str(name)
    }
}

/// Every way a cleaning run can fail. None of them leave an artifact behind.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("{stage} failed")]
    Collaborator {
        stage: Stage,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl PipelineError {
    pub fn collaborator(stage: Stage, err: anyhow::Error) -> Self {
        PipelineError::Collaborator {
            stage,
            source: err.into(),
        }
    }

    /// The stage that failed, for collaborator errors.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Collaborator { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
