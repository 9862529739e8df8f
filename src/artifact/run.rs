use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ArtifactRef;
use crate::config::CleaningConfig;
use crate::pipeline::CleaningReport;

/// Job type recorded for every cleaning run.
pub const JOB_TYPE: &str = "basic_cleaning";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed { error: String },
}

/// Metadata and configuration of one invocation, stored next to the
/// artifacts it read and wrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: String,
    pub job_type: String,
    pub config: CleaningConfig,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    /// Local file the input artifact resolved to.
    pub input_path: Option<PathBuf>,
    pub output: Option<ArtifactRef>,
    pub rows_in: Option<usize>,
    pub rows_kept: Option<usize>,
}

impl RunRecord {
    pub fn start(config: &CleaningConfig) -> Self {
        let started_at = Utc::now();
        RunRecord {
            id: format!("{JOB_TYPE}-{}", started_at.format("%Y%m%dT%H%M%S%.6fZ")),
            job_type: JOB_TYPE.to_string(),
            config: config.clone(),
            started_at,
            finished_at: None,
            status: RunStatus::Running,
            input_path: None,
            output: None,
            rows_in: None,
            rows_kept: None,
        }
    }

    pub fn succeed(&mut self, report: &CleaningReport) {
        self.finished_at = Some(Utc::now());
        self.status = RunStatus::Succeeded;
        self.input_path = Some(report.input_path.clone());
        self.output = Some(report.output.clone());
        self.rows_in = Some(report.stats.rows_in);
        self.rows_kept = Some(report.stats.rows_kept);
    }

    /// `error` is rendered with its whole cause chain.
    pub fn fail(&mut self, error: &dyn std::error::Error) {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        self.finished_at = Some(Utc::now());
        self.status = RunStatus::Failed { error: message };
    }
}
