//! Artifact plumbing: where the raw table comes from and where the cleaned
//! one goes.
//!
//! The cleaning job only ever talks to these two traits, so any registry
//! (remote or local) can sit behind them. [`local::LocalArtifactStore`] is
//! the directory-backed implementation used by the CLI.

pub mod local;
pub mod run;

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Turns an artifact identifier into a file on local disk.
pub trait ArtifactSource {
    fn resolve(&self, identifier: &str) -> Result<PathBuf>;
}

/// Registers a local file as a new artifact version.
pub trait ArtifactSink {
    fn publish(&self, artifact: &NewArtifact, file: &Path) -> Result<ArtifactRef>;
}

/// Identity of an artifact about to be published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewArtifact {
    pub name: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub description: String,
}

/// A concrete, published artifact version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub name: String,
    pub version: u32,
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:v{}", self.name, self.version)
    }
}

/// Which version an identifier asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSelector {
    Latest,
    Exact(u32),
}

/// Split `name`, `name:latest` or `name:v3` into its parts.
pub fn parse_identifier(identifier: &str) -> Result<(&str, VersionSelector)> {
    let (name, selector) = match identifier.split_once(':') {
        None => (identifier, VersionSelector::Latest),
        Some((name, "latest")) => (name, VersionSelector::Latest),
        Some((name, alias)) => {
            let version = alias
                .strip_prefix('v')
                .and_then(|n| n.parse::<u32>().ok());
            match version {
                Some(v) => (name, VersionSelector::Exact(v)),
                None => bail!("invalid artifact version '{alias}' in '{identifier}'"),
            }
        }
    };
    validate_name(name)?;
    Ok((name, selector))
}

/// Artifact names become directory names, so keep them to one path segment.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("artifact name must not be empty");
    }
    if name == "." || name == ".." || name.contains(&['/', '\\', ':'][..]) {
        bail!("invalid artifact name '{name}'");
    }
    Ok(())
}
