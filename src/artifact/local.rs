use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::run::RunRecord;
use super::{
    ArtifactRef, ArtifactSink, ArtifactSource, NewArtifact, VersionSelector, parse_identifier,
    validate_name,
};

const MANIFEST_FILE: &str = "manifest.json";

// ---------------------------------------------------------------------------
// Manifest – metadata stored next to every artifact version
// ---------------------------------------------------------------------------

/// What `manifest.json` inside `<root>/artifacts/<name>/v<N>/` records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub version: u32,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub description: String,
    /// Backing files, relative to the version directory.
    pub files: Vec<String>,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

impl Manifest {
    pub fn artifact_ref(&self) -> ArtifactRef {
        ArtifactRef {
            name: self.name.clone(),
            version: self.version,
        }
    }
}

// ---------------------------------------------------------------------------
// LocalArtifactStore
// ---------------------------------------------------------------------------

/// Versioned artifact registry on the local filesystem.
///
/// ```text
/// <root>/
///   artifacts/<name>/v0/manifest.json
///   artifacts/<name>/v0/<file>
///   runs/<run-id>.json
/// ```
///
/// Versions are immutable once published. A version directory only
/// appears after its file and manifest are fully written.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalArtifactStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn artifact_dir(&self, name: &str) -> PathBuf {
        self.root.join("artifacts").join(name)
    }

    fn version_dir(&self, name: &str, version: u32) -> PathBuf {
        self.artifact_dir(name).join(format!("v{version}"))
    }

    fn runs_dir(&self) -> PathBuf {
        self.root.join("runs")
    }

    /// Published versions of `name`, ascending. Empty if the name is unknown.
    pub fn versions(&self, name: &str) -> Result<Vec<u32>> {
        let dir = self.artifact_dir(name);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut versions = Vec::new();
        for entry in fs::read_dir(&dir).with_context(|| format!("listing {}", dir.display()))? {
            let entry = entry.with_context(|| format!("listing {}", dir.display()))?;
            if !entry.path().is_dir() {
                continue;
            }
            let file_name = entry.file_name();
            if let Some(v) = file_name
                .to_str()
                .and_then(|s| s.strip_prefix('v'))
                .and_then(|n| n.parse::<u32>().ok())
            {
                versions.push(v);
            }
        }
        versions.sort_unstable();
        Ok(versions)
    }

    pub fn manifest(&self, name: &str, version: u32) -> Result<Manifest> {
        let path = self.version_dir(name, version).join(MANIFEST_FILE);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("artifact '{name}:v{version}' not found"))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Manifest of the newest version, if any version exists.
    pub fn latest(&self, name: &str) -> Result<Option<Manifest>> {
        match self.versions(name)?.last() {
            Some(&v) => self.manifest(name, v).map(Some),
            None => Ok(None),
        }
    }

    /// Persist a run record as `runs/<run-id>.json`.
    pub fn record_run(&self, run: &RunRecord) -> Result<PathBuf> {
        let dir = self.runs_dir();
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        let path = dir.join(format!("{}.json", run.id));
        let json = serde_json::to_string_pretty(run).context("serialising run record")?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }

    /// Load a previously recorded run.
    pub fn run(&self, id: &str) -> Result<RunRecord> {
        let path = self.runs_dir().join(format!("{id}.json"));
        let text = fs::read_to_string(&path).with_context(|| format!("run '{id}' not found"))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    fn stage_version(
        &self,
        staging: &Path,
        artifact: &NewArtifact,
        version: u32,
        file: &Path,
        file_name: &str,
    ) -> Result<()> {
        fs::create_dir_all(staging)
            .with_context(|| format!("creating {}", staging.display()))?;
        let size_bytes = fs::copy(file, staging.join(file_name))
            .with_context(|| format!("copying {}", file.display()))?;

        let manifest = Manifest {
            name: artifact.name.clone(),
            version,
            artifact_type: artifact.artifact_type.clone(),
            description: artifact.description.clone(),
            files: vec![file_name.to_string()],
            size_bytes,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&manifest).context("serialising manifest")?;
        fs::write(staging.join(MANIFEST_FILE), json).context("writing manifest")?;
        Ok(())
    }
}

impl ArtifactSource for LocalArtifactStore {
    /// Path of the single file backing the requested version.
    fn resolve(&self, identifier: &str) -> Result<PathBuf> {
        let (name, selector) = parse_identifier(identifier)?;
        let manifest = match selector {
            VersionSelector::Latest => self
                .latest(name)?
                .ok_or_else(|| anyhow!("artifact '{identifier}' not found"))?,
            VersionSelector::Exact(v) => self.manifest(name, v)?,
        };

        let [file] = manifest.files.as_slice() else {
            bail!(
                "artifact '{identifier}' has {} files, expected exactly one",
                manifest.files.len()
            );
        };
        let path = self.version_dir(name, manifest.version).join(file);
        if !path.is_file() {
            bail!("artifact '{identifier}' is missing its file {}", path.display());
        }
        Ok(path)
    }
}

impl ArtifactSink for LocalArtifactStore {
    fn publish(&self, artifact: &NewArtifact, file: &Path) -> Result<ArtifactRef> {
        validate_name(&artifact.name)?;
        if !file.is_file() {
            bail!("cannot publish {}: not a file", file.display());
        }
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("cannot publish {}: no file name", file.display()))?;

        let latest = self.latest(&artifact.name)?;
        if let Some(existing) = &latest {
            if existing.artifact_type != artifact.artifact_type {
                bail!(
                    "artifact '{}' already exists with type '{}', refusing to publish type '{}'",
                    artifact.name,
                    existing.artifact_type,
                    artifact.artifact_type
                );
            }
        }
        let version = latest.map_or(0, |m| m.version + 1);

        let target = self.version_dir(&artifact.name, version);
        if target.exists() {
            bail!("artifact '{}:v{version}' already exists", artifact.name);
        }

        let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let staging = self
            .artifact_dir(&artifact.name)
            .join(format!(".staging-{}-{stamp}", std::process::id()));

        let staged = self
            .stage_version(&staging, artifact, version, file, file_name)
            .and_then(|()| {
                fs::rename(&staging, &target)
                    .with_context(|| format!("moving {} into place", target.display()))
            });
        if let Err(err) = staged {
            let _ = fs::remove_dir_all(&staging);
            return Err(err);
        }

        Ok(ArtifactRef {
            name: artifact.name.clone(),
            version,
        })
    }
}
