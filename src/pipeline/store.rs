//! Request workspaces: where the structured record and the PDF artifact live.
//!
//! The content stage persists its [`StructuredReport`] and the rendering
//! stage loads it back, so a render can be re-run from disk without another
//! model call. By default each request gets its own `output_dir/<uuid>/`
//! directory; the shared layout writes straight into `output_dir` and lets
//! the next request overwrite the previous one.
//!
//! All writes go through a temp file and a rename so a reader never sees a
//! half-written record or PDF.

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::report::StructuredReport;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// File name of the persisted structured record.
pub const RECORD_FILE: &str = "content.json";
/// File name of the persisted PDF artifact.
pub const ARTIFACT_FILE: &str = "strategic_report.pdf";
/// File name of the persisted HTML rendering.
pub const HTML_FILE: &str = "report.html";

/// Directory holding one request's files.
#[derive(Debug, Clone)]
pub struct RequestWorkspace {
    id: Uuid,
    dir: PathBuf,
    isolated: bool,
}

impl RequestWorkspace {
    /// Workspace writing directly into `root`, shared by every request.
    pub fn shared(root: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            dir: root.into(),
            isolated: false,
        }
    }

    /// Fresh `root/<uuid>/` workspace owned by a single request.
    pub fn isolated(root: impl AsRef<Path>) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            dir: root.as_ref().join(id.to_string()),
            isolated: true,
        }
    }

    /// Pick the layout `config` asks for.
    pub fn for_config(config: &ReportConfig) -> Self {
        if config.isolate_requests {
            Self::isolated(&config.output_dir)
        } else {
            Self::shared(config.output_dir.clone())
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_isolated(&self) -> bool {
        self.isolated
    }

    pub fn record_path(&self) -> PathBuf {
        self.dir.join(RECORD_FILE)
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.dir.join(ARTIFACT_FILE)
    }

    pub fn html_path(&self) -> PathBuf {
        self.dir.join(HTML_FILE)
    }

    /// Delete the workspace directory. Shared workspaces are never removed.
    pub async fn remove(&self) {
        if !self.isolated {
            return;
        }
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => debug!("Removed workspace {}", self.dir.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove workspace {}: {}", self.dir.display(), e),
        }
    }
}

/// Persist `report` as pretty-printed JSON, replacing any earlier record.
pub async fn persist_report(
    workspace: &RequestWorkspace,
    report: &StructuredReport,
) -> Result<PathBuf, ReportError> {
    let path = workspace.record_path();
    let json = serde_json::to_vec_pretty(report)
        .map_err(|e| ReportError::Internal(format!("Failed to serialise report: {e}")))?;
    write_atomic(&path, &json).await?;
    debug!("Persisted record {} ({} bytes)", path.display(), json.len());
    Ok(path)
}

/// Load a persisted record.
///
/// A missing file is [`ReportError::MissingInput`]; a file that is not a
/// report object is [`ReportError::InvalidRecord`].
pub async fn load_report(path: &Path) -> Result<StructuredReport, ReportError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            ReportError::MissingInput {
                path: path.to_path_buf(),
            }
        } else {
            ReportError::InputReadFailed {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let value: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|e| ReportError::InvalidRecord {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    StructuredReport::from_value(value).map_err(|e| ReportError::InvalidRecord {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Write a rendered artifact (PDF or HTML) atomically.
pub async fn write_artifact(path: &Path, bytes: &[u8]) -> Result<(), ReportError> {
    write_atomic(path, bytes).await?;
    debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Write to `<path>.tmp`, then rename over `path`.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ReportError> {
    let write_err = |e| ReportError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp_path = PathBuf::from(tmp);

    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}
