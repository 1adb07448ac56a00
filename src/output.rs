//! Output types returned by the report pipeline.

use crate::report::StructuredReport;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Result of a full generate-and-render run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOutput {
    /// Request identifier; also the workspace directory name when requests
    /// are isolated.
    pub id: Uuid,

    /// The structured report the document was rendered from.
    pub report: StructuredReport,

    /// Rendered HTML document.
    pub html: String,

    /// PDF bytes. Not serialised; write them out with
    /// [`crate::generate_to_file`] or read [`Self::artifact_path`].
    #[serde(skip)]
    pub pdf: Vec<u8>,

    /// Where the structured record was persisted.
    pub record_path: PathBuf,

    /// Where the PDF artifact was persisted. May no longer exist when
    /// `keep_artifacts` is off.
    pub artifact_path: PathBuf,

    /// Run statistics.
    pub stats: ReportStats,
}

/// A rendered document: the output of the rendering stage alone.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub html: String,
    pub pdf: Vec<u8>,
    pub page_count: usize,
}

/// Statistics for one report run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportStats {
    /// Number of sections in the report.
    pub sections: usize,
    /// Sections that carry a table.
    pub tables: usize,
    /// Pages in the PDF, cover included.
    pub page_count: usize,
    /// PDF size in bytes.
    pub pdf_bytes: usize,
    /// Time spent in the content stage (ms).
    pub generation_ms: u64,
    /// Time spent in the rendering stage (ms).
    pub render_ms: u64,
    /// Wall-clock time for the whole run (ms).
    pub total_ms: u64,
}
