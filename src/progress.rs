//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn ReportProgressCallback>`] via
//! [`crate::config::ReportConfigBuilder::progress_callback`] to receive
//! events as a request moves through content generation and rendering.
//! The CLI uses this to drive its spinner; a server could forward events
//! to a log or a status endpoint.
//!
//! # Example
//!
//! ```rust
//! use prodoc::{ReportConfig, ReportProgressCallback};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl ReportProgressCallback for Printer {
//!     fn on_render_complete(&self, page_count: usize, pdf_bytes: usize) {
//!         eprintln!("{page_count} pages, {pdf_bytes} bytes");
//!     }
//! }
//!
//! let config = ReportConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// The two stages of a report run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// LLM call, sanitising, persisting the record.
    Generation,
    /// Template, layout, PDF bytes.
    Rendering,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Generation => f.write_str("generation"),
            PipelineStage::Rendering => f.write_str("rendering"),
        }
    }
}

/// Called by the pipeline at stage boundaries.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync`: the server
/// runs many requests at once and they may share one callback.
pub trait ReportProgressCallback: Send + Sync {
    /// Called just before the backend request is sent.
    ///
    /// # Arguments
    /// * `input_chars` — character count of the user text
    fn on_generation_start(&self, input_chars: usize) {
        let _ = input_chars;
    }

    /// Called once a structured report has been recovered and persisted.
    ///
    /// # Arguments
    /// * `sections` — number of sections in the report
    /// * `tables`   — how many of them carry a table
    fn on_generation_complete(&self, sections: usize, tables: usize) {
        let _ = (sections, tables);
    }

    /// Called before the record is loaded for rendering.
    fn on_render_start(&self) {}

    /// Called when the PDF has been produced.
    fn on_render_complete(&self, page_count: usize, pdf_bytes: usize) {
        let _ = (page_count, pdf_bytes);
    }

    /// Called when a stage fails. The run stops after this.
    fn on_error(&self, stage: PipelineStage, error: &str) {
        let _ = (stage, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ReportProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReportConfig`].
pub type ProgressCallback = Arc<dyn ReportProgressCallback>;
