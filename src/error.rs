//! Error types for the prodoc library.
//!
//! Every failure in the pipeline is terminal for the request that hit it:
//! nothing is retried or queued, and no partial artifact is handed back.
//! [`ReportError`] therefore carries enough context for two consumers:
//!
//! * the HTTP layer, which only needs to know *which stage* failed
//!   ([`ReportError::is_generation_failure`] / [`ReportError::is_render_failure`])
//!   to choose a detail message, and
//! * the operator reading logs or CLI output, who needs the path, provider
//!   or parse reason that explains the failure.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the prodoc library.
#[derive(Debug, Error)]
pub enum ReportError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The report request text was empty or whitespace only.
    #[error("Report request text is empty.\nProvide a topic or some notes to turn into a report.")]
    EmptyInput,

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The text-generation call itself failed (network, auth, quota).
    #[error("LLM backend error: {message}")]
    BackendError { message: String },

    /// The backend replied, but no structured report could be recovered
    /// from the reply. The raw reply is logged, not embedded here.
    #[error("Could not extract a structured report from the model reply ({raw_len} bytes): {reason}")]
    GenerationParse { reason: String, raw_len: usize },

    // ── Rendering errors ──────────────────────────────────────────────────
    /// Rendering was attempted but no persisted structured record exists.
    #[error("No structured report found at '{path}'\nRun the content stage first.")]
    MissingInput { path: PathBuf },

    /// The persisted record exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted record exists but does not hold a valid report.
    #[error("Structured report at '{path}' is invalid: {detail}")]
    InvalidRecord { path: PathBuf, detail: String },

    /// HTML template substitution failed.
    #[error("Template rendering failed: {detail}")]
    TemplateFailed { detail: String },

    /// The PDF engine failed to lay out or serialise the document.
    #[error("PDF rendering failed: {detail}")]
    RenderFailed { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write a record/artifact file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReportError {
    /// True when the content stage failed: the backend call, provider
    /// setup, or recovery of structured data from the reply.
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            ReportError::ProviderNotConfigured { .. }
                | ReportError::BackendError { .. }
                | ReportError::GenerationParse { .. }
        )
    }

    /// True when the rendering stage failed after content was produced.
    pub fn is_render_failure(&self) -> bool {
        matches!(
            self,
            ReportError::MissingInput { .. }
                | ReportError::InputReadFailed { .. }
                | ReportError::InvalidRecord { .. }
                | ReportError::TemplateFailed { .. }
                | ReportError::RenderFailed { .. }
                | ReportError::OutputWriteFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_parse_display() {
        let e = ReportError::GenerationParse {
            reason: "no JSON object found".into(),
            raw_len: 42,
        };
        let msg = e.to_string();
        assert!(msg.contains("42 bytes"), "got: {msg}");
        assert!(msg.contains("no JSON object found"));
    }

    #[test]
    fn missing_input_display() {
        let e = ReportError::MissingInput {
            path: PathBuf::from("output/content.json"),
        };
        assert!(e.to_string().contains("output/content.json"));
    }

    #[test]
    fn stage_classification_is_disjoint() {
        let generation = [
            ReportError::BackendError {
                message: "429".into(),
            },
            ReportError::GenerationParse {
                reason: "x".into(),
                raw_len: 0,
            },
            ReportError::ProviderNotConfigured {
                provider: "openai".into(),
                hint: "set OPENAI_API_KEY".into(),
            },
        ];
        for e in &generation {
            assert!(e.is_generation_failure(), "{e}");
            assert!(!e.is_render_failure(), "{e}");
        }

        let render = [
            ReportError::MissingInput {
                path: PathBuf::from("a"),
            },
            ReportError::RenderFailed {
                detail: "font".into(),
            },
            ReportError::TemplateFailed {
                detail: "syntax".into(),
            },
        ];
        for e in &render {
            assert!(e.is_render_failure(), "{e}");
            assert!(!e.is_generation_failure(), "{e}");
        }

        assert!(!ReportError::EmptyInput.is_generation_failure());
        assert!(!ReportError::EmptyInput.is_render_failure());
    }
}
