//! # prodoc
//!
//! Turn free-form notes or a topic into a formatted PDF business report,
//! using an LLM to write and structure the content.
//!
//! ## Pipeline Overview
//!
//! ```text
//! text
//!  │
//!  ├─ 1. LLM       one completion with the report policy as system prompt
//!  ├─ 2. Sanitize  recover JSON from fences / prose / literal syntax
//!  ├─ 3. Store     persist content.json in the request workspace
//!  ├─ 4. Template  Tera → report.html
//!  └─ 5. Render    A4 layout → strategic_report.pdf (spawn_blocking)
//! ```
//!
//! Steps 1–3 are the content stage ([`generate_content`]), steps 3–5 the
//! rendering stage ([`render_document`]). [`generate_report`] runs both; the
//! [`server`] module exposes it as `POST /generate`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prodoc::{generate_report, ReportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = ReportConfig::default();
//!     let output = generate_report("Q3 notes: costs 50000, revenue 120000", &config).await?;
//!     std::fs::write("report.pdf", &output.pdf)?;
//!     eprintln!("{} pages", output.stats.page_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `prodoc` binary (clap + anyhow + dotenvy + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! prodoc = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod report;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ReportConfig, ReportConfigBuilder, ServerConfig};
pub use error::ReportError;
pub use generate::{
    generate_content, generate_report, generate_sync, generate_to_file, render_document,
    resolve_generator,
};
pub use output::{RenderedDocument, ReportOutput, ReportStats};
pub use pipeline::llm::{CompletionRequest, ProviderGenerator, TextGenerator};
pub use pipeline::sanitize::sanitize;
pub use pipeline::store::RequestWorkspace;
pub use progress::{
    NoopProgressCallback, PipelineStage, ProgressCallback, ReportProgressCallback,
};
pub use report::{ReportMeta, ReportRequest, Section, StructuredReport, Table};
pub use server::{router, serve};
