//! Top-level entry points: text in, PDF report out.
//!
//! A run has two stages that meet at the persisted record:
//!
//! * [`generate_content`]: LLM call, sanitise, persist `content.json`
//! * [`render_document`]: load `content.json`, HTML, PDF, persist artifacts
//!
//! [`generate_report`] chains both inside one [`RequestWorkspace`] and is
//! what the HTTP handler and the CLI call. The stages are public on their
//! own so a record can be re-rendered without another model call.

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::output::{RenderedDocument, ReportOutput, ReportStats};
use crate::pipeline::llm::{self, ProviderGenerator, TextGenerator};
use crate::pipeline::store::{self, RequestWorkspace};
use crate::pipeline::{render, template};
use crate::progress::PipelineStage;
use crate::report::{ReportRequest, StructuredReport};
use edgequake_llm::ProviderFactory;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Generate content for `text` and render it to a PDF.
///
/// # Errors
/// * [`ReportError::EmptyInput`] for blank text
/// * a generation failure (see [`ReportError::is_generation_failure`])
/// * a rendering failure (see [`ReportError::is_render_failure`])
///
/// Nothing is retried. When `keep_artifacts` is off the request's isolated
/// workspace is removed whether the run succeeded or not.
pub async fn generate_report(
    text: impl AsRef<str>,
    config: &ReportConfig,
) -> Result<ReportOutput, ReportError> {
    let total_start = Instant::now();
    let request = ReportRequest::new(text.as_ref())?;
    let workspace = RequestWorkspace::for_config(config);
    info!(
        "Report request {} ({} chars): {}",
        workspace.id(),
        request.text.chars().count(),
        request.preview(60)
    );

    let result = run(&request, &workspace, config, total_start).await;

    if !config.keep_artifacts {
        workspace.remove().await;
    }
    result
}

async fn run(
    request: &ReportRequest,
    workspace: &RequestWorkspace,
    config: &ReportConfig,
    total_start: Instant,
) -> Result<ReportOutput, ReportError> {
    // ── Step 1: Content ──────────────────────────────────────────────────
    let gen_start = Instant::now();
    let report = generate_content(request, workspace, config).await?;
    let generation_ms = gen_start.elapsed().as_millis() as u64;

    // ── Step 2: Rendering ────────────────────────────────────────────────
    let render_start = Instant::now();
    let document = render_document(workspace, config).await?;
    let render_ms = render_start.elapsed().as_millis() as u64;

    // ── Step 3: Stats ────────────────────────────────────────────────────
    let stats = ReportStats {
        sections: report.sections.len(),
        tables: report.table_count(),
        page_count: document.page_count,
        pdf_bytes: document.pdf.len(),
        generation_ms,
        render_ms,
        total_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Report {} complete: {} sections, {} pages, {}ms total",
        workspace.id(),
        stats.sections,
        stats.page_count,
        stats.total_ms
    );

    Ok(ReportOutput {
        id: workspace.id(),
        report,
        html: document.html,
        pdf: document.pdf,
        record_path: workspace.record_path(),
        artifact_path: workspace.artifact_path(),
        stats,
    })
}

/// Content stage: ask the model for a report and persist it to the
/// workspace's record path, replacing any earlier record.
pub async fn generate_content(
    request: &ReportRequest,
    workspace: &RequestWorkspace,
    config: &ReportConfig,
) -> Result<StructuredReport, ReportError> {
    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_start(request.text.chars().count());
    }

    let result = async {
        let generator = resolve_generator(config)?;
        let report = llm::generate_structured(generator.as_ref(), request, config).await?;
        store::persist_report(workspace, &report).await?;
        Ok::<_, ReportError>(report)
    }
    .await;

    match (&result, &config.progress_callback) {
        (Ok(report), Some(cb)) => {
            cb.on_generation_complete(report.sections.len(), report.table_count())
        }
        (Err(e), Some(cb)) => cb.on_error(PipelineStage::Generation, &e.to_string()),
        _ => {}
    }
    if let Ok(ref report) = result {
        info!(
            "Generated '{}' by {}: {} sections, {} tables",
            report.meta.title,
            report.meta.author,
            report.sections.len(),
            report.table_count()
        );
    }
    result
}

/// Rendering stage: load the workspace's record and produce HTML and PDF.
///
/// Fails with [`ReportError::MissingInput`] before any rendering when no
/// record has been persisted. Both outputs are written next to the record.
pub async fn render_document(
    workspace: &RequestWorkspace,
    config: &ReportConfig,
) -> Result<RenderedDocument, ReportError> {
    if let Some(ref cb) = config.progress_callback {
        cb.on_render_start();
    }

    let result = async {
        let report = store::load_report(&workspace.record_path()).await?;
        let html = template::render_html(&report)?;
        let pdf = render::render_pdf(&report).await?;

        store::write_artifact(&workspace.html_path(), html.as_bytes()).await?;
        store::write_artifact(&workspace.artifact_path(), &pdf.bytes).await?;

        Ok::<_, ReportError>(RenderedDocument {
            html,
            pdf: pdf.bytes,
            page_count: pdf.page_count,
        })
    }
    .await;

    match (&result, &config.progress_callback) {
        (Ok(doc), Some(cb)) => cb.on_render_complete(doc.page_count, doc.pdf.len()),
        (Err(e), Some(cb)) => cb.on_error(PipelineStage::Rendering, &e.to_string()),
        _ => {}
    }
    if let Err(ref e) = result {
        warn!("Rendering failed for {}: {}", workspace.dir().display(), e);
    }
    result
}

/// Generate a report and write the PDF to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn generate_to_file(
    text: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ReportConfig,
) -> Result<ReportStats, ReportError> {
    let output = generate_report(text, config).await?;
    store::write_artifact(output_path.as_ref(), &output.pdf).await?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`generate_report`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    text: impl AsRef<str>,
    config: &ReportConfig,
) -> Result<ReportOutput, ReportError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ReportError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_report(text, config))
}

// ── Provider resolution ──────────────────────────────────────────────────

fn create_generator(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn TextGenerator>, ReportError> {
    let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ReportError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })?;
    Ok(Arc::new(ProviderGenerator::new(
        provider,
        format!("{provider_name}/{model}"),
    )))
}

/// Resolve the text generator, from most-specific to least-specific.
///
/// 1. **Pre-built generator** (`config.generator`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`, `config.model`).
///    The factory reads the matching API key from the environment.
/// 3. **Environment pair** (`PRODOC_LLM_PROVIDER` + `PRODOC_MODEL`), both set.
/// 4. **`OPENAI_API_KEY` present**: OpenAI with `config.model`, even when
///    other providers' keys are also set.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_generator(config: &ReportConfig) -> Result<Arc<dyn TextGenerator>, ReportError> {
    if let Some(ref generator) = config.generator {
        return Ok(Arc::clone(generator));
    }

    if let Some(ref name) = config.provider_name {
        return create_generator(name, &config.model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("PRODOC_LLM_PROVIDER"),
        std::env::var("PRODOC_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_generator(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_generator("openai", &config.model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ReportError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(Arc::new(ProviderGenerator::new(llm_provider, "auto")))
}
