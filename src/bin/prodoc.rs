//! CLI binary for prodoc.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ReportConfig` / `ServerConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use prodoc::{
    generate_report, render_document, serve, PipelineStage, ProgressCallback, ReportConfig,
    ReportProgressCallback, RequestWorkspace, ServerConfig,
};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner that follows the two pipeline stages.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ReportProgressCallback for CliProgressCallback {
    fn on_generation_start(&self, input_chars: usize) {
        self.bar.set_prefix("Generating");
        self.bar
            .set_message(format!("asking the model ({input_chars} chars of input)…"));
    }

    fn on_generation_complete(&self, sections: usize, tables: usize) {
        self.bar.println(format!(
            "  {} Content  {}",
            green("✓"),
            dim(&format!("{sections} sections, {tables} tables"))
        ));
    }

    fn on_render_start(&self) {
        self.bar.set_prefix("Rendering");
        self.bar.set_message("laying out pages…");
    }

    fn on_render_complete(&self, page_count: usize, pdf_bytes: usize) {
        self.bar.println(format!(
            "  {} PDF      {}",
            green("✓"),
            dim(&format!("{page_count} pages, {pdf_bytes} bytes"))
        ));
        self.bar.finish_and_clear();
    }

    fn on_error(&self, stage: PipelineStage, error: &str) {
        let msg = if error.chars().count() > 100 {
            let cut: String = error.chars().take(99).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };
        self.bar
            .println(format!("  {} {}  {}", red("✗"), stage, red(&msg)));
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve the frontend and POST /generate on :8000
  prodoc serve

  # Report from a topic
  prodoc generate "Marketing plan for a running-shoe launch" -o plan.pdf

  # Report from notes in a file
  prodoc generate --file q3-notes.txt -o q3.pdf

  # Re-render an existing output/content.json without calling the model
  prodoc render --dir output

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY        OpenAI API key
  ANTHROPIC_API_KEY     Anthropic API key
  GEMINI_API_KEY        Google Gemini API key
  PRODOC_LLM_PROVIDER   Provider used with PRODOC_MODEL when --provider is unset
  PRODOC_MODEL          Model ID
  RUST_LOG              Overrides the log filter

A .env file in the working directory is loaded before flags are parsed.
"#;

/// Turn notes or a topic into a formatted PDF report using an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "prodoc",
    version,
    about = "Turn notes or a topic into a formatted PDF report using an LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server.
    Serve(ServeArgs),
    /// Generate a report from text and write the PDF.
    Generate(GenerateArgs),
    /// Render an existing content.json to PDF.
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(long, global = true, env = "PRODOC_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, global = true, env = "PRODOC_PROVIDER")]
    provider: Option<String>,

    /// Max LLM output tokens.
    #[arg(long, global = true, env = "PRODOC_MAX_TOKENS", default_value_t = 2500)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, global = true, env = "PRODOC_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, global = true, env = "PRODOC_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Directory for content.json and strategic_report.pdf.
    #[arg(long, global = true, env = "PRODOC_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Write every request into OUTPUT_DIR directly instead of OUTPUT_DIR/<id>/.
    #[arg(long, global = true, env = "PRODOC_SHARED_OUTPUT")]
    shared_output: bool,

    /// Delete per-request files once the PDF has been returned.
    #[arg(long, global = true, env = "PRODOC_DISCARD_ARTIFACTS")]
    discard_artifacts: bool,

    /// Disable the progress spinner.
    #[arg(long, global = true, env = "PRODOC_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PRODOC_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PRODOC_QUIET")]
    quiet: bool,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "PRODOC_BIND", default_value = "0.0.0.0:8000")]
    bind: SocketAddr,

    /// Directory holding the pre-built frontend.
    #[arg(long, env = "PRODOC_STATIC_DIR", default_value = "client/build")]
    static_dir: PathBuf,

    /// File served for paths that are not files.
    #[arg(long, env = "PRODOC_INDEX_FILE", default_value = "index.html")]
    index_file: String,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Topic or notes. Omit when using --file.
    #[arg(conflicts_with = "file", required_unless_present = "file")]
    text: Option<String>,

    /// Read the input text from this file.
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Write the PDF here.
    #[arg(short, long, default_value = "report.pdf")]
    output: PathBuf,

    /// Print the structured report and stats as JSON on stdout.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Directory containing content.json.
    #[arg(long, default_value = "output")]
    dir: PathBuf,

    /// Also copy the PDF here.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; a malformed one is worth a warning after
    // logging is up.
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    let common = &cli.common;

    // ── Logging setup ────────────────────────────────────────────────────
    let serving = matches!(cli.command, Command::Serve(_));
    let show_progress = !serving && !common.quiet && !common.no_progress;
    let filter = if common.verbose {
        "debug"
    } else if common.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = dotenv {
        if !e.not_found() {
            tracing::warn!("Ignoring .env: {}", e);
        }
    }

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ReportProgressCallback>)
    } else {
        None
    };
    let config = build_config(common, progress_cb).await?;

    match cli.command {
        Command::Serve(args) => {
            let server = ServerConfig {
                bind_addr: args.bind,
                static_dir: args.static_dir,
                index_file: args.index_file,
            };
            serve(config, server).await.context("Server failed")?;
        }

        Command::Generate(args) => {
            let text = match (args.text, args.file) {
                (Some(text), _) => text,
                (None, Some(path)) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read input from {}", path.display()))?,
                (None, None) => anyhow::bail!("Provide TEXT or --file"),
            };

            let output = generate_report(&text, &config)
                .await
                .context("Report generation failed")?;
            tokio::fs::write(&args.output, &output.pdf)
                .await
                .with_context(|| format!("Failed to write {}", args.output.display()))?;

            if args.json {
                let json = serde_json::to_string_pretty(&output)
                    .context("Failed to serialise output")?;
                println!("{json}");
            }
            if !common.quiet {
                eprintln!(
                    "{}  {}  {} pages  {}ms  →  {}",
                    green("✔"),
                    bold(&output.report.meta.title),
                    output.stats.page_count,
                    output.stats.total_ms,
                    bold(&args.output.display().to_string()),
                );
            }
        }

        Command::Render(args) => {
            let workspace = RequestWorkspace::shared(args.dir);
            let document = render_document(&workspace, &config)
                .await
                .context("Rendering failed")?;
            if let Some(ref path) = args.output {
                tokio::fs::write(path, &document.pdf)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
            if !common.quiet {
                let target = args
                    .output
                    .unwrap_or_else(|| workspace.artifact_path());
                eprintln!(
                    "{}  {} pages  →  {}",
                    green("✔"),
                    document.page_count,
                    bold(&target.display().to_string()),
                );
            }
        }
    }

    Ok(())
}

/// Map CLI args to `ReportConfig`.
async fn build_config(
    common: &CommonArgs,
    progress: Option<ProgressCallback>,
) -> Result<ReportConfig> {
    let mut builder = ReportConfig::builder()
        .max_tokens(common.max_tokens)
        .temperature(common.temperature)
        .output_dir(common.output_dir.clone())
        .isolate_requests(!common.shared_output)
        .keep_artifacts(!common.discard_artifacts);

    if let Some(ref model) = common.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = common.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref path) = common.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
