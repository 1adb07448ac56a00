//! Configuration types for report generation.
//!
//! All pipeline behaviour is controlled through [`ReportConfig`], built via
//! its [`ReportConfigBuilder`]. HTTP-only settings (bind address, frontend
//! directory) live separately in [`ServerConfig`] so the library can be
//! used without ever starting a server.

use crate::error::ReportError;
use crate::pipeline::llm::TextGenerator;
use crate::progress::ProgressCallback;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Configuration for a report generation run.
///
/// # Example
/// ```rust
/// use prodoc::ReportConfig;
///
/// let config = ReportConfig::builder()
///     .model("gpt-4.1-mini")
///     .max_tokens(3000)
///     .output_dir("reports")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ReportConfig {
    /// LLM model identifier. Default: `gpt-4.1-nano`.
    pub model: String,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `generator`, the provider is resolved from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed text generator. Takes precedence over `provider_name`.
    pub generator: Option<Arc<dyn TextGenerator>>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Near-deterministic output keeps the model on the schema; higher values
    /// make it more likely to drift into prose around the JSON.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 2500.
    ///
    /// A report with several tables runs to roughly 1 500 tokens of JSON.
    /// Truncated output is unclosed JSON, which the sanitizer cannot recover.
    pub max_tokens: usize,

    /// Custom system instruction. If None, uses [`crate::prompts::REPORT_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Root directory for persisted records and artifacts. Default: `output`.
    pub output_dir: PathBuf,

    /// Give every request its own `output_dir/<uuid>/` workspace. Default: true.
    ///
    /// When false, every request reads and writes the same
    /// `output_dir/content.json` and `output_dir/strategic_report.pdf`, and
    /// concurrent requests can overwrite each other's files.
    pub isolate_requests: bool,

    /// Keep the record and artifact files after a run. Default: true.
    ///
    /// Only isolated workspaces are ever removed.
    pub keep_artifacts: bool,

    /// Receives stage events as the pipeline runs. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            provider_name: None,
            generator: None,
            temperature: 0.1,
            max_tokens: 2500,
            system_prompt: None,
            output_dir: PathBuf::from("output"),
            isolate_requests: true,
            keep_artifacts: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ReportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("generator", &self.generator.as_ref().map(|g| g.name().to_string()))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field("output_dir", &self.output_dir)
            .field("isolate_requests", &self.isolate_requests)
            .field("keep_artifacts", &self.keep_artifacts)
            .finish()
    }
}

impl ReportConfig {
    /// Create a new builder for `ReportConfig`.
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ReportConfig`].
#[derive(Debug)]
pub struct ReportConfigBuilder {
    config: ReportConfig,
}

impl ReportConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.config.generator = Some(generator);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn isolate_requests(mut self, v: bool) -> Self {
        self.config.isolate_requests = v;
        self
    }

    pub fn keep_artifacts(mut self, v: bool) -> Self {
        self.config.keep_artifacts = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReportConfig, ReportError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(ReportError::InvalidConfig("model must not be empty".into()));
        }
        if c.max_tokens == 0 {
            return Err(ReportError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.output_dir.as_os_str().is_empty() {
            return Err(ReportError::InvalidConfig(
                "output_dir must not be empty".into(),
            ));
        }
        if let Some(ref prompt) = c.system_prompt {
            if prompt.trim().is_empty() {
                return Err(ReportError::InvalidConfig(
                    "system_prompt override must not be empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

// ── Server ───────────────────────────────────────────────────────────────

/// Settings for the HTTP front end.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on. Default: `0.0.0.0:8000`.
    pub bind_addr: SocketAddr,
    /// Directory holding the pre-built frontend. Default: `client/build`.
    pub static_dir: PathBuf,
    /// Entry point served for any path that is not a file. Default: `index.html`.
    pub index_file: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            static_dir: PathBuf::from("client/build"),
            index_file: "index.html".to_string(),
        }
    }
}

impl ServerConfig {
    /// Full path of the fallback entry point.
    pub fn index_path(&self) -> PathBuf {
        self.static_dir.join(&self.index_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_backend_call_settings() {
        let c = ReportConfig::default();
        assert_eq!(c.max_tokens, 2500);
        assert!((c.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(c.output_dir, PathBuf::from("output"));
        assert!(c.isolate_requests);
    }

    #[test]
    fn temperature_is_clamped() {
        let c = ReportConfig::builder().temperature(7.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
        let c = ReportConfig::builder().temperature(-1.0).build().unwrap();
        assert_eq!(c.temperature, 0.0);
    }

    #[test]
    fn build_rejects_invalid_values() {
        assert!(ReportConfig::builder().model("  ").build().is_err());
        assert!(ReportConfig::builder().max_tokens(0).build().is_err());
        assert!(ReportConfig::builder().output_dir("").build().is_err());
        assert!(ReportConfig::builder().system_prompt("").build().is_err());
    }

    #[test]
    fn debug_does_not_dump_prompt() {
        let c = ReportConfig::builder()
            .system_prompt("secret policy text")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("secret policy text"));
    }

    #[test]
    fn server_index_path() {
        let s = ServerConfig::default();
        assert_eq!(s.index_path(), PathBuf::from("client/build/index.html"));
        assert_eq!(s.bind_addr.port(), 8000);
    }
}
