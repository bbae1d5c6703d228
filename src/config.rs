//! Configuration loading.
//!
//! Everything the research step needs is passed explicitly through
//! [`Config`]; nothing is looked up from ambient state at call time.
//! Secrets are never stored in the file, only the names of the environment
//! variables that hold them.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Research step settings.
    #[serde(default)]
    pub research: ResearchConfig,

    /// Model provider settings.
    #[serde(default)]
    pub models: ModelsConfig,

    /// Search provider settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Telemetry sink settings.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Settings for the query synthesizer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResearchConfig {
    /// Model identifier sent with every completion request.
    #[serde(default = "default_research_model")]
    pub model: String,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            model: default_research_model(),
        }
    }
}

/// Model provider configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelsConfig {
    /// OpenAI chat completions settings.
    #[serde(default)]
    pub openai: OpenAiConfig,
}

/// OpenAI provider settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    /// Environment variable name holding the API key.
    #[serde(default = "default_openai_key_env")]
    pub api_key_env: String,

    /// Full chat completions endpoint URL.
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_openai_timeout")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_openai_key_env(),
            base_url: default_openai_base_url(),
            timeout_secs: default_openai_timeout(),
        }
    }
}

/// Search provider configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchConfig {
    /// Bing Web Search settings.
    #[serde(default)]
    pub bing: BingConfig,
}

/// Bing Web Search settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BingConfig {
    /// Environment variable name holding the subscription key.
    #[serde(default = "default_bing_key_env")]
    pub api_key_env: String,

    /// Web search endpoint URL.
    #[serde(default = "default_bing_endpoint")]
    pub endpoint: String,

    /// Maximum number of results requested.
    #[serde(default = "default_bing_count")]
    pub count: u32,

    /// Optional market code (e.g. `en-US`).
    #[serde(default)]
    pub market: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_bing_timeout")]
    pub timeout_secs: u64,
}

impl Default for BingConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_bing_key_env(),
            endpoint: default_bing_endpoint(),
            count: default_bing_count(),
            market: None,
            timeout_secs: default_bing_timeout(),
        }
    }
}

/// Telemetry sink configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetryConfig {
    /// Append records as JSON lines to this file. Absent: records go to tracing.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// Default value functions for serde

fn default_research_model() -> String {
    "gpt-4o".to_owned()
}
fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".to_owned()
}
fn default_openai_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_owned()
}
fn default_openai_timeout() -> u64 {
    60
}
fn default_bing_key_env() -> String {
    "BING_SEARCH_API_KEY".to_owned()
}
fn default_bing_endpoint() -> String {
    "https://api.bing.microsoft.com/v7.0/search".to_owned()
}
fn default_bing_count() -> u32 {
    10
}
fn default_bing_timeout() -> u64 {
    30
}

/// Load the config from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config at {}: {e}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config at {}: {e}", path.display()))?;
    Ok(config)
}
