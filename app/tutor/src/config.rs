//! Tutor configuration loaded from `haka.toml`.
//!
//! Resolves the config file in priority order:
//! 1. `--config <path>` flag
//! 2. `{cwd}/.haka/haka.toml` (workspace config)
//! 3. `<config_dir>/haka/haka.toml` (global default, generated on first run)
//!
//! `${VAR}` references are expanded before parsing, then a few well-known
//! environment variables override the parsed values.

use crate::{persona::Personas, utils};
use anyhow::{Context, Result};
use compact_str::CompactString;
use ollama::LocalTuning;
use router::{NetworkConfig, PolicyConfig, RouterConfig};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Config directory name under the platform config dir.
pub const CONFIG_DIR: &str = "haka";

/// Config file name.
pub const CONFIG_FILE: &str = "haka.toml";

/// Config template written when no config exists.
pub const DEFAULT_CONFIG: &str = r#"[remote]
provider = "openai"
model = "gpt-3.5-turbo"
api_key = "${OPENAI_API_KEY}"

[local]
host = "127.0.0.1"
port = 11434
model = "llama3.1"

[network]
timeout_secs = 10
cache_interval_secs = 30

[policy]
threshold_mbps = 130.0

[router]
health_check_interval_secs = 30
generation_timeout_secs = 60
force_probe_each_turn = true

[content]
url = "http://localhost:8000/mcp"

[search]
api_key = "${TAVILY_API_KEY}"

[safety]
enabled = false
"#;

/// Top-level tutor configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorConfig {
    pub remote: RemoteConfig,
    pub local: LocalConfig,
    pub network: NetworkConfig,
    pub policy: PolicyConfig,
    pub router: RouterConfig,
    pub content: ContentConfig,
    pub search: SearchConfig,
    pub safety: SafetyConfig,
    pub personas: Personas,
}

/// Hosted backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub provider: RemoteKind,
    pub model: CompactString,
    /// API key; an empty key disables the remote backend.
    pub api_key: String,
    /// Endpoint override, required for `custom`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            provider: RemoteKind::OpenAI,
            model: openai::DEFAULT_MODEL.into(),
            api_key: String::new(),
            base_url: None,
        }
    }
}

/// Supported hosted providers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteKind {
    #[default]
    #[serde(rename = "openai")]
    OpenAI,
    Gemini,
    /// Any OpenAI-compatible endpoint given in `base_url`.
    Custom,
}

/// Ollama backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    pub host: String,
    pub port: u16,
    pub model: CompactString,
    pub tuning: LocalTuning,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: ollama::DEFAULT_PORT,
            model: ollama::DEFAULT_MODEL.into(),
            tuning: LocalTuning::default(),
        }
    }
}

/// Course content MCP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Connect and register the content tools.
    pub enabled: bool,
    /// Streamable-HTTP MCP endpoint.
    pub url: String,
    /// Timeout for the handshake and each tool call, in seconds.
    pub timeout_secs: u64,
    /// Connection attempts before giving up.
    pub attempts: u32,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "http://localhost:8000/mcp".to_owned(),
            timeout_secs: 10,
            attempts: 3,
        }
    }
}

impl ContentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Tavily web search MCP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Tavily API key; an empty key disables web search.
    pub api_key: String,
    /// Streamable-HTTP MCP endpoint, without the key.
    pub url: String,
    /// Timeout for the handshake and each tool call, in seconds.
    pub timeout_secs: u64,
    /// Connection attempts before giving up.
    pub attempts: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            url: "https://mcp.tavily.com/mcp/".to_owned(),
            timeout_secs: 10,
            attempts: 3,
        }
    }
}

impl SearchConfig {
    pub fn enabled(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// The endpoint with the API key attached.
    pub fn endpoint(&self) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{separator}tavilyApiKey={}", self.url, self.api_key.trim())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Reply screening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    pub enabled: bool,
    /// Instructions for the screening persona.
    pub instructions: String,
    /// Shown instead of a reply that fails screening.
    pub replacement: String,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            instructions: "You review a tutor's reply to a student for safety and \
                educational appropriateness. Answer with JSON only: \
                {\"status\": \"safe\"}, {\"status\": \"warning\"} or {\"status\": \"blocked\"}."
                .to_owned(),
            replacement: "I can't share that response. Let's get back to the lesson; \
                what would you like to work on?"
                .to_owned(),
        }
    }
}

impl TutorConfig {
    /// Parse TOML after expanding `${VAR}` references.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let expanded = utils::expand_env_vars(toml_str);
        Ok(toml::from_str(&expanded)?)
    }

    /// Load from a file and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let mut config =
            Self::from_toml(&content).with_context(|| format!("parsing {}", path.display()))?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply environment overrides found through `lookup`.
    ///
    /// Recognizes `OPENAI_API_KEY`, `DEGRADE_THRESHOLD_MBPS`, `OLLAMA_HOST`,
    /// `OLLAMA_PORT`, `LOCAL_MCP_SERVER_URL` and `TAVILY_API_KEY`. Empty
    /// values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(key) = var("OPENAI_API_KEY") {
            self.remote.api_key = key;
        }
        if let Some(threshold) = var("DEGRADE_THRESHOLD_MBPS") {
            self.policy.threshold_mbps = threshold
                .trim()
                .parse()
                .with_context(|| format!("DEGRADE_THRESHOLD_MBPS '{threshold}' is not a number"))?;
        }
        if let Some(host) = var("OLLAMA_HOST") {
            self.local.host = host;
        }
        if let Some(port) = var("OLLAMA_PORT") {
            self.local.port = port
                .trim()
                .parse()
                .with_context(|| format!("OLLAMA_PORT '{port}' is not a port"))?;
        }
        if let Some(url) = var("LOCAL_MCP_SERVER_URL") {
            self.content.url = url;
        }
        if let Some(key) = var("TAVILY_API_KEY") {
            self.search.api_key = key;
        }
        Ok(())
    }

    /// Whether a remote backend is configured.
    pub fn has_remote(&self) -> bool {
        !self.remote.api_key.trim().is_empty()
    }
}

/// Resolve the config following the priority chain.
pub fn resolve_config(config_flag: Option<&Path>) -> Result<TutorConfig> {
    if let Some(path) = config_flag {
        return TutorConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()));
    }

    let path = resolve_config_path();
    if !path.exists() {
        generate_default_config(&path)?;
        tracing::info!("generated default config at {}", path.display());
    }
    TutorConfig::load(&path)
}

/// The config file that would be used without `--config`.
pub fn resolve_config_path() -> PathBuf {
    let workspace = workspace_config_path();
    if workspace.exists() {
        return workspace;
    }
    global_config_path()
}

fn workspace_config_path() -> PathBuf {
    PathBuf::from(".haka").join(CONFIG_FILE)
}

/// Path to the global config.
pub fn global_config_path() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

/// Write the default config template to `path`.
pub fn generate_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    std::fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config to {}", path.display()))?;
    Ok(())
}
