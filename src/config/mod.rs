// FormRelay - relays form submissions to a workflow engine and renders the result
// License: Apache-2.0

use crate::workflow::{self, CatalogError, WorkflowCatalog};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("home directory not found")]
    NoHomeDir,
    #[error("no upstream API key configured (set upstream.api_key or FORMRELAY_API_KEY)")]
    MissingApiKey,
    #[error("upstream api_base is not an http(s) URL: {0}")]
    InvalidApiBase(String),
    #[error("invalid workflow catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("failed to load workflow catalog file: {0}")]
    CatalogFile(String),
}

const ENV_PREFIX: &str = "FORMRELAY_";
const ENV_WORKFLOW_PREFIX: &str = "FORMRELAY_WORKFLOW_";

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub workflows: WorkflowsConfig,
}

// ---------------------------------------------------------------------------
// Upstream
// ---------------------------------------------------------------------------

#[derive(Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Bearer credential for the workflow engine. Never has a default.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Overall request timeout; unset means the HTTP client's default.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_api_base(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: None,
        }
    }
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("api_base", &self.api_base)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn default_api_base() -> String {
    "https://aitutor-api.vercel.app/api/v1/run".to_string()
}
fn default_connect_timeout_secs() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors: true,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Workflows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowsConfig {
    /// Reject submissions missing required fields instead of forwarding them.
    #[serde(default = "default_true")]
    pub enforce_required_fields: bool,
    /// YAML catalog replacing the built-in workflows.
    #[serde(default)]
    pub catalog_file: Option<String>,
    /// Workflow id -> upstream endpoint id overrides.
    #[serde(default)]
    pub endpoints: BTreeMap<String, String>,
}

impl Default for WorkflowsConfig {
    fn default() -> Self {
        Self {
            enforce_required_fields: true,
            catalog_file: None,
            endpoints: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a JSON file, falling back to defaults, then
    /// apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            serde_json::from_str(&contents)?
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Config::default()
        };
        config.apply_env_overrides(std::env::vars());
        Ok(config)
    }

    /// Apply environment variable overrides (prefix: FORMRELAY_)
    pub fn apply_env_overrides(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "API_KEY" => self.upstream.api_key = value,
                "API_BASE" => self.upstream.api_base = value,
                "REQUEST_TIMEOUT_SECS" => {
                    if let Ok(n) = value.parse() {
                        self.upstream.request_timeout_secs = Some(n);
                    }
                }
                "SERVER_HOST" => self.server.host = value,
                "SERVER_PORT" => {
                    if let Ok(n) = value.parse() {
                        self.server.port = n;
                    }
                }
                "ENFORCE_REQUIRED_FIELDS" => {
                    self.workflows.enforce_required_fields = value.parse().unwrap_or(true);
                }
                "CATALOG_FILE" => self.workflows.catalog_file = Some(value),
                _ => {
                    if let Some(id) = key.strip_prefix(ENV_WORKFLOW_PREFIX) {
                        let id = id.to_lowercase().replace('_', "-");
                        self.workflows.endpoints.insert(id, value);
                    }
                }
            }
        }
    }

    /// Get the default config file path: ~/.formrelay/config.json
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".formrelay").join("config.json"))
    }

    /// Build the immutable workflow catalog: built-ins or the catalog file,
    /// with endpoint overrides applied.
    pub fn build_catalog(&self) -> Result<WorkflowCatalog, ConfigError> {
        let base = match &self.workflows.catalog_file {
            Some(file) => {
                let vars: HashMap<String, String> = std::env::vars().collect();
                workflow::parser::load_catalog(Path::new(file), &vars)
                    .map_err(|e| ConfigError::CatalogFile(format!("{}: {}", file, e)))?
            }
            None => workflow::builtin_workflows(),
        };
        Ok(WorkflowCatalog::with_overrides(base, &self.workflows.endpoints)?)
    }

    /// Validate configuration. Any error here is fatal at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        match url::Url::parse(&self.upstream.api_base) {
            Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {}
            _ => return Err(ConfigError::InvalidApiBase(self.upstream.api_base.clone())),
        }

        self.build_catalog()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
