use crate::sql::SqlDialect;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_MODEL: &str = "llama3.2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Model server settings
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    /// `None` waits forever
    pub timeout: Option<Duration>,
}

impl OllamaConfig {
    pub fn new(base_url: String, model: String, timeout_secs: u64) -> Self {
        Self {
            base_url: normalize_ollama_host(&base_url),
            model,
            timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        }
    }
}

/// Accept Ollama's own `OLLAMA_HOST` form (`host:port`) as well as full URLs
pub fn normalize_ollama_host(raw: &str) -> String {
    let host = raw.trim().trim_end_matches('/');
    if host.is_empty() {
        DEFAULT_OLLAMA_URL.to_string()
    } else if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_OLLAMA_URL.to_string(),
            DEFAULT_MODEL.to_string(),
            DEFAULT_TIMEOUT_SECS,
        )
    }
}

/// Hosted backend credentials; any part may be missing until deploy time
#[derive(Debug, Clone, Default)]
pub struct SupabaseConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    /// Access token of an already signed-in session
    pub access_token: Option<String>,
}

/// Where generated migrations get applied
#[derive(Debug, Clone)]
pub enum DeployTarget {
    Sqlite(PathBuf),
    Supabase(SupabaseConfig),
}

impl DeployTarget {
    pub fn dialect(&self) -> SqlDialect {
        match self {
            DeployTarget::Sqlite(_) => SqlDialect::Sqlite,
            DeployTarget::Supabase(_) => SqlDialect::Postgres,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            DeployTarget::Sqlite(path) => format!("sqlite:{}", path.display()),
            DeployTarget::Supabase(cfg) => {
                format!("supabase:{}", cfg.url.as_deref().unwrap_or("<unset>"))
            }
        }
    }
}

/// Resolved application settings
#[derive(Debug, Clone)]
pub struct Config {
    pub ollama: OllamaConfig,
    pub deploy: Option<DeployTarget>,
    pub dialect: SqlDialect,
    pub out_dir: PathBuf,
}

impl Config {
    /// Build a config, deriving the dialect from the deploy target unless forced
    pub fn new(
        ollama: OllamaConfig,
        deploy: Option<DeployTarget>,
        dialect: Option<SqlDialect>,
        out_dir: PathBuf,
    ) -> Self {
        let dialect = dialect
            .or_else(|| deploy.as_ref().map(DeployTarget::dialect))
            .unwrap_or_default();
        Self {
            ollama,
            deploy,
            dialect,
            out_dir,
        }
    }
}
