use crate::error::{DalleError, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/images";
pub const DEFAULT_USER_AGENT: &str = concat!("rdalle/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CONCURRENCY: usize = 4;

pub const API_KEY_VAR: &str = "DALLE_API_KEY";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub concurrency: usize,
    pub output_root: PathBuf,
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
            output_root: PathBuf::from("."),
            show_progress: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `DALLE_*` variables, falling back to defaults for anything unset.
    /// A missing API key is not an error here; see [`Config::api_key`].
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        config.api_key = env::var(API_KEY_VAR).ok().filter(|key| !key.is_empty());

        if let Ok(base_url) = env::var("DALLE_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(secs) = parse_var::<u64>("DALLE_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(concurrency) = parse_var::<usize>("DALLE_CONCURRENCY")? {
            config = config.with_concurrency(concurrency);
        }
        if let Ok(root) = env::var("DALLE_OUTPUT_DIR") {
            config.output_root = PathBuf::from(root);
        }

        Ok(config)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    pub fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            DalleError::ConfigError(format!("{} env variable is not set", API_KEY_VAR))
        })
    }
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| DalleError::ConfigError(format!("{} has an invalid value: {}", name, raw))),
        Err(_) => Ok(None),
    }
}
