use crate::core::batch::{DEFAULT_PACING, MAX_BATCH_TARGETS, MIN_BATCH_TARGETS};
use crate::core::fetcher::DEFAULT_USER_AGENT;
use crate::core::rate_limiter::DEFAULT_WINDOW;
use crate::core::render::OutputFormat;
use crate::core::ConfigProvider;
use crate::utils::error::{ProbeError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub fetcher: FetcherConfig,
    pub rate_limit: RateLimitConfig,
    pub batch: BatchConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub max_redirects: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_seconds: DEFAULT_WINDOW.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub min_targets: usize,
    pub max_targets: usize,
    pub pacing_millis: u64,
    pub max_concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            min_targets: MIN_BATCH_TARGETS,
            max_targets: MAX_BATCH_TARGETS,
            pacing_millis: DEFAULT_PACING.as_millis() as u64,
            max_concurrency: 1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ProbeError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${PROBE_USER_AGENT})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| ProbeError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_range("fetcher.timeout_seconds", self.fetcher.timeout_seconds, 1, 300)?;
        validate_non_empty_string("fetcher.user_agent", &self.fetcher.user_agent)?;
        validate_range("fetcher.max_redirects", self.fetcher.max_redirects, 0, 20)?;

        validate_positive_number("batch.min_targets", self.batch.min_targets, 1)?;
        validate_range(
            "batch.max_targets",
            self.batch.max_targets,
            self.batch.min_targets,
            usize::MAX,
        )?;
        validate_positive_number("batch.max_concurrency", self.batch.max_concurrency, 1)?;

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.fetcher.timeout_seconds)
    }

    fn user_agent(&self) -> &str {
        &self.fetcher.user_agent
    }

    fn max_redirects(&self) -> usize {
        self.fetcher.max_redirects
    }

    fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit.window_seconds)
    }

    fn min_batch_targets(&self) -> usize {
        self.batch.min_targets
    }

    fn max_batch_targets(&self) -> usize {
        self.batch.max_targets
    }

    fn batch_pacing(&self) -> Duration {
        Duration::from_millis(self.batch.pacing_millis)
    }

    fn batch_concurrency(&self) -> usize {
        self.batch.max_concurrency
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
