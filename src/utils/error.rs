use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    /// DNS、TLS、逾時、連線被拒都歸為同一類
    #[error("Network error for {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    ValidationError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Caller {caller} is rate limited, retry in {retry_after:?}")]
    RateLimited {
        caller: String,
        retry_after: Duration,
    },

    #[error("Primary fetch failed: {reason}")]
    PrimaryUnavailable { reason: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV output error: {0}")]
    CsvError(#[from] csv::Error),
}

impl ProbeError {
    pub fn validation(field: &str, value: &str, reason: impl Into<String>) -> Self {
        ProbeError::ValidationError {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// 給操作者看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            ProbeError::Network { url, .. } => format!("Could not reach {}", url),
            ProbeError::ValidationError { field, reason, .. } => {
                format!("Invalid {}: {}", field, reason)
            }
            ProbeError::RateLimited { retry_after, .. } => format!(
                "Please wait {} second(s) before making another request",
                retry_after.as_secs().max(1)
            ),
            ProbeError::PrimaryUnavailable { .. } => {
                "The target page could not be fetched".to_string()
            }
            ProbeError::ConfigError { message } => format!("Configuration problem: {}", message),
            ProbeError::IoError(e) => format!("File system error: {}", e),
            ProbeError::SerializationError(_) | ProbeError::CsvError(_) => {
                "Failed to render the report".to_string()
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ProbeError::Network { .. } | ProbeError::PrimaryUnavailable { .. } => {
                "Check that the site is online and reachable from this host"
            }
            ProbeError::ValidationError { .. } => {
                "Use an absolute http(s) URL, and keep batch files within the allowed size"
            }
            ProbeError::RateLimited { .. } => "Wait for the rate-limit window to pass and retry",
            ProbeError::ConfigError { .. } => "Review the TOML configuration file",
            ProbeError::IoError(_) => "Make sure the file exists and is readable",
            ProbeError::SerializationError(_) | ProbeError::CsvError(_) => {
                "Try a different --format"
            }
        }
    }

    /// 驗證與限流錯誤必須在任何請求之前回報
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ProbeError::ValidationError { .. } | ProbeError::RateLimited { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ProbeError>;
