use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 要檢查的網址，除了去掉尾端斜線以外不做正規化
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target(String);

impl Target {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Appends `path` after stripping every trailing slash from the target.
    pub fn join_path(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.0.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status_code: u16,
    pub body: String,
    pub headers: Vec<(String, String)>,
}

/// One GET attempt. Network failures never escape as errors, they land here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Success(FetchedPage),
    Failure { reason: String },
}

impl FetchOutcome {
    pub fn page(&self) -> Option<&FetchedPage> {
        match self {
            FetchOutcome::Success(page) => Some(page),
            FetchOutcome::Failure { .. } => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        self.page().map(|page| page.status_code)
    }

    pub fn is_ok_status(&self) -> bool {
        self.status_code() == Some(200)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ProbeValue {
    Flag(bool),
    Label(String),
    Matches(Vec<String>),
    StatusCode(u16),
}

impl ProbeValue {
    pub fn label(value: &str) -> Self {
        ProbeValue::Label(value.to_string())
    }
}

impl fmt::Display for ProbeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeValue::Flag(flag) => write!(f, "{}", flag),
            ProbeValue::Label(label) => f.write_str(label),
            ProbeValue::Matches(matches) => f.write_str(&matches.join(", ")),
            ProbeValue::StatusCode(code) => write!(f, "{}", code),
        }
    }
}

/// Outcome of a single probe as stored in a [`Report`].
///
/// `value` always holds something renderable. When the probe could not
/// finish, `value` is the probe's default and `error` says why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub name: String,
    pub value: ProbeValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub target: Target,
    pub results: Vec<ProbeResult>,
    pub inspected_at: DateTime<Utc>,
}

impl Report {
    pub fn get(&self, name: &str) -> Option<&ProbeResult> {
        self.results.iter().find(|result| result.name == name)
    }

    pub fn value(&self, name: &str) -> Option<&ProbeValue> {
        self.get(name).map(|result| &result.value)
    }

    pub fn probe_names(&self) -> Vec<&str> {
        self.results.iter().map(|result| result.name.as_str()).collect()
    }

    pub fn degraded_count(&self) -> usize {
        self.results.iter().filter(|result| result.is_degraded()).count()
    }
}
