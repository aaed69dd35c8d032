pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};
pub use config::TomlConfig;

pub use core::inspector::Inspector;
pub use core::probes::{Probe, ProbeSet};
pub use core::rate_limiter::RateLimiter;
pub use core::batch::{BatchPolicy, BatchRunner};
pub use core::fetcher::HttpFetcher;
pub use core::render::{OutputFormat, RenderMode};
pub use core::service::InspectionService;
pub use domain::model::{FetchOutcome, ProbeResult, ProbeValue, Report, Target};
pub use utils::error::{ProbeError, Result};
