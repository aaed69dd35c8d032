pub mod batch;
pub mod fetcher;
pub mod inspector;
pub mod probes;
pub mod rate_limiter;
pub mod render;
pub mod service;

pub use crate::domain::model::{
    FetchOutcome, FetchedPage, ProbeResult, ProbeValue, Report, Target,
};
pub use crate::domain::ports::{Clock, ConfigProvider, Fetcher, SystemClock};
pub use crate::utils::error::Result;
