use crate::domain::model::FetchOutcome;
use async_trait::async_trait;
use std::time::{Duration, Instant};

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Single GET, bounded by a timeout. Must not return an error or panic on network failure.
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

pub trait ConfigProvider: Send + Sync {
    fn request_timeout(&self) -> Duration;
    fn user_agent(&self) -> &str;
    fn max_redirects(&self) -> usize;
    fn rate_limit_window(&self) -> Duration;
    fn min_batch_targets(&self) -> usize;
    fn max_batch_targets(&self) -> usize;
    fn batch_pacing(&self) -> Duration;
    fn batch_concurrency(&self) -> usize;
}
