use crate::core::inspector::Inspector;
use crate::core::{Fetcher, Report, Target};
use crate::utils::error::Result;
use crate::utils::validation::{validate_positive_number, validate_range};
use futures::stream::{self, StreamExt};
use std::time::Duration;

pub const MIN_BATCH_TARGETS: usize = 50;
pub const MAX_BATCH_TARGETS: usize = 100;
pub const DEFAULT_PACING: Duration = Duration::from_secs(1);

/// How the runner spaces out inspections.
///
/// `max_concurrency == 1` runs targets one by one with `pacing` between
/// them. Larger values run up to that many inspections at once and skip
/// the pacing delay; reports still come back in input order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    pub pacing: Duration,
    pub max_concurrency: usize,
}

impl BatchPolicy {
    pub fn sequential(pacing: Duration) -> Self {
        Self {
            pacing,
            max_concurrency: 1,
        }
    }

    pub fn concurrent(max_concurrency: usize) -> Self {
        Self {
            pacing: Duration::ZERO,
            max_concurrency,
        }
    }
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self::sequential(DEFAULT_PACING)
    }
}

#[derive(Debug, Clone)]
pub struct BatchRunner {
    min_targets: usize,
    max_targets: usize,
    policy: BatchPolicy,
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self {
            min_targets: MIN_BATCH_TARGETS,
            max_targets: MAX_BATCH_TARGETS,
            policy: BatchPolicy::default(),
        }
    }
}

impl BatchRunner {
    pub fn new(min_targets: usize, max_targets: usize, policy: BatchPolicy) -> Result<Self> {
        validate_positive_number("batch.min_targets", min_targets, 1)?;
        validate_range("batch.max_targets", max_targets, min_targets, usize::MAX)?;
        validate_positive_number("batch.max_concurrency", policy.max_concurrency, 1)?;

        Ok(Self {
            min_targets,
            max_targets,
            policy,
        })
    }

    pub fn bounds(&self) -> (usize, usize) {
        (self.min_targets, self.max_targets)
    }

    /// 在任何請求之前檢查批次大小
    pub fn check_size(&self, count: usize) -> Result<()> {
        validate_range("targets", count, self.min_targets, self.max_targets)
    }

    /// Inspects every target and returns one report per target, in input order.
    pub async fn run<F: Fetcher>(
        &self,
        inspector: &Inspector<F>,
        targets: &[Target],
    ) -> Result<Vec<Report>> {
        self.check_size(targets.len())?;

        tracing::info!(
            "📦 Starting batch of {} targets (concurrency {}, pacing {:?})",
            targets.len(),
            self.policy.max_concurrency,
            self.policy.pacing
        );

        let reports = if self.policy.max_concurrency <= 1 {
            self.run_sequential(inspector, targets).await
        } else {
            stream::iter(targets)
                .map(|target| inspector.inspect(target))
                .buffered(self.policy.max_concurrency)
                .collect::<Vec<_>>()
                .await
        };

        let degraded = reports.iter().filter(|r| r.degraded_count() > 0).count();
        tracing::info!(
            "✅ Batch finished: {} reports, {} with degraded probes",
            reports.len(),
            degraded
        );

        Ok(reports)
    }

    async fn run_sequential<F: Fetcher>(
        &self,
        inspector: &Inspector<F>,
        targets: &[Target],
    ) -> Vec<Report> {
        let mut reports = Vec::with_capacity(targets.len());

        for (index, target) in targets.iter().enumerate() {
            if index > 0 && !self.policy.pacing.is_zero() {
                tokio::time::sleep(self.policy.pacing).await;
            }
            tracing::debug!("[{}/{}] {}", index + 1, targets.len(), target);
            reports.push(inspector.inspect(target).await);
        }

        reports
    }
}
