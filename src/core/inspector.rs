use crate::core::probes::{Probe, ProbeSet};
use crate::core::{FetchOutcome, Fetcher, ProbeResult, ProbeValue, Report, Target};
use crate::utils::error::Result;
use chrono::Utc;
use futures::future::join_all;

/// 對單一目標跑完整組探針
pub struct Inspector<F: Fetcher> {
    fetcher: F,
    probes: ProbeSet,
}

impl<F: Fetcher> Inspector<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_probes(fetcher, ProbeSet::standard())
    }

    pub fn with_probes(fetcher: F, probes: ProbeSet) -> Self {
        Self { fetcher, probes }
    }

    pub fn probes(&self) -> &ProbeSet {
        &self.probes
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetches `target` once and runs every probe over the result.
    ///
    /// Never fails: a probe that cannot finish contributes its fallback
    /// value, so the report always has one entry per probe, in probe-set order.
    pub async fn inspect(&self, target: &Target) -> Report {
        tracing::info!("🔍 Inspecting {}", target);

        let primary = self.fetcher.fetch(target.as_str()).await;
        if let FetchOutcome::Failure { reason } = &primary {
            tracing::warn!("⚠️ Primary fetch of {} failed: {}", target, reason);
        }

        let primary = &primary;
        let fetcher = &self.fetcher;
        let runs = self.probes.iter().map(|probe| async move {
            let outcome = probe.run(target, primary, fetcher).await;
            (probe, outcome)
        });

        // join_all 保留輸入順序，報告順序因此固定
        let results: Vec<ProbeResult> = join_all(runs)
            .await
            .into_iter()
            .map(|(probe, outcome)| merge(probe, outcome))
            .collect();

        let degraded = results.iter().filter(|r| r.is_degraded()).count();
        tracing::info!(
            "✅ Inspected {} ({} probes, {} degraded)",
            target,
            results.len(),
            degraded
        );

        Report {
            target: target.clone(),
            results,
            inspected_at: Utc::now(),
        }
    }
}

fn merge(probe: &Probe, outcome: Result<ProbeValue>) -> ProbeResult {
    match outcome {
        Ok(value) => {
            tracing::debug!("probe {} -> {}", probe.name, value);
            ProbeResult {
                name: probe.name.to_string(),
                value,
                error: None,
            }
        }
        Err(e) => {
            tracing::debug!("probe {} degraded: {}", probe.name, e);
            ProbeResult {
                name: probe.name.to_string(),
                value: probe.fallback_value(),
                error: Some(e.to_string()),
            }
        }
    }
}
