use crate::core::batch::{BatchPolicy, BatchRunner};
use crate::core::fetcher::HttpFetcher;
use crate::core::inspector::Inspector;
use crate::core::rate_limiter::RateLimiter;
use crate::core::{Clock, ConfigProvider, Fetcher, Report, SystemClock, Target};
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_url};

/// Entry point for front-ends. Built once per process and shared by every caller.
///
/// Both requests go through the same order of gates: input validation,
/// then caller cooldown, then inspection. Invalid input never touches the
/// caller's cooldown, and a rejected request does no network I/O.
pub struct InspectionService<F: Fetcher, C: Clock = SystemClock> {
    limiter: RateLimiter<C>,
    inspector: Inspector<F>,
    batch: BatchRunner,
}

impl InspectionService<HttpFetcher, SystemClock> {
    pub fn from_config<P: ConfigProvider + ?Sized>(config: &P) -> Result<Self> {
        let fetcher = HttpFetcher::from_config(config)?;
        let batch = BatchRunner::new(
            config.min_batch_targets(),
            config.max_batch_targets(),
            BatchPolicy {
                pacing: config.batch_pacing(),
                max_concurrency: config.batch_concurrency(),
            },
        )?;

        Ok(Self::new(
            RateLimiter::new(config.rate_limit_window()),
            Inspector::new(fetcher),
            batch,
        ))
    }
}

impl<F: Fetcher, C: Clock> InspectionService<F, C> {
    pub fn new(limiter: RateLimiter<C>, inspector: Inspector<F>, batch: BatchRunner) -> Self {
        Self {
            limiter,
            inspector,
            batch,
        }
    }

    pub fn inspector(&self) -> &Inspector<F> {
        &self.inspector
    }

    pub async fn request_single_inspection(&self, caller: &str, url: &str) -> Result<Report> {
        validate_non_empty_string("caller", caller)?;
        let url = url.trim();
        validate_url("target", url)?;
        self.limiter.check(caller)?;

        Ok(self.inspector.inspect(&Target::new(url)).await)
    }

    /// The whole batch counts as one request against the caller's cooldown.
    pub async fn request_batch_inspection(
        &self,
        caller: &str,
        urls: &[String],
    ) -> Result<Vec<Report>> {
        validate_non_empty_string("caller", caller)?;
        self.batch.check_size(urls.len())?;
        self.limiter.check(caller)?;

        let targets: Vec<Target> = urls.iter().map(|url| Target::new(url.trim())).collect();
        self.batch.run(&self.inspector, &targets).await
    }
}

/// 讀取目標清單：一行一個網址，略過空行與 `#` 註解
pub fn load_targets(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FetchOutcome, FetchedPage};
    use crate::utils::error::ProbeError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct EchoFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetcher for EchoFetcher {
        async fn fetch(&self, url: &str) -> FetchOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            FetchOutcome::Success(FetchedPage {
                status_code: 200,
                body: url.to_string(),
                headers: vec![],
            })
        }
    }

    fn service() -> InspectionService<EchoFetcher> {
        InspectionService::new(
            RateLimiter::new(Duration::from_secs(5)),
            Inspector::new(EchoFetcher {
                calls: AtomicUsize::new(0),
            }),
            BatchRunner::new(2, 3, BatchPolicy::sequential(Duration::ZERO)).unwrap(),
        )
    }

    fn calls(service: &InspectionService<EchoFetcher>) -> usize {
        service.inspector().fetcher().calls.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_single_inspection_then_rate_limited() {
        let service = service();

        let report = service
            .request_single_inspection("user-1", "https://a.example/")
            .await
            .unwrap();
        assert_eq!(report.target.as_str(), "https://a.example/");

        let second = service
            .request_single_inspection("user-1", "https://a.example/")
            .await;
        assert!(matches!(second, Err(ProbeError::RateLimited { .. })));
        assert_eq!(calls(&service), 3);
    }

    #[tokio::test]
    async fn test_invalid_target_rejected_without_fetch() {
        let service = service();

        let result = service.request_single_inspection("user-1", "not a url").await;

        assert!(matches!(result, Err(ProbeError::ValidationError { .. })));
        assert_eq!(calls(&service), 0);
    }

    #[tokio::test]
    async fn test_batch_counts_once_against_rate_limit() {
        let service = service();
        let urls = vec!["https://a.example".to_string(), "https://b.example".to_string()];

        let reports = service.request_batch_inspection("user-1", &urls).await.unwrap();
        assert_eq!(reports.len(), 2);

        let again = service.request_batch_inspection("user-1", &urls).await;
        assert!(matches!(again, Err(ProbeError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn test_batch_size_rejected_before_fetch() {
        let service = service();
        let urls = vec!["https://a.example".to_string()];

        let result = service.request_batch_inspection("user-2", &urls).await;

        assert!(result.unwrap_err().is_rejection());
        assert_eq!(calls(&service), 0);
    }

    #[tokio::test]
    async fn test_invalid_target_does_not_start_cooldown() {
        let service = service();

        let empty = service.request_single_inspection("user-1", "").await;
        assert!(matches!(empty, Err(ProbeError::ValidationError { .. })));

        let corrected = service
            .request_single_inspection("user-1", "https://a.example")
            .await;
        assert!(corrected.is_ok());
    }

    #[tokio::test]
    async fn test_undersized_batch_does_not_start_cooldown() {
        let service = service();

        let one = vec!["https://a.example".to_string()];
        let rejected = service.request_batch_inspection("user-1", &one).await;
        assert!(matches!(rejected, Err(ProbeError::ValidationError { .. })));

        let two = vec!["https://a.example".to_string(), "https://b.example".to_string()];
        let reports = service.request_batch_inspection("user-1", &two).await.unwrap();
        assert_eq!(reports.len(), 2);
    }

    #[test]
    fn test_load_targets_skips_blank_and_comment_lines() {
        let content = "https://a.example\n\n  # staging\n  https://b.example  \r\n";
        assert_eq!(
            load_targets(content),
            vec!["https://a.example", "https://b.example"]
        );
    }
}
