//! Retry wrapper: re-runs a failed completion with doubling backoff.
//!
//! Retries belong to the LLM call only. Chunking, scoring and selection never
//! retry: nothing there is flaky.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use lectern_core::error::Result;
use lectern_core::traits::Provider;

pub struct RetryProvider {
    inner: Box<dyn Provider>,
    max_retries: u32,
    backoff: Duration,
    /// Failed attempts since the last success.
    consecutive_failures: AtomicU32,
}

impl RetryProvider {
    pub fn new(inner: Box<dyn Provider>, max_retries: u32) -> Self {
        Self {
            inner,
            max_retries,
            backoff: Duration::from_millis(500),
            consecutive_failures: AtomicU32::new(0),
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Provider for RetryProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let mut attempt = 0u32;
        loop {
            match self.inner.complete(prompt).await {
                Ok(text) => {
                    if attempt > 0 {
                        tracing::info!("🔄 {} succeeded after {attempt} retries", self.inner.name());
                    }
                    self.consecutive_failures.store(0, Ordering::Relaxed);
                    return Ok(text);
                }
                Err(e) => {
                    self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
                    if attempt >= self.max_retries {
                        return Err(e);
                    }
                    let delay = self.backoff.saturating_mul(1u32 << attempt.min(16));
                    tracing::warn!(
                        "⚠️ {} failed ({e}); retry {}/{} in {delay:?}",
                        self.inner.name(),
                        attempt + 1,
                        self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
