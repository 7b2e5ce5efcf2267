use std::{fmt::Display, future::Future, time::Duration};

use crate::error::Retryable;

/// Bounded exponential-backoff retry shared by every remote call site.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
	pub max_retries: u32,
	pub base_backoff: Duration,
	pub max_backoff: Duration,
}
impl RetryPolicy {
	pub fn from_config(cfg: &mnemo_config::Retry) -> Self {
		Self {
			max_retries: cfg.max_retries,
			base_backoff: Duration::from_millis(cfg.base_backoff_ms),
			max_backoff: Duration::from_millis(cfg.max_backoff_ms),
		}
	}

	pub fn none() -> Self {
		Self { max_retries: 0, base_backoff: Duration::ZERO, max_backoff: Duration::ZERO }
	}

	/// Delay before retry number `retry` (zero based).
	pub fn backoff_for_retry(&self, retry: u32) -> Duration {
		let exp = retry.min(16);
		let base = self.base_backoff.saturating_mul(1_u32 << exp);

		base.min(self.max_backoff)
	}

	pub async fn run<T, E, F, Fut>(&self, operation: &str, mut attempt: F) -> Result<T, E>
	where
		E: Retryable + Display,
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<T, E>>,
	{
		let mut retries = 0_u32;

		loop {
			match attempt().await {
				Ok(value) => return Ok(value),
				Err(err) if err.is_retryable() && retries < self.max_retries => {
					let backoff = self.backoff_for_retry(retries);

					retries += 1;

					tracing::warn!(
						operation,
						retry = retries,
						max_retries = self.max_retries,
						backoff_ms = backoff.as_millis() as u64,
						error = %err,
						"Transient remote failure, retrying."
					);

					tokio::time::sleep(backoff).await;
				},
				Err(err) => {
					if err.is_retryable() {
						tracing::warn!(
							operation,
							retries,
							error = %err,
							"Remote retries exhausted."
						);
					}

					return Err(err);
				},
			}
		}
	}
}
