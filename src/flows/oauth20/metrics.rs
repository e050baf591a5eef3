// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-client counters for refresh-token grants.
///
/// Shared through an `Arc` so several short-lived clients can feed one set of counters.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	succeeded: AtomicU64,
	failed: AtomicU64,
}
impl RefreshMetrics {
	/// Refresh grants sent to the provider.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Refreshes that replaced the stored token.
	pub fn successes(&self) -> u64 {
		self.succeeded.load(Ordering::Relaxed)
	}

	/// Refreshes that surfaced `TokenRefreshFailed`.
	pub fn failures(&self) -> u64 {
		self.failed.load(Ordering::Relaxed)
	}

	/// Counts one refresh and its outcome.
	pub(crate) fn record<T, E>(&self, result: &Result<T, E>) {
		self.attempts.fetch_add(1, Ordering::Relaxed);

		let outcome = if result.is_ok() { &self.succeeded } else { &self.failed };

		outcome.fetch_add(1, Ordering::Relaxed);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn outcomes_are_counted_per_attempt() {
		let metrics = RefreshMetrics::default();

		metrics.record::<(), ()>(&Ok(()));
		metrics.record::<(), ()>(&Err(()));
		metrics.record::<(), ()>(&Err(()));

		assert_eq!((metrics.attempts(), metrics.successes(), metrics.failures()), (3, 1, 2));
	}
}
