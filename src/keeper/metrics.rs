// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing what a keeper had to do to answer callers.
#[derive(Debug, Default)]
pub struct KeeperMetrics {
	requests: AtomicU64,
	issued: AtomicU64,
	refreshed: AtomicU64,
	adopted: AtomicU64,
	failures: AtomicU64,
}
impl KeeperMetrics {
	/// Returns the number of `token()` calls.
	pub fn requests(&self) -> u64 {
		self.requests.load(Ordering::Relaxed)
	}

	/// Returns the number of `Client::new_token` calls.
	pub fn issued(&self) -> u64 {
		self.issued.load(Ordering::Relaxed)
	}

	/// Returns the number of `Client::refresh_token` calls.
	pub fn refreshed(&self) -> u64 {
		self.refreshed.load(Ordering::Relaxed)
	}

	/// Returns the number of usable tokens adopted from the repo.
	pub fn adopted(&self) -> u64 {
		self.adopted.load(Ordering::Relaxed)
	}

	/// Returns the number of calls answered with an invalid token.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_request(&self) {
		self.requests.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_issue(&self) {
		self.issued.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh(&self) {
		self.refreshed.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_adoption(&self) {
		self.adopted.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
