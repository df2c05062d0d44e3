//! Optional observability helpers for keeper fetches.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (default) to run every [`TokenKeeper::token`](crate::TokenKeeper::token)
//!   call inside a `token_keeper.token` span carrying the `keeper` label, and to emit events for
//!   repo, lock, and client failures. Token values are never logged.
//! - Enable `metrics` to increment the `token_keeper_fetch_total` counter for every
//!   attempt/success/failure, labeled by `kind` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Upstream fetch kinds performed by the keeper.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchKind {
	/// `Client::new_token` while nothing usable is cached or shared.
	Issue,
	/// `Client::refresh_token` for a stale cached token.
	Refresh,
}
impl FetchKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FetchKind::Issue => "issue",
			FetchKind::Refresh => "refresh",
		}
	}
}
impl Display for FetchKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchOutcome {
	/// Call into the client.
	Attempt,
	/// Client produced a token.
	Success,
	/// Client failed; the caller receives an invalid token.
	Failure,
}
impl FetchOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FetchOutcome::Attempt => "attempt",
			FetchOutcome::Success => "success",
			FetchOutcome::Failure => "failure",
		}
	}
}
impl Display for FetchOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
