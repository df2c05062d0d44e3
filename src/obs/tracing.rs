// self
use crate::{_prelude::*, error::ClientError, obs::FetchKind, repo::RepoError};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// Span wrapped around one keeper call.
#[derive(Clone, Debug)]
pub struct KeeperSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl KeeperSpan {
	/// Creates a new span tagged with the keeper label + operation.
	pub fn new(keeper: &str, operation: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("token_keeper.token", keeper, operation);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (keeper, operation);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Reports a repo operation that failed and was swallowed.
pub fn repo_failure(operation: &'static str, err: &RepoError) {
	#[cfg(feature = "tracing")]
	tracing::warn!(operation, error = %err, "repo operation failed; continuing without it");

	#[cfg(not(feature = "tracing"))]
	let _ = (operation, err);
}

/// Reports a client call that failed.
pub fn client_failure(kind: FetchKind, err: &ClientError) {
	#[cfg(feature = "tracing")]
	tracing::error!(kind = kind.as_str(), error = %err, "token client call failed");

	#[cfg(not(feature = "tracing"))]
	let _ = (kind, err);
}

/// Reports a cached or shared token that failed the usability check.
pub fn token_unusable(origin: &'static str, err: &Error) {
	#[cfg(feature = "tracing")]
	tracing::warn!(origin, error = %err, "token is not usable");

	#[cfg(not(feature = "tracing"))]
	let _ = (origin, err);
}

/// Reports a token adopted from the shared repo.
pub fn token_adopted(expires: OffsetDateTime) {
	#[cfg(feature = "tracing")]
	tracing::debug!(%expires, "adopted token from repo");

	#[cfg(not(feature = "tracing"))]
	let _ = expires;
}
