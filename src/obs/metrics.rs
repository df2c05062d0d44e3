// self
use crate::obs::{FetchKind, FetchOutcome};

/// Records a fetch outcome via the global metrics recorder (when enabled).
pub fn record_fetch_outcome(kind: FetchKind, outcome: FetchOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"token_keeper_fetch_total",
			"kind" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}
