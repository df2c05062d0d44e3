//! Placeholder token returned in place of a real one when fetching fails.

// self
use crate::{_prelude::*, token::Token};

/// Token that only carries the failure that prevented a real token from being produced.
///
/// Its value is empty and it expires the instant it is created, so it can never pass the
/// usability check. [`Token::validate`] hands back the captured error.
#[derive(Clone, Debug)]
pub struct InvalidToken {
	error: Error,
	created: OffsetDateTime,
}
impl InvalidToken {
	/// Wraps the provided failure, stamped with the current clock.
	pub fn new(error: Error) -> Self {
		Self { error, created: OffsetDateTime::now_utc() }
	}

	/// Returns the captured failure.
	pub fn error(&self) -> &Error {
		&self.error
	}
}
impl Token for InvalidToken {
	fn value(&self) -> &str {
		""
	}

	fn created(&self) -> OffsetDateTime {
		self.created
	}

	fn expires(&self) -> OffsetDateTime {
		self.created
	}

	fn validate(&self) -> Result<()> {
		Err(self.error.clone())
	}
}
