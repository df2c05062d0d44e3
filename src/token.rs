//! Token capability contract, the invalid-token carrier, and the built-in record type.

pub mod invalid;
pub mod record;
pub mod secret;

pub use invalid::*;
pub use record::*;
pub use secret::*;

// self
use crate::_prelude::*;

/// Reference-counted token handle shared between the keeper, repos, and callers.
pub type SharedToken = Arc<dyn Token>;

/// Short-lived credential issued by an external authority.
///
/// A token is usable iff [`Token::validate`] succeeds and [`Token::expires`] lies strictly after
/// the current instant. Implementations should keep `Debug` free of the secret value.
pub trait Token
where
	Self: Debug + Send + Sync,
{
	/// Opaque credential value; empty for [`InvalidToken`].
	fn value(&self) -> &str;

	/// Instant the token was issued.
	fn created(&self) -> OffsetDateTime;

	/// Instant after which the token can no longer be used.
	fn expires(&self) -> OffsetDateTime;

	/// Backend-specific self check, independent of expiry.
	fn validate(&self) -> Result<()>;

	/// Checks the usability invariant against the provided instant.
	fn check_at(&self, instant: OffsetDateTime) -> Result<()> {
		self.validate()?;

		let expired_at = self.expires();

		if expired_at > instant { Ok(()) } else { Err(Error::Expired { expired_at }) }
	}

	/// Convenience helper that checks usability against the current UTC instant.
	fn is_usable(&self) -> bool {
		self.check_at(OffsetDateTime::now_utc()).is_ok()
	}
}
