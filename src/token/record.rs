//! Plain token record and its builder.

// self
use crate::{
	_prelude::*,
	token::{Token, secret::TokenSecret},
};

/// Errors produced by [`TokenRecordBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TokenRecordBuilderError {
	/// Issued when no (or an empty) credential value was provided.
	#[error("Token value is required.")]
	MissingValue,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
}

/// Plain token issued by an authority and persisted by repos.
#[derive(Clone)]
pub struct TokenRecord {
	/// Credential value; callers must avoid logging it.
	pub value: TokenSecret,
	/// Issued-at instant.
	pub created_at: OffsetDateTime,
	/// Expiry instant.
	pub expires_at: OffsetDateTime,
	/// Revocation instant if the record has been revoked.
	pub revoked_at: Option<OffsetDateTime>,
}
impl TokenRecord {
	/// Returns a builder for constructing records.
	pub fn builder() -> TokenRecordBuilder {
		TokenRecordBuilder::default()
	}

	/// Returns `true` if the record has been revoked.
	pub fn is_revoked(&self) -> bool {
		self.revoked_at.is_some()
	}

	/// Marks the record as revoked.
	pub fn revoke(&mut self, instant: OffsetDateTime) {
		self.revoked_at = Some(instant);
	}

	/// Moves the record behind a [`SharedToken`](crate::token::SharedToken) handle.
	pub fn shared(self) -> Arc<dyn Token> {
		Arc::new(self)
	}
}
impl Token for TokenRecord {
	fn value(&self) -> &str {
		self.value.expose()
	}

	fn created(&self) -> OffsetDateTime {
		self.created_at
	}

	fn expires(&self) -> OffsetDateTime {
		self.expires_at
	}

	fn validate(&self) -> Result<()> {
		if self.is_revoked() {
			return Err(Error::Revoked);
		}
		if self.value.is_empty() {
			return Err(Error::Invalid { reason: "token value is empty".into() });
		}

		Ok(())
	}
}
impl Debug for TokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecord")
			.field("value", &"<redacted>")
			.field("created_at", &self.created_at)
			.field("expires_at", &self.expires_at)
			.field("revoked_at", &self.revoked_at)
			.finish()
	}
}

/// Builder for [`TokenRecord`].
#[derive(Clone, Debug, Default)]
pub struct TokenRecordBuilder {
	value: Option<TokenSecret>,
	created_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl TokenRecordBuilder {
	/// Provides the credential value.
	pub fn value(mut self, value: impl Into<String>) -> Self {
		self.value = Some(TokenSecret::new(value));

		self
	}

	/// Sets the issued-at instant.
	pub fn created_at(mut self, instant: OffsetDateTime) -> Self {
		self.created_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the created instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Consumes the builder and produces a [`TokenRecord`].
	pub fn build(self) -> Result<TokenRecord, TokenRecordBuilderError> {
		let value = self
			.value
			.filter(|value| !value.is_empty())
			.ok_or(TokenRecordBuilderError::MissingValue)?;
		let created_at = self.created_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) => created_at + delta,
			(None, None) => return Err(TokenRecordBuilderError::MissingExpiry),
		};

		Ok(TokenRecord { value, created_at, expires_at, revoked_at: None })
	}
}
