//! Keeper-level error types carried by invalid tokens, clients, and configuration.

// self
use crate::_prelude::*;

/// Keeper-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type SharedError = Arc<dyn StdError + Send + Sync>;

/// Canonical error reported by [`Token::validate`](crate::token::Token::validate).
///
/// The keeper never fails loudly. Every failure is wrapped in an
/// [`InvalidToken`](crate::token::InvalidToken) whose validation returns one of these variants,
/// so the error must stay cheap to clone.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// No token was cached and the client failed to issue one.
	#[error("Client failed to issue a new token: {source}")]
	NewToken {
		/// Failure reported by the client.
		#[source]
		source: ClientError,
	},
	/// The cached token was unusable and the client failed to replace it.
	#[error("Client failed to refresh the token: {source}")]
	RefreshToken {
		/// Failure reported by the client.
		#[source]
		source: ClientError,
	},

	/// Token expiry is not after the instant it was checked against.
	#[error("Token expired at {expired_at}.")]
	Expired {
		/// Expiry instant carried by the token.
		expired_at: OffsetDateTime,
	},
	/// Token has been revoked and must not be reused.
	#[error("Token has been revoked.")]
	Revoked,
	/// Backend-specific validation failure.
	#[error("Token is invalid: {reason}.")]
	Invalid {
		/// Backend-supplied reason string.
		reason: String,
	},
}
impl Error {
	/// Returns `true` when the failure happened while issuing a brand-new token.
	pub fn is_new_token_failure(&self) -> bool {
		matches!(self, Self::NewToken { .. })
	}

	/// Returns `true` when the failure happened while refreshing a stale token.
	pub fn is_refresh_failure(&self) -> bool {
		matches!(self, Self::RefreshToken { .. })
	}

	/// Returns the client failure wrapped by a fetch error, if any.
	pub fn client_error(&self) -> Option<&ClientError> {
		match self {
			Self::NewToken { source } | Self::RefreshToken { source } => Some(source),
			_ => None,
		}
	}
}

/// Failures reported by [`Client`](crate::client::Client) implementations.
#[derive(Clone, Debug, ThisError)]
pub enum ClientError {
	/// The keeper was built without a client.
	#[error("Token client is not configured.")]
	Unconfigured,
	/// The issuing authority refused the request.
	#[error("Token authority rejected the request: {reason}.")]
	Rejected {
		/// Authority- or client-supplied reason string.
		reason: String,
	},
	/// The issuing authority could not be reached.
	#[error("Token authority could not be reached: {source}.")]
	Transport {
		/// Transport-specific failure.
		#[source]
		source: SharedError,
	},
}
impl ClientError {
	/// Builds a [`ClientError::Rejected`] from any displayable reason.
	pub fn rejected(reason: impl Into<String>) -> Self {
		Self::Rejected { reason: reason.into() }
	}

	/// Wraps a transport failure inside [`ClientError`].
	pub fn transport(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Transport { source: Arc::new(src) }
	}
}

/// Configuration failures raised while wiring backends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ConfigError {
	/// `DATABASE_URL` is unset or not valid unicode.
	#[error("Environment variable `{name}` is not set.")]
	MissingDatabaseUrl {
		/// Name of the variable that was read.
		name: String,
	},
	/// Table name cannot be used as a bare SQL identifier.
	#[error("Table name `{table}` is not a valid SQL identifier.")]
	InvalidTable {
		/// Rejected table name.
		table: String,
	},
}
