//! Shared-storage contract and built-in repo backends.
//!
//! A repo makes one token visible to every process attached to the same backend and exposes
//! a named lock so those processes can agree on who fetches the next token.

pub mod memory;
#[cfg(feature = "postgres")] pub mod postgres;

pub use memory::MemoryRepo;
#[cfg(feature = "postgres")] pub use postgres::{PgRepo, PgRepoConfig};

// self
use crate::{_prelude::*, error::ConfigError, token::SharedToken};

/// Boxed future returned by [`Repo`] operations.
pub type RepoFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RepoError>> + 'a + Send>>;

/// Storage backend contract implemented by shared token repos.
///
/// The keeper stores freshly issued tokens while holding the lock; refresh write-backs and reads
/// skip it, and the last write wins. The lock carries no TTL or ownership token, so a holder
/// must call [`Repo::unlock`] before anyone else's [`Repo::lock`] resolves.
pub trait Repo
where
	Self: Send + Sync,
{
	/// Returns the current shared token, or `None` when nothing has been stored yet.
	fn get_token(&self) -> RepoFuture<'_, Option<SharedToken>>;

	/// Persists `token` as the current shared token (last write wins).
	fn store_token(&self, token: SharedToken) -> RepoFuture<'_, ()>;

	/// Blocks until the process-crossing lock is held.
	fn lock(&self) -> RepoFuture<'_, ()>;

	/// Releases the process-crossing lock.
	fn unlock(&self) -> RepoFuture<'_, ()>;
}

/// Error type produced by [`Repo`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum RepoError {
	/// Stored data could not be decoded into a token.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// Lock could not be acquired or released.
	#[error("Lock failure: {message}.")]
	Lock {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend configuration is unusable.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl RepoError {
	/// Builds a [`RepoError::Backend`] from any displayable failure.
	pub fn backend(err: impl Display) -> Self {
		Self::Backend { message: err.to_string() }
	}

	/// Builds a [`RepoError::Lock`] from any displayable failure.
	pub fn lock(err: impl Display) -> Self {
		Self::Lock { message: err.to_string() }
	}
}
