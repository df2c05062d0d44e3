//! Issuance capability consumed by the keeper.
//!
//! The crate ships no concrete client. Implementations wrap whatever authority mints tokens
//! (an OAuth endpoint, a vendor SDK, a sidecar) and may block for as long as the network does.

// self
use crate::{_prelude::*, error::ClientError, token::SharedToken};

/// Boxed future returned by [`Client`] operations.
pub type ClientFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ClientError>> + 'a + Send>>;

/// Token issuance contract.
pub trait Client
where
	Self: Send + Sync,
{
	/// Obtains a fresh token unconditionally.
	fn new_token(&self) -> ClientFuture<'_, SharedToken>;

	/// Obtains a replacement for `stale`.
	///
	/// Whether the authority invalidates `stale` is backend-defined.
	fn refresh_token<'a>(&'a self, stale: &'a SharedToken) -> ClientFuture<'a, SharedToken>;
}
