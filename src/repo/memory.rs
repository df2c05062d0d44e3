//! In-process [`Repo`] whose clones share one token slot and one lock.
//!
//! Every clone behaves like a separate connection to the same backend, which makes it a
//! stand-in for several independent processes in tests and demos.

// crates.io
use async_lock::MutexGuardArc;
// self
use crate::{
	_prelude::*,
	repo::{Repo, RepoError, RepoFuture},
	token::SharedToken,
};

#[derive(Default)]
struct Shared {
	slot: RwLock<Option<SharedToken>>,
	gate: Arc<AsyncMutex<()>>,
	held: Mutex<Option<MutexGuardArc<()>>>,
}

/// Thread-safe repo backend that keeps the shared token in memory.
#[derive(Clone, Default)]
pub struct MemoryRepo(Arc<Shared>);
impl MemoryRepo {
	/// Creates an empty repo.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the currently stored token without going through the async contract.
	pub fn current(&self) -> Option<SharedToken> {
		self.0.slot.read().clone()
	}

	/// Returns `true` while some handle holds the lock.
	pub fn is_locked(&self) -> bool {
		self.0.held.lock().is_some()
	}

	fn store_now(&self, token: SharedToken) {
		*self.0.slot.write() = Some(token);
	}

	fn release_now(&self) -> Result<(), RepoError> {
		let guard = self.0.held.lock().take();

		match guard {
			Some(guard) => {
				drop(guard);

				Ok(())
			},
			None => Err(RepoError::lock("memory repo lock is not held")),
		}
	}
}
impl Repo for MemoryRepo {
	fn get_token(&self) -> RepoFuture<'_, Option<SharedToken>> {
		let token = self.current();

		Box::pin(async move { Ok(token) })
	}

	fn store_token(&self, token: SharedToken) -> RepoFuture<'_, ()> {
		self.store_now(token);

		Box::pin(async { Ok(()) })
	}

	fn lock(&self) -> RepoFuture<'_, ()> {
		let gate = self.0.gate.clone();

		Box::pin(async move {
			let guard = gate.lock_arc().await;

			*self.0.held.lock() = Some(guard);

			Ok(())
		})
	}

	fn unlock(&self) -> RepoFuture<'_, ()> {
		let released = self.release_now();

		Box::pin(async move { released })
	}
}
impl Debug for MemoryRepo {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MemoryRepo")
			.field("token", &self.current())
			.field("locked", &self.is_locked())
			.finish()
	}
}
