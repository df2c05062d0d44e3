//! Test doubles shared by the keeper integration tests.

#![allow(dead_code)]

// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
	},
	time::Duration as StdDuration,
};
// crates.io
use parking_lot::Mutex;
use time::{Duration, OffsetDateTime};
// self
use token_keeper::{
	Client, ClientError, ClientFuture, Error, MemoryRepo, Repo, RepoError, RepoFuture, Result,
	SharedToken, Token, TokenKeeper, TokenRecord,
};

/// Default slowdown applied to fakes in concurrency tests.
pub const LAG: StdDuration = StdDuration::from_millis(20);

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Token whose expiry and validity can be flipped after issuance.
#[derive(Debug)]
pub struct FakeToken {
	value: String,
	created: OffsetDateTime,
	expires: OffsetDateTime,
	expired: AtomicBool,
	rejection: Mutex<Option<String>>,
}
impl FakeToken {
	pub fn new() -> Arc<Self> {
		let now = OffsetDateTime::now_utc();

		Arc::new(Self {
			value: format!("token-{}", NEXT_ID.fetch_add(1, Ordering::Relaxed)),
			created: now,
			expires: now + Duration::minutes(1),
			expired: AtomicBool::new(false),
			rejection: Mutex::new(None),
		})
	}

	pub fn expire(&self) {
		self.expired.store(true, Ordering::SeqCst);
	}

	pub fn reject(&self, reason: impl Into<String>) {
		*self.rejection.lock() = Some(reason.into());
	}

	pub fn shared(self: &Arc<Self>) -> SharedToken {
		self.clone()
	}
}
impl Token for FakeToken {
	fn value(&self) -> &str {
		&self.value
	}

	fn created(&self) -> OffsetDateTime {
		self.created
	}

	fn expires(&self) -> OffsetDateTime {
		if self.expired.load(Ordering::SeqCst) {
			self.created - Duration::minutes(2)
		} else {
			self.expires
		}
	}

	fn validate(&self) -> Result<()> {
		match self.rejection.lock().as_ref() {
			Some(reason) => Err(Error::Invalid { reason: reason.clone() }),
			None => Ok(()),
		}
	}
}

/// Client that mints [`FakeToken`]s, optionally slowly or with an injected failure.
#[derive(Debug, Default)]
pub struct FakeClient {
	lag: Mutex<StdDuration>,
	failure: Mutex<Option<ClientError>>,
	revoke_next_issue: AtomicBool,
	current: Mutex<Option<Arc<FakeToken>>>,
	new_calls: AtomicUsize,
	refresh_calls: AtomicUsize,
}
impl FakeClient {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_lag(self, lag: StdDuration) -> Self {
		self.slow_down(lag);

		self
	}

	pub fn slow_down(&self, lag: StdDuration) {
		*self.lag.lock() = lag;
	}

	pub fn fail_with(&self, err: ClientError) {
		*self.failure.lock() = Some(err);
	}

	/// Makes the next `new_token` call hand out an already revoked record.
	pub fn revoke_next_issue(&self) {
		self.revoke_next_issue.store(true, Ordering::SeqCst);
	}

	pub fn recover(&self) {
		*self.failure.lock() = None;
	}

	pub fn current(&self) -> Arc<FakeToken> {
		self.current.lock().clone().expect("Fake client has not minted a token yet.")
	}

	pub fn expire_current(&self) {
		self.current().expire();
	}

	pub fn new_calls(&self) -> usize {
		self.new_calls.load(Ordering::SeqCst)
	}

	pub fn refresh_calls(&self) -> usize {
		self.refresh_calls.load(Ordering::SeqCst)
	}

	async fn mint(&self) -> Result<SharedToken, ClientError> {
		let failure = self.failure.lock().clone();

		if let Some(err) = failure {
			return Err(err);
		}
		let lag = *self.lag.lock();

		if !lag.is_zero() {
			tokio::time::sleep(lag).await;
		}

		let token = FakeToken::new();

		*self.current.lock() = Some(token.clone());

		Ok(token.shared())
	}

	fn mint_revoked(&self) -> SharedToken {
		let now = OffsetDateTime::now_utc();
		let mut record = TokenRecord::builder()
			.value(format!("revoked-{}", NEXT_ID.fetch_add(1, Ordering::Relaxed)))
			.created_at(now)
			.expires_in(Duration::minutes(1))
			.build()
			.expect("Revoked fixture should build.");

		record.revoke(now);

		record.shared()
	}
}
impl Client for FakeClient {
	fn new_token(&self) -> ClientFuture<'_, SharedToken> {
		Box::pin(async move {
			self.new_calls.fetch_add(1, Ordering::SeqCst);

			self.mint().await
		})
	}

	fn refresh_token<'a>(&'a self, _stale: &'a SharedToken) -> ClientFuture<'a, SharedToken> {
		Box::pin(async move {
			self.refresh_calls.fetch_add(1, Ordering::SeqCst);

			self.mint().await
		})
	}
}

/// Repo handle that slows down and counts every call into a shared [`MemoryRepo`].
#[derive(Debug)]
pub struct LaggedRepo {
	inner: MemoryRepo,
	lag: StdDuration,
	calls: AtomicUsize,
	stored: Mutex<Vec<String>>,
}
impl LaggedRepo {
	pub fn new(inner: MemoryRepo, lag: StdDuration) -> Self {
		Self { inner, lag, calls: AtomicUsize::new(0), stored: Mutex::new(Vec::new()) }
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	/// Values written through this handle, oldest first.
	pub fn stored(&self) -> Vec<String> {
		self.stored.lock().clone()
	}

	async fn pause(&self) {
		self.calls.fetch_add(1, Ordering::SeqCst);

		if !self.lag.is_zero() {
			tokio::time::sleep(self.lag).await;
		}
	}
}
impl Repo for LaggedRepo {
	fn get_token(&self) -> RepoFuture<'_, Option<SharedToken>> {
		Box::pin(async move {
			self.pause().await;
			self.inner.get_token().await
		})
	}

	fn store_token(&self, token: SharedToken) -> RepoFuture<'_, ()> {
		Box::pin(async move {
			self.pause().await;
			self.stored.lock().push(token.value().to_owned());
			self.inner.store_token(token).await
		})
	}

	fn lock(&self) -> RepoFuture<'_, ()> {
		Box::pin(async move {
			self.pause().await;
			self.inner.lock().await
		})
	}

	fn unlock(&self) -> RepoFuture<'_, ()> {
		Box::pin(async move {
			self.pause().await;
			self.inner.unlock().await
		})
	}
}

/// Repo whose backend is permanently down.
#[derive(Debug, Default)]
pub struct BrokenRepo {
	calls: AtomicUsize,
}
impl BrokenRepo {
	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	fn down<T>(&self) -> RepoFuture<'_, T>
	where
		T: 'static + Send,
	{
		self.calls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async { Err(RepoError::backend("connection refused")) })
	}
}
impl Repo for BrokenRepo {
	fn get_token(&self) -> RepoFuture<'_, Option<SharedToken>> {
		self.down()
	}

	fn store_token(&self, _token: SharedToken) -> RepoFuture<'_, ()> {
		self.down()
	}

	fn lock(&self) -> RepoFuture<'_, ()> {
		self.down()
	}

	fn unlock(&self) -> RepoFuture<'_, ()> {
		self.down()
	}
}

/// Repo whose lock is unavailable while reads and writes still work.
#[derive(Debug, Default)]
pub struct LocklessRepo {
	inner: MemoryRepo,
	unlock_calls: AtomicUsize,
}
impl LocklessRepo {
	pub fn inner(&self) -> &MemoryRepo {
		&self.inner
	}

	pub fn unlock_calls(&self) -> usize {
		self.unlock_calls.load(Ordering::SeqCst)
	}
}
impl Repo for LocklessRepo {
	fn get_token(&self) -> RepoFuture<'_, Option<SharedToken>> {
		self.inner.get_token()
	}

	fn store_token(&self, token: SharedToken) -> RepoFuture<'_, ()> {
		self.inner.store_token(token)
	}

	fn lock(&self) -> RepoFuture<'_, ()> {
		Box::pin(async { Err(RepoError::lock("lock service unavailable")) })
	}

	fn unlock(&self) -> RepoFuture<'_, ()> {
		self.unlock_calls.fetch_add(1, Ordering::SeqCst);

		self.inner.unlock()
	}
}

/// Calls `keeper.token()` from `n` concurrent tasks and returns every answer.
pub async fn hammer(keeper: Arc<TokenKeeper>, n: usize) -> Vec<SharedToken> {
	let handles = (0..n)
		.map(|_| {
			let keeper = keeper.clone();

			tokio::spawn(async move { keeper.token().await })
		})
		.collect::<Vec<_>>();
	let mut tokens = Vec::with_capacity(n);

	for handle in handles {
		tokens.push(handle.await.expect("Token task should not panic."));
	}

	tokens
}

/// Asserts that every token carries the same value and returns it.
pub fn assert_converged(tokens: &[SharedToken]) -> String {
	let first = tokens.first().expect("At least one token should be present.").value().to_owned();

	for token in tokens {
		assert_eq!(token.value(), first);
	}

	first
}
