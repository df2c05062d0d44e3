//! Single-flight token cache with cross-process coordination.
//!
//! [`TokenKeeper::token`] serializes every in-process caller behind one async mutex and runs
//! the whole check-cache, maybe-fetch, store sequence as a single critical section:
//!
//! 1. With nothing cached, peek at the repo (lock, read, unlock) and adopt a usable token.
//! 2. Otherwise take the repo lock, read the repo again, and only if it is still empty or stale
//!    call [`Client::new_token`], storing the result before the lock is released.
//! 3. A cached token that is expired or fails validation is replaced through
//!    [`Client::refresh_token`] and written back to the repo.
//!
//! Repo and lock failures are logged and skipped. Client failures come back as
//! [`InvalidToken`]s: issuance failures leave the cache empty, refresh failures keep the stale
//! token cached so the next call retries the refresh.

mod metrics;

pub use metrics::KeeperMetrics;

// self
use crate::{
	_prelude::*,
	client::Client,
	error::ClientError,
	obs::{self, FetchKind, FetchOutcome, KeeperSpan},
	repo::Repo,
	token::{InvalidToken, SharedToken, Token},
};

/// Construction-time settings for a [`TokenKeeper`].
#[derive(Clone, Default)]
pub struct KeeperConfig {
	/// Issuance capability. A keeper without one answers with issuance failures.
	pub client: Option<Arc<dyn Client>>,
	/// Shared storage; `None` keeps the keeper in single-process mode.
	pub repo: Option<Arc<dyn Repo>>,
	/// Label attached to every span and event emitted by the keeper.
	pub name: Option<String>,
}
impl KeeperConfig {
	/// Creates a config for the provided client.
	pub fn new(client: Arc<dyn Client>) -> Self {
		Self { client: Some(client), ..Default::default() }
	}

	/// Attaches shared storage.
	pub fn with_repo(mut self, repo: Arc<dyn Repo>) -> Self {
		self.repo = Some(repo);

		self
	}

	/// Sets the diagnostic label.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());

		self
	}
}
impl Debug for KeeperConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("KeeperConfig")
			.field("client_set", &self.client.is_some())
			.field("repo_set", &self.repo.is_some())
			.field("name", &self.name)
			.finish()
	}
}

/// Hands every caller the same valid token, fetching a new one at most once per invalidation.
pub struct TokenKeeper {
	name: String,
	client: Option<Arc<dyn Client>>,
	repo: Option<Arc<dyn Repo>>,
	cached: AsyncMutex<Option<SharedToken>>,
	metrics: Arc<KeeperMetrics>,
}
impl TokenKeeper {
	const DEFAULT_NAME: &'static str = "token_keeper";

	/// Creates a single-process keeper around `client`.
	pub fn new(client: Arc<dyn Client>) -> Self {
		Self::from_config(KeeperConfig::new(client))
	}

	/// Creates a keeper from explicit settings.
	pub fn from_config(config: KeeperConfig) -> Self {
		Self {
			name: config.name.unwrap_or_else(|| Self::DEFAULT_NAME.into()),
			client: config.client,
			repo: config.repo,
			cached: AsyncMutex::new(None),
			metrics: Default::default(),
		}
	}

	/// Attaches shared storage so several processes converge on one token.
	pub fn with_repo(mut self, repo: Arc<dyn Repo>) -> Self {
		self.repo = Some(repo);

		self
	}

	/// Sets the label attached to every span and event.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();

		self
	}

	/// Returns the diagnostic label.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Returns the keeper's counters.
	pub fn metrics(&self) -> &KeeperMetrics {
		&self.metrics
	}

	/// Returns a currently usable token, or an [`InvalidToken`] describing why none exists.
	///
	/// Callers must check [`Token::validate`](crate::token::Token::validate) before trusting
	/// the value.
	pub async fn token(&self) -> SharedToken {
		let span = KeeperSpan::new(&self.name, "token");

		span.instrument(self.token_guarded()).await
	}

	async fn token_guarded(&self) -> SharedToken {
		let mut cached = self.cached.lock().await;

		self.metrics.record_request();

		let current = match cached.as_ref() {
			Some(token) => token.clone(),
			None => match self.populate().await {
				Ok(token) => {
					*cached = Some(token.clone());

					token
				},
				Err(source) => return self.fail(Error::NewToken { source }),
			},
		};

		if let Err(err) = current.check_at(OffsetDateTime::now_utc()) {
			obs::token_unusable("cache", &err);

			return match self.refresh(&current).await {
				Ok(fresh) => {
					self.share(fresh.clone()).await;
					*cached = Some(fresh.clone());

					fresh
				},
				Err(source) => self.fail(Error::RefreshToken { source }),
			};
		}

		current
	}

	// The local guard is held by the caller for the whole call, so no other in-process caller
	// can fill the cache while this one waits on the repo lock.
	async fn populate(&self) -> Result<SharedToken, ClientError> {
		let Some(repo) = self.repo.as_deref() else {
			return self.issue().await;
		};

		if let Some(token) = self.peek(repo).await {
			return Ok(token);
		}

		let locked = self.acquire(repo).await;
		let result = match self.read_shared(repo, "repo_recheck").await {
			Some(token) => Ok(token),
			None => match self.issue().await {
				Ok(token) => {
					self.share(token.clone()).await;

					Ok(token)
				},
				Err(err) => Err(err),
			},
		};

		if locked {
			self.release(repo).await;
		}

		result
	}

	async fn peek(&self, repo: &dyn Repo) -> Option<SharedToken> {
		let locked = self.acquire(repo).await;
		let found = self.read_shared(repo, "repo").await;

		if locked {
			self.release(repo).await;
		}

		found
	}

	async fn read_shared(&self, repo: &dyn Repo, origin: &'static str) -> Option<SharedToken> {
		match repo.get_token().await {
			Ok(Some(token)) => match token.check_at(OffsetDateTime::now_utc()) {
				Ok(()) => {
					self.metrics.record_adoption();
					obs::token_adopted(token.expires());

					Some(token)
				},
				Err(err) => {
					obs::token_unusable(origin, &err);

					None
				},
			},
			Ok(None) => None,
			Err(err) => {
				obs::repo_failure("get_token", &err);

				None
			},
		}
	}

	async fn acquire(&self, repo: &dyn Repo) -> bool {
		match repo.lock().await {
			Ok(()) => true,
			Err(err) => {
				obs::repo_failure("lock", &err);

				false
			},
		}
	}

	async fn release(&self, repo: &dyn Repo) {
		if let Err(err) = repo.unlock().await {
			obs::repo_failure("unlock", &err);
		}
	}

	// Tokens that fail their own validation are kept out of the repo.
	async fn share(&self, token: SharedToken) {
		let Some(repo) = self.repo.as_deref() else {
			return;
		};

		if let Err(err) = token.validate() {
			obs::token_unusable("client", &err);

			return;
		}
		if let Err(err) = repo.store_token(token).await {
			obs::repo_failure("store_token", &err);
		}
	}

	async fn issue(&self) -> Result<SharedToken, ClientError> {
		const KIND: FetchKind = FetchKind::Issue;

		let client = self.client_for(KIND)?;

		self.metrics.record_issue();

		let result = client.new_token().await;

		Self::observe(KIND, &result);

		result
	}

	async fn refresh(&self, stale: &SharedToken) -> Result<SharedToken, ClientError> {
		const KIND: FetchKind = FetchKind::Refresh;

		let client = self.client_for(KIND)?;

		self.metrics.record_refresh();

		let result = client.refresh_token(stale).await;

		Self::observe(KIND, &result);

		result
	}

	fn client_for(&self, kind: FetchKind) -> Result<&dyn Client, ClientError> {
		obs::record_fetch_outcome(kind, FetchOutcome::Attempt);

		self.client.as_deref().ok_or_else(|| {
			let err = ClientError::Unconfigured;

			Self::observe::<()>(kind, &Err(err.clone()));

			err
		})
	}

	fn observe<T>(kind: FetchKind, result: &Result<T, ClientError>) {
		match result {
			Ok(_) => obs::record_fetch_outcome(kind, FetchOutcome::Success),
			Err(err) => {
				obs::client_failure(kind, err);
				obs::record_fetch_outcome(kind, FetchOutcome::Failure);
			},
		}
	}

	fn fail(&self, err: Error) -> SharedToken {
		self.metrics.record_failure();

		Arc::new(InvalidToken::new(err))
	}
}
impl Debug for TokenKeeper {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenKeeper")
			.field("name", &self.name)
			.field("client_set", &self.client.is_some())
			.field("repo_set", &self.repo.is_some())
			.finish()
	}
}
