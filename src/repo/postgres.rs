//! Postgres-backed [`Repo`] using a token table and a session-level advisory lock.
//!
//! Each stored token is appended as a `(val, expires, created)` row and the most recently
//! created row is the current one; storing a token prunes rows created before it.
//! `pg_advisory_lock` is scoped to the database session, so the repo pins one pooled connection
//! from [`Repo::lock`] until the matching [`Repo::unlock`]. If the unlock query fails, that
//! connection is closed rather than returned to the pool.

// std
use std::env;
// crates.io
use sqlx::{PgPool, Postgres, pool::PoolConnection};
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	repo::{Repo, RepoError, RepoFuture},
	token::{SharedToken, TokenRecord},
};

/// Environment variable read by [`PgRepo::from_env`].
pub const DATABASE_URL: &str = "DATABASE_URL";

/// Connection-independent settings for [`PgRepo`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PgRepoConfig {
	/// Table holding token rows.
	pub table: String,
	/// Advisory lock key; every process sharing the table must use the same value.
	pub lock_id: i64,
}
impl PgRepoConfig {
	/// Default table name.
	pub const DEFAULT_TABLE: &'static str = "token";
	/// Default advisory lock key (ASCII `token`).
	pub const DEFAULT_LOCK_ID: i64 = 0x746f_6b65_6e;

	/// Overrides the table name.
	pub fn with_table(mut self, table: impl Into<String>) -> Self {
		self.table = table.into();

		self
	}

	/// Overrides the advisory lock key.
	pub fn with_lock_id(mut self, lock_id: i64) -> Self {
		self.lock_id = lock_id;

		self
	}

	/// Ensures the table name can be spliced into SQL unquoted.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let mut chars = self.table.chars();
		let head_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
		let tail_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

		if head_ok && tail_ok && self.table.len() <= 63 {
			Ok(())
		} else {
			Err(ConfigError::InvalidTable { table: self.table.clone() })
		}
	}
}
impl Default for PgRepoConfig {
	fn default() -> Self {
		Self { table: Self::DEFAULT_TABLE.into(), lock_id: Self::DEFAULT_LOCK_ID }
	}
}

/// Shared token repo stored in Postgres.
pub struct PgRepo {
	pool: PgPool,
	config: PgRepoConfig,
	session: Mutex<Option<PoolConnection<Postgres>>>,
}
impl PgRepo {
	/// Wraps an existing pool after validating the configuration.
	pub fn new(pool: PgPool, config: PgRepoConfig) -> Result<Self, RepoError> {
		config.validate()?;

		Ok(Self { pool, config, session: Mutex::new(None) })
	}

	/// Connects to `url` and wraps the resulting pool.
	pub async fn connect(url: &str, config: PgRepoConfig) -> Result<Self, RepoError> {
		config.validate()?;

		let pool = PgPool::connect(url).await.map_err(|e| RepoError::Backend {
			message: format!("Failed to connect to Postgres: {e}"),
		})?;

		Self::new(pool, config)
	}

	/// Connects using the URL found in `DATABASE_URL`.
	pub async fn from_env(config: PgRepoConfig) -> Result<Self, RepoError> {
		let url = env::var(DATABASE_URL)
			.map_err(|_| ConfigError::MissingDatabaseUrl { name: DATABASE_URL.into() })?;

		Self::connect(&url, config).await
	}

	/// Returns the active configuration.
	pub fn config(&self) -> &PgRepoConfig {
		&self.config
	}

	/// Creates the token table and its `created` index if they do not exist yet.
	pub async fn initialize(&self) -> Result<(), RepoError> {
		let table = &self.config.table;

		sqlx::query(&format!(
			"CREATE TABLE IF NOT EXISTS {table} (
				val TEXT NOT NULL,
				expires TIMESTAMPTZ NOT NULL,
				created TIMESTAMPTZ NOT NULL
			)"
		))
		.execute(&self.pool)
		.await
		.map_err(|e| RepoError::Backend {
			message: format!("Failed to create table {table}: {e}"),
		})?;
		sqlx::query(&format!("CREATE INDEX IF NOT EXISTS {table}_created_idx ON {table} (created)"))
			.execute(&self.pool)
			.await
			.map_err(|e| RepoError::Backend {
				message: format!("Failed to create index on {table}: {e}"),
			})?;

		Ok(())
	}

	fn select_current(&self) -> String {
		format!(
			"SELECT val, expires, created FROM {} ORDER BY created DESC LIMIT 1",
			self.config.table
		)
	}

	// Rows created before the new one can never become current again.
	fn insert(&self) -> String {
		let table = &self.config.table;

		format!(
			"WITH inserted AS (
				INSERT INTO {table} (val, expires, created) VALUES ($1, $2, $3) RETURNING created
			)
			DELETE FROM {table} WHERE created < (SELECT created FROM inserted)"
		)
	}
}
impl Repo for PgRepo {
	fn get_token(&self) -> RepoFuture<'_, Option<SharedToken>> {
		Box::pin(async move {
			let row: Option<(String, OffsetDateTime, OffsetDateTime)> =
				sqlx::query_as(&self.select_current())
					.fetch_optional(&self.pool)
					.await
					.map_err(|e| RepoError::Backend {
						message: format!("Failed to fetch token: {e}"),
					})?;
			let Some((value, expires_at, created_at)) = row else {
				return Ok(None);
			};
			let record = TokenRecord::builder()
				.value(value)
				.created_at(created_at)
				.expires_at(expires_at)
				.build()
				.map_err(|e| RepoError::Serialization {
					message: format!("Stored token row is malformed: {e}"),
				})?;

			Ok(Some(record.shared()))
		})
	}

	fn store_token(&self, token: SharedToken) -> RepoFuture<'_, ()> {
		Box::pin(async move {
			sqlx::query(&self.insert())
				.bind(token.value())
				.bind(token.expires())
				.bind(token.created())
				.execute(&self.pool)
				.await
				.map_err(|e| RepoError::Backend { message: format!("Failed to store token: {e}") })?;

			Ok(())
		})
	}

	fn lock(&self) -> RepoFuture<'_, ()> {
		Box::pin(async move {
			let mut conn = self.pool.acquire().await.map_err(|e| {
				RepoError::lock(format!("Failed to acquire a connection for locking: {e}"))
			})?;

			sqlx::query("SELECT pg_advisory_lock($1)")
				.bind(self.config.lock_id)
				.execute(&mut *conn)
				.await
				.map_err(|e| RepoError::lock(format!("pg_advisory_lock failed: {e}")))?;

			*self.session.lock() = Some(conn);

			Ok(())
		})
	}

	fn unlock(&self) -> RepoFuture<'_, ()> {
		Box::pin(async move {
			let session = self.session.lock().take();
			let Some(mut conn) = session else {
				return Err(RepoError::lock("advisory lock is not held by this repo"));
			};
			let released: Result<(bool,), _> = sqlx::query_as("SELECT pg_advisory_unlock($1)")
				.bind(self.config.lock_id)
				.fetch_one(&mut *conn)
				.await;
			let (released,) = match released {
				Ok(row) => row,
				Err(e) => {
					// Ending the session is the only other way Postgres drops the lock.
					let _ = conn.close().await;

					return Err(RepoError::lock(format!("pg_advisory_unlock failed: {e}")));
				},
			};

			if released {
				Ok(())
			} else {
				Err(RepoError::lock(format!(
					"advisory lock {} was not held by the pinned session",
					self.config.lock_id
				)))
			}
		})
	}
}
impl Debug for PgRepo {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PgRepo")
			.field("config", &self.config)
			.field("locked", &self.session.lock().is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn table_names_must_be_plain_identifiers() {
		assert!(PgRepoConfig::default().validate().is_ok());
		assert!(PgRepoConfig::default().with_table("_tokens_v2").validate().is_ok());

		for table in ["", "2fa", "token; DROP TABLE token", "tok-en", "\"quoted\""] {
			assert_eq!(
				PgRepoConfig::default().with_table(table).validate(),
				Err(ConfigError::InvalidTable { table: table.into() })
			);
		}
	}

	#[test]
	fn config_deserializes_with_defaults() {
		let config: PgRepoConfig = serde_json::from_str("{\"lock_id\":7}")
			.expect("Partial config should deserialize with defaults.");

		assert_eq!(config.table, PgRepoConfig::DEFAULT_TABLE);
		assert_eq!(config.lock_id, 7);
	}
}
