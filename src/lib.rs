//! Single-flight token cache that keeps every caller, across threads and processes, on the
//! same short-lived credential while fetching a replacement at most once per invalidation.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod client;
pub mod error;
pub mod keeper;
pub mod obs;
pub mod repo;
pub mod token;

pub use client::{Client, ClientFuture};
pub use error::{ClientError, ConfigError, Error, Result};
pub use keeper::{KeeperConfig, KeeperMetrics, TokenKeeper};
pub use repo::{MemoryRepo, Repo, RepoError, RepoFuture};
pub use token::{InvalidToken, SharedToken, Token, TokenRecord, TokenSecret};

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};

	pub use crate::error::{Error, Result};
}

#[cfg(test)] use {color_eyre as _, serde_json as _};
