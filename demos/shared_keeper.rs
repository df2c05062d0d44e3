//! Demonstrates two keepers, standing in for two processes, sharing one token through a
//! memory repo while a toy authority counts how many tokens it had to mint.

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use color_eyre::Result;
use time::Duration;
// self
use token_keeper::{
	Client, ClientError, ClientFuture, MemoryRepo, Repo, SharedToken, Token, TokenKeeper,
	TokenRecord,
};

#[derive(Debug, Default)]
struct CountingAuthority {
	minted: AtomicUsize,
}
impl CountingAuthority {
	async fn mint(&self) -> Result<SharedToken, ClientError> {
		let n = self.minted.fetch_add(1, Ordering::SeqCst) + 1;

		tokio::time::sleep(std::time::Duration::from_millis(100)).await;

		let record = TokenRecord::builder()
			.value(format!("demo-token-{n}"))
			.expires_in(Duration::minutes(15))
			.build()
			.map_err(ClientError::transport)?;

		Ok(record.shared())
	}
}
impl Client for CountingAuthority {
	fn new_token(&self) -> ClientFuture<'_, SharedToken> {
		Box::pin(self.mint())
	}

	fn refresh_token<'a>(&'a self, _stale: &'a SharedToken) -> ClientFuture<'a, SharedToken> {
		Box::pin(self.mint())
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let repo = MemoryRepo::new();
	let authority = Arc::new(CountingAuthority::default());
	let keepers = ["pod-a", "pod-b"].map(|name| {
		Arc::new(
			TokenKeeper::new(authority.clone())
				.with_repo(Arc::new(repo.clone()))
				.with_name(name),
		)
	});
	let handles = keepers
		.iter()
		.flat_map(|keeper| {
			(0..8).map(move |_| {
				let keeper = keeper.clone();

				tokio::spawn(async move { keeper.token().await })
			})
		})
		.collect::<Vec<_>>();

	for handle in handles {
		let token = handle.await?;

		token.validate()?;
		println!("received token {} expiring at {}", token.value(), token.expires());
	}

	let stored = repo.get_token().await?.map(|token| token.value().to_owned());

	println!("repo holds {stored:?}");
	println!("authority minted {} token(s)", authority.minted.load(Ordering::SeqCst));

	Ok(())
}
