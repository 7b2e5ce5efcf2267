pub mod cache;
pub mod search;

mod error;

pub use cache::{CacheState, CacheStatus, Snapshot, SnapshotCache};
pub use error::{Error, Result};
pub use search::{
	PageLimits, Pagination, RecordFilter, ScoredResult, Scores, SearchRequest, SearchResponse,
	paginate,
};

use std::{future::Future, pin::Pin, sync::Arc};

use mnemo_config::{Config, EmbeddingProviderConfig};
use mnemo_domain::Record;
use mnemo_remote::{RemoteClient, embedding};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One page of the remote listing, already projected into [`Record`]s.
#[derive(Debug, Clone, Default)]
pub struct RecordPage {
	pub records: Vec<Record>,
	pub next_cursor: Option<String>,
}

/// Read access to the remote memory store.
pub trait RemoteStore
where
	Self: Send + Sync,
{
	fn fetch_page<'a>(
		&'a self,
		cursor: Option<&'a str>,
	) -> BoxFuture<'a, mnemo_remote::Result<RecordPage>>;

	/// Best-effort. An empty result is never proof that nothing matches.
	fn raw_search<'a>(
		&'a self,
		text: &'a str,
		limit: u32,
	) -> BoxFuture<'a, mnemo_remote::Result<Vec<Record>>>;
}

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed_query<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, mnemo_remote::Result<Vec<f32>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub remote: Arc<dyn RemoteStore>,
	pub embedding: Arc<dyn EmbeddingProvider>,
}

pub struct MnemoService {
	pub cfg: Config,
	pub cache: SnapshotCache,
	pub providers: Providers,
}
impl MnemoService {
	pub fn new(cfg: Config) -> Result<Self> {
		let client = RemoteClient::new(&cfg.remote)
			.map_err(|err| Error::Provider { message: err.to_string() })?;
		let remote = HttpRemoteStore::new(client, cfg.search.shared_owner_id.clone());
		let providers =
			Providers { remote: Arc::new(remote), embedding: Arc::new(DefaultEmbedding) };

		Ok(Self::with_providers(cfg, providers))
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Self {
		let cache = SnapshotCache::new(&cfg.cache, providers.remote.clone());

		Self { cfg, cache, providers }
	}
}

/// [`RemoteStore`] over the HTTP client. Payloads are projected into records here, once per
/// fetched page.
pub struct HttpRemoteStore {
	client: RemoteClient,
	shared_owner_id: String,
}
impl HttpRemoteStore {
	pub fn new(client: RemoteClient, shared_owner_id: String) -> Self {
		Self { client, shared_owner_id }
	}
}

impl RemoteStore for HttpRemoteStore {
	fn fetch_page<'a>(
		&'a self,
		cursor: Option<&'a str>,
	) -> BoxFuture<'a, mnemo_remote::Result<RecordPage>> {
		Box::pin(async move {
			let page = self.client.fetch_page(cursor).await?;
			let records = page
				.items
				.into_iter()
				.map(|payload| payload.into_record(&self.shared_owner_id))
				.collect();

			Ok(RecordPage { records, next_cursor: page.next_cursor })
		})
	}

	fn raw_search<'a>(
		&'a self,
		text: &'a str,
		limit: u32,
	) -> BoxFuture<'a, mnemo_remote::Result<Vec<Record>>> {
		Box::pin(async move {
			let items = self.client.raw_search(text, limit).await?;

			Ok(items.into_iter().map(|payload| payload.into_record(&self.shared_owner_id)).collect())
		})
	}
}

struct DefaultEmbedding;

impl EmbeddingProvider for DefaultEmbedding {
	fn embed_query<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, mnemo_remote::Result<Vec<f32>>> {
		Box::pin(embedding::embed_query(cfg, text))
	}
}
