use std::{
	collections::BTreeSet,
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration as StdDuration,
};

use serde_json::Map;
use time::{Duration, OffsetDateTime};

use mnemo_config::{Cache, Config, Providers, Ranking, Remote, Retry, Search, Service};
use mnemo_domain::{Outcome, Record, RecordKind};
use mnemo_remote::Error as RemoteError;
use mnemo_service::{
	BoxFuture, EmbeddingProvider, MnemoService, Providers as ServiceProviders, RecordPage,
	RemoteStore,
};

/// Scriptable in-memory remote store with fault injection and call counters.
#[derive(Default)]
pub struct FakeRemoteStore {
	state: Mutex<FakeState>,
	list_sequences: AtomicUsize,
	page_calls: AtomicUsize,
	search_calls: AtomicUsize,
}

#[derive(Default)]
struct FakeState {
	records: Vec<Record>,
	page_size: usize,
	list_failure: Option<RemoteError>,
	search_results: Vec<Record>,
	search_failure: Option<RemoteError>,
	delay: StdDuration,
}

impl FakeRemoteStore {
	pub fn new(records: Vec<Record>, page_size: usize) -> Arc<Self> {
		let store = Self::default();

		{
			let mut state = store.lock();

			state.records = records;
			state.page_size = page_size.max(1);
		}

		Arc::new(store)
	}

	pub fn set_records(&self, records: Vec<Record>) {
		self.lock().records = records;
	}

	/// Every page fetch fails with `err` until cleared with `None`.
	pub fn fail_list(&self, err: Option<RemoteError>) {
		self.lock().list_failure = err;
	}

	pub fn set_search_results(&self, records: Vec<Record>) {
		self.lock().search_results = records;
	}

	pub fn fail_search(&self, err: Option<RemoteError>) {
		self.lock().search_failure = err;
	}

	/// Latency added to every page fetch.
	pub fn set_delay(&self, delay: StdDuration) {
		self.lock().delay = delay;
	}

	/// Number of listings started from the first page.
	pub fn list_sequences(&self) -> usize {
		self.list_sequences.load(Ordering::SeqCst)
	}

	pub fn page_calls(&self) -> usize {
		self.page_calls.load(Ordering::SeqCst)
	}

	pub fn search_calls(&self) -> usize {
		self.search_calls.load(Ordering::SeqCst)
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
		self.state.lock().unwrap_or_else(|err| err.into_inner())
	}

	fn page(&self, cursor: Option<&str>) -> Result<RecordPage, RemoteError> {
		let state = self.lock();

		if let Some(err) = state.list_failure.clone() {
			return Err(err);
		}

		let start = match cursor {
			None => 0,
			Some(raw) => raw.strip_prefix("offset-").and_then(|value| value.parse().ok()).ok_or_else(
				|| RemoteError::Permanent {
					message: format!("Unknown cursor {raw:?}."),
					status: Some(400),
				},
			)?,
		};
		let end = (start + state.page_size).min(state.records.len());
		let records = state.records.get(start..end).map(<[Record]>::to_vec).unwrap_or_default();
		let next_cursor = (end < state.records.len()).then(|| format!("offset-{end}"));

		Ok(RecordPage { records, next_cursor })
	}
}

impl RemoteStore for FakeRemoteStore {
	fn fetch_page<'a>(
		&'a self,
		cursor: Option<&'a str>,
	) -> BoxFuture<'a, mnemo_remote::Result<RecordPage>> {
		self.page_calls.fetch_add(1, Ordering::SeqCst);

		if cursor.is_none() {
			self.list_sequences.fetch_add(1, Ordering::SeqCst);
		}

		let delay = self.lock().delay;

		Box::pin(async move {
			if !delay.is_zero() {
				tokio::time::sleep(delay).await;
			}

			self.page(cursor)
		})
	}

	fn raw_search<'a>(
		&'a self,
		_text: &'a str,
		limit: u32,
	) -> BoxFuture<'a, mnemo_remote::Result<Vec<Record>>> {
		self.search_calls.fetch_add(1, Ordering::SeqCst);

		let state = self.lock();
		let result = match state.search_failure.clone() {
			Some(err) => Err(err),
			None => Ok(state.search_results.iter().take(limit as usize).cloned().collect()),
		};

		Box::pin(async move { result })
	}
}

/// Returns the same vector for every query and counts calls.
pub struct FixedEmbedding {
	pub vector: Vec<f32>,
	pub calls: AtomicUsize,
}
impl FixedEmbedding {
	pub fn new(vector: Vec<f32>) -> Arc<Self> {
		Arc::new(Self { vector, calls: AtomicUsize::new(0) })
	}
}

impl EmbeddingProvider for FixedEmbedding {
	fn embed_query<'a>(
		&'a self,
		_cfg: &'a mnemo_config::EmbeddingProviderConfig,
		_text: &'a str,
	) -> BoxFuture<'a, mnemo_remote::Result<Vec<f32>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let vector = self.vector.clone();

		Box::pin(async move { Ok(vector) })
	}
}

pub fn transient_error() -> RemoteError {
	RemoteError::Transient { message: "HTTP 500 Internal Server Error.".to_string(), status: Some(500) }
}

pub fn test_config() -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			admin_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
		},
		remote: Remote {
			api_base: "http://127.0.0.1:9".to_string(),
			api_key: "test-key".to_string(),
			list_path: "/v1/memories".to_string(),
			search_path: "/v1/memories/search".to_string(),
			page_size: 10,
			timeout_ms: 1_000,
			default_headers: Map::new(),
			retry: Retry { max_retries: 0, base_backoff_ms: 1, max_backoff_ms: 1 },
		},
		cache: Cache::default(),
		search: Search { native_search: false, ..Search::default() },
		ranking: Ranking::default(),
		providers: Providers::default(),
	}
}

pub fn service(cfg: Config, store: Arc<FakeRemoteStore>) -> MnemoService {
	service_with_embedding(cfg, store, FixedEmbedding::new(vec![1.0, 0.0]))
}

pub fn service_with_embedding(
	cfg: Config,
	store: Arc<FakeRemoteStore>,
	embedding: Arc<dyn EmbeddingProvider>,
) -> MnemoService {
	MnemoService::with_providers(cfg, ServiceProviders { remote: store, embedding })
}

/// Builder for snapshot records.
pub struct RecordBuilder {
	record: Record,
}
impl RecordBuilder {
	pub fn interaction(id: &str, owner_id: &str, content: &str) -> Self {
		Self::new(id, RecordKind::Interaction, owner_id, content)
	}

	pub fn document(id: &str, content: &str) -> Self {
		Self::new(id, RecordKind::Document, "system", content)
	}

	fn new(id: &str, kind: RecordKind, owner_id: &str, content: &str) -> Self {
		Self {
			record: Record {
				id: id.to_string(),
				kind,
				owner_id: owner_id.to_string(),
				content: content.to_string(),
				tags: BTreeSet::new(),
				outcome: None,
				satisfaction_rating: None,
				created_at: OffsetDateTime::now_utc(),
				embedding: None,
			},
		}
	}

	pub fn owner(mut self, owner_id: &str) -> Self {
		self.record.owner_id = owner_id.to_string();

		self
	}

	pub fn tags(mut self, tags: &[&str]) -> Self {
		self.record.tags = tags.iter().map(|tag| tag.to_string()).collect();

		self
	}

	pub fn outcome(mut self, outcome: Outcome) -> Self {
		self.record.outcome = Some(outcome);

		self
	}

	pub fn rating(mut self, rating: u8) -> Self {
		self.record.satisfaction_rating = Some(rating);

		self
	}

	pub fn age(mut self, age: Duration) -> Self {
		self.record.created_at = OffsetDateTime::now_utc() - age;

		self
	}

	pub fn embedding(mut self, embedding: Vec<f32>) -> Self {
		self.record.embedding = Some(embedding);

		self
	}

	pub fn build(self) -> Record {
		self.record
	}
}
