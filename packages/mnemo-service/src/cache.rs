use std::{
	collections::HashSet,
	sync::{
		Arc, RwLock,
		atomic::{AtomicBool, AtomicU64, Ordering},
	},
	time::{Duration as StdDuration, Instant},
};

use serde::Serialize;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;

use mnemo_domain::Record;

use crate::{Error, RemoteStore, Result};

/// Immutable, point-in-time copy of the whole corpus.
#[derive(Debug)]
pub struct Snapshot {
	pub records: Vec<Record>,
	pub fetched_at: OffsetDateTime,
	pub ttl: Duration,
	pub pages: u32,
}
impl Snapshot {
	pub fn is_fresh(&self, now: OffsetDateTime) -> bool {
		now - self.fetched_at < self.ttl
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheState {
	Empty,
	Fetching,
	Warm,
	Stale,
	/// The latest refresh failed and there is no snapshot to serve. The next query retries.
	Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
	pub state: CacheState,
	pub record_count: usize,
	#[serde(with = "time::serde::rfc3339::option")]
	pub fetched_at: Option<OffsetDateTime>,
	pub last_error: Option<String>,
	pub refreshes: u64,
}

#[derive(Default)]
struct RefreshLedger {
	/// Error of the latest refresh when it left the cache without any snapshot.
	last_failure: Option<Error>,
}

/// Holds the published [`Snapshot`] and rebuilds it from the remote store on expiry.
///
/// At most one refresh runs at a time. Callers arriving while a refresh is in flight wait for it
/// and share its outcome instead of starting their own listing.
pub struct SnapshotCache {
	store: Arc<dyn RemoteStore>,
	ttl: Duration,
	refresh_timeout: StdDuration,
	max_pages: u32,
	current: RwLock<Option<Arc<Snapshot>>>,
	refresh_gate: Mutex<RefreshLedger>,
	completed_refreshes: AtomicU64,
	refreshing: AtomicBool,
	last_error: RwLock<Option<String>>,
}
impl SnapshotCache {
	pub fn new(cfg: &mnemo_config::Cache, store: Arc<dyn RemoteStore>) -> Self {
		Self {
			store,
			ttl: Duration::seconds(cfg.ttl_seconds.min(i64::MAX as u64) as i64),
			refresh_timeout: StdDuration::from_millis(cfg.refresh_timeout_ms),
			max_pages: cfg.max_pages,
			current: RwLock::new(None),
			refresh_gate: Mutex::new(RefreshLedger::default()),
			completed_refreshes: AtomicU64::new(0),
			refreshing: AtomicBool::new(false),
			last_error: RwLock::new(None),
		}
	}

	/// Returns the published snapshot while it is fresh, refreshing it otherwise.
	///
	/// A failed refresh serves the previous snapshot when one exists and only errors when the
	/// cache has never been populated.
	pub async fn get(&self) -> Result<Arc<Snapshot>> {
		if let Some(snapshot) = self.current()
			&& snapshot.is_fresh(OffsetDateTime::now_utc())
		{
			return Ok(snapshot);
		}

		let observed = self.completed_refreshes.load(Ordering::Acquire);
		let mut ledger = self.refresh_gate.lock().await;

		if let Some(snapshot) = self.current()
			&& snapshot.is_fresh(OffsetDateTime::now_utc())
		{
			return Ok(snapshot);
		}

		self.refresh_or_join(&mut ledger, observed).await
	}

	/// Rebuilds the snapshot regardless of its age. Joins a refresh that is already running.
	pub async fn refresh(&self) -> Result<Arc<Snapshot>> {
		let observed = self.completed_refreshes.load(Ordering::Acquire);
		let mut ledger = self.refresh_gate.lock().await;

		self.refresh_or_join(&mut ledger, observed).await
	}

	pub fn current(&self) -> Option<Arc<Snapshot>> {
		self.current.read().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn status(&self) -> CacheStatus {
		let snapshot = self.current();
		let last_error = self.last_error.read().unwrap_or_else(|err| err.into_inner()).clone();
		let state = if self.refreshing.load(Ordering::Acquire) {
			CacheState::Fetching
		} else {
			match snapshot.as_ref() {
				None if last_error.is_some() => CacheState::Error,
				None => CacheState::Empty,
				Some(snapshot) if snapshot.is_fresh(OffsetDateTime::now_utc()) => CacheState::Warm,
				Some(_) => CacheState::Stale,
			}
		};

		CacheStatus {
			state,
			record_count: snapshot.as_ref().map(|snapshot| snapshot.records.len()).unwrap_or(0),
			fetched_at: snapshot.as_ref().map(|snapshot| snapshot.fetched_at),
			last_error,
			refreshes: self.completed_refreshes.load(Ordering::Acquire),
		}
	}

	async fn refresh_or_join(
		&self,
		ledger: &mut RefreshLedger,
		observed: u64,
	) -> Result<Arc<Snapshot>> {
		if self.completed_refreshes.load(Ordering::Acquire) != observed {
			// A refresh finished while this caller waited for the gate.
			return match self.current() {
				Some(snapshot) => Ok(snapshot),
				None => Err(ledger.last_failure.clone().unwrap_or_else(|| Error::CacheRefresh {
					message: "No snapshot is available.".to_string(),
				})),
			};
		}

		let result = self.run_refresh(ledger).await;

		self.completed_refreshes.fetch_add(1, Ordering::AcqRel);

		result
	}

	async fn run_refresh(&self, ledger: &mut RefreshLedger) -> Result<Arc<Snapshot>> {
		let started = Instant::now();
		let outcome = {
			let _guard = RefreshingGuard::set(&self.refreshing);

			match tokio::time::timeout(self.refresh_timeout, self.build_snapshot()).await {
				Ok(outcome) => outcome,
				Err(_) => Err(mnemo_remote::Error::Transient {
					message: format!(
						"Snapshot refresh timed out after {} ms.",
						self.refresh_timeout.as_millis()
					),
					status: None,
				}),
			}
		};

		match outcome {
			Ok(snapshot) => {
				let snapshot = Arc::new(snapshot);

				tracing::info!(
					records = snapshot.records.len(),
					pages = snapshot.pages,
					elapsed_ms = started.elapsed().as_millis() as u64,
					"Snapshot published."
				);

				*self.current.write().unwrap_or_else(|err| err.into_inner()) =
					Some(snapshot.clone());
				*self.last_error.write().unwrap_or_else(|err| err.into_inner()) = None;
				ledger.last_failure = None;

				Ok(snapshot)
			},
			Err(err) => {
				let failure = Error::from_refresh_failure(err);

				*self.last_error.write().unwrap_or_else(|err| err.into_inner()) =
					Some(failure.to_string());

				match self.current() {
					Some(stale) => {
						tracing::warn!(
							error = %failure,
							fetched_at = %stale.fetched_at,
							records = stale.records.len(),
							"Snapshot refresh failed, serving stale snapshot."
						);

						ledger.last_failure = None;

						Ok(stale)
					},
					None => {
						tracing::error!(error = %failure, "Snapshot refresh failed with no snapshot to serve.");

						ledger.last_failure = Some(failure.clone());

						Err(failure)
					},
				}
			},
		}
	}

	async fn build_snapshot(&self) -> mnemo_remote::Result<Snapshot> {
		let mut records = Vec::new();
		let mut seen_ids = HashSet::new();
		let mut seen_cursors = HashSet::new();
		let mut cursor: Option<String> = None;
		let mut pages = 0_u32;
		let mut duplicates = 0_usize;

		tracing::info!("Snapshot refresh started.");

		loop {
			if pages >= self.max_pages {
				return Err(mnemo_remote::Error::InvalidResponse {
					message: format!("Listing did not terminate within {} pages.", self.max_pages),
				});
			}

			let page = self.store.fetch_page(cursor.as_deref()).await?;

			pages += 1;

			for record in page.records {
				if seen_ids.insert(record.id.clone()) {
					records.push(record);
				} else {
					duplicates += 1;
				}
			}

			match page.next_cursor {
				None => break,
				Some(next) => {
					if !seen_cursors.insert(next.clone()) {
						return Err(mnemo_remote::Error::InvalidResponse {
							message: format!("Listing repeated cursor {next:?}."),
						});
					}

					cursor = Some(next);
				},
			}
		}

		if duplicates > 0 {
			tracing::warn!(duplicates, "Listing returned duplicate record ids, kept first occurrences.");
		}

		Ok(Snapshot { records, fetched_at: OffsetDateTime::now_utc(), ttl: self.ttl, pages })
	}
}

struct RefreshingGuard<'a>(&'a AtomicBool);
impl<'a> RefreshingGuard<'a> {
	fn set(flag: &'a AtomicBool) -> Self {
		flag.store(true, Ordering::Release);

		Self(flag)
	}
}

impl Drop for RefreshingGuard<'_> {
	fn drop(&mut self) {
		self.0.store(false, Ordering::Release);
	}
}
