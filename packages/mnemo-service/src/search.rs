pub mod filter;
pub mod paginate;
pub mod ranking;

pub use filter::RecordFilter;
pub use paginate::{PageLimits, Pagination, paginate};
pub use ranking::{RankedRecord, Scores, ScoringQuery};

use std::{collections::HashSet, sync::Arc};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use mnemo_domain::{Outcome, Record, RecordKind, normalize_tag};

use crate::{Error, MnemoService, Result, Snapshot};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
	pub text: String,
	pub owner_id: String,
	#[serde(default)]
	pub kind: Option<RecordKind>,
	/// Every listed tag must be present. `null` and an empty list both mean no tag filter.
	#[serde(default)]
	pub tags: Option<Vec<String>>,
	#[serde(default)]
	pub outcome: Option<Outcome>,
	#[serde(default)]
	pub offset: Option<i64>,
	#[serde(default)]
	pub limit: Option<i64>,
	/// Precomputed query embedding. When absent the configured embedding provider is asked.
	#[serde(default)]
	pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredResult {
	pub record: Record,
	#[serde(flatten)]
	pub scores: Scores,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
	pub results: Vec<ScoredResult>,
	pub total: usize,
	pub has_more: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub next_offset: Option<usize>,
}

/// Where the candidate set of a query came from.
enum Candidates {
	Native(Vec<Record>),
	Snapshot(Arc<Snapshot>),
}
impl Candidates {
	fn label(&self) -> &'static str {
		match self {
			Self::Native(_) => "native",
			Self::Snapshot(_) => "snapshot",
		}
	}
}

impl MnemoService {
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let filter = self.build_filter(&req)?;
		let embedding = self.resolve_query_embedding(&req).await;
		let query = ScoringQuery::new(&self.cfg.ranking, &req.text, embedding);
		let candidates = self.resolve_candidates(&req.text, &filter).await?;
		let now = OffsetDateTime::now_utc();
		let ranked = match &candidates {
			Candidates::Native(records) => ranking::rank(&self.cfg.ranking, &query, records, now),
			Candidates::Snapshot(snapshot) => ranking::rank(
				&self.cfg.ranking,
				&query,
				snapshot.records.iter().filter(|record| filter.matches(record)),
				now,
			),
		};
		let limits = PageLimits::from_config(&self.cfg.search);
		let page = paginate(&ranked, req.offset, req.limit, &limits);

		tracing::debug!(
			source = candidates.label(),
			total = page.total,
			returned = page.results.len(),
			semantic = query.embedding.is_some(),
			"Search ranked."
		);

		Ok(SearchResponse {
			results: page
				.results
				.iter()
				.map(|item| ScoredResult { record: item.record.clone(), scores: item.scores })
				.collect(),
			total: page.total,
			has_more: page.has_more,
			next_offset: page.next_offset,
		})
	}

	fn build_filter(&self, req: &SearchRequest) -> Result<RecordFilter> {
		let owner_id = req.owner_id.trim();

		if owner_id.is_empty() {
			return Err(Error::InvalidRequest { message: "ownerId is required.".to_string() });
		}

		Ok(RecordFilter {
			owner_id: owner_id.to_string(),
			shared_owner_id: self.cfg.search.shared_owner_id.clone(),
			kind: req.kind,
			tags: req.tags.iter().flatten().filter_map(|tag| normalize_tag(tag)).collect(),
			outcome: req.outcome,
		})
	}

	async fn resolve_query_embedding(&self, req: &SearchRequest) -> Option<Vec<f32>> {
		if let Some(embedding) = req.embedding.as_ref().filter(|values| !values.is_empty()) {
			return Some(embedding.clone());
		}

		let cfg = self.cfg.providers.embedding.as_ref()?;

		if req.text.trim().is_empty() {
			return None;
		}

		match self.providers.embedding.embed_query(cfg, &req.text).await {
			Ok(embedding) => Some(embedding),
			Err(err) => {
				tracing::warn!(error = %err, "Query embedding failed, scoring in keyword mode.");

				None
			},
		}
	}

	/// Native search first. Its results are only trusted when something survives the filter;
	/// otherwise the full snapshot is scored.
	async fn resolve_candidates(&self, text: &str, filter: &RecordFilter) -> Result<Candidates> {
		if self.cfg.search.native_search && !text.trim().is_empty() {
			match self
				.providers
				.remote
				.raw_search(text, self.cfg.search.native_search_limit)
				.await
			{
				Ok(records) => {
					let returned = records.len();
					let mut seen = HashSet::new();
					let matched: Vec<Record> = records
						.into_iter()
						.filter(|record| filter.matches(record) && seen.insert(record.id.clone()))
						.collect();

					if !matched.is_empty() {
						return Ok(Candidates::Native(matched));
					}

					tracing::info!(returned, "Native search yielded no usable candidates, scoring snapshot.");
				},
				Err(err) => {
					tracing::warn!(error = %err, "Native search failed, scoring snapshot.");
				},
			}
		}

		Ok(Candidates::Snapshot(self.cache.get().await?))
	}
}
