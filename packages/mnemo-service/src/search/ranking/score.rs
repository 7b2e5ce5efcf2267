use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use mnemo_config::{Ranking, RankingRecency, RankingSatisfaction, RankingWeights};
use mnemo_domain::Record;

use crate::search::ranking::text;

/// Per-record score components, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scores {
	pub semantic_score: f32,
	pub keyword_score: f32,
	pub recency_score: f32,
	pub satisfaction_score: f32,
	pub final_score: f32,
}

/// Query-side inputs prepared once and reused for every candidate.
#[derive(Debug, Clone)]
pub struct ScoringQuery {
	pub tokens: Vec<String>,
	pub embedding: Option<Vec<f32>>,
}
impl ScoringQuery {
	pub fn new(ranking: &Ranking, text: &str, embedding: Option<Vec<f32>>) -> Self {
		Self {
			tokens: text::keyword_tokens(text, ranking.min_token_chars as usize),
			embedding: embedding.filter(|values| !values.is_empty()),
		}
	}
}

pub fn score(ranking: &Ranking, query: &ScoringQuery, record: &Record, now: OffsetDateTime) -> Scores {
	let keyword_score = text::keyword_overlap(&query.tokens, record);
	// Without both embeddings the keyword signal stands in for semantic similarity.
	let semantic_score = match (query.embedding.as_deref(), record.embedding.as_deref()) {
		(Some(query_vec), Some(record_vec)) =>
			normalized_cosine(query_vec, record_vec).unwrap_or(keyword_score),
		_ => keyword_score,
	};
	let recency_score = recency_score(&ranking.recency, now - record.created_at);
	let satisfaction_score = satisfaction_score(&ranking.satisfaction, record.satisfaction_rating);
	let final_score = combine(
		&ranking.weights,
		semantic_score,
		keyword_score,
		recency_score,
		satisfaction_score,
	);

	Scores { semantic_score, keyword_score, recency_score, satisfaction_score, final_score }
}

pub fn combine(
	weights: &RankingWeights,
	semantic: f32,
	keyword: f32,
	recency: f32,
	satisfaction: f32,
) -> f32 {
	let total = weights.semantic * semantic
		+ weights.keyword * keyword
		+ weights.recency * recency
		+ weights.satisfaction * satisfaction;

	total.clamp(0.0, 1.0)
}

/// Cosine similarity mapped from `[-1, 1]` onto `[0, 1]`. `None` when the vectors cannot be
/// compared.
pub fn normalized_cosine(a: &[f32], b: &[f32]) -> Option<f32> {
	if a.is_empty() || a.len() != b.len() {
		return None;
	}

	let mut dot = 0.0_f64;
	let mut norm_a = 0.0_f64;
	let mut norm_b = 0.0_f64;

	for (x, y) in a.iter().zip(b) {
		let (x, y) = (f64::from(*x), f64::from(*y));

		dot += x * y;
		norm_a += x * x;
		norm_b += y * y;
	}

	if norm_a == 0.0 || norm_b == 0.0 {
		return None;
	}

	let cosine = dot / (norm_a.sqrt() * norm_b.sqrt());

	Some((((cosine + 1.0) / 2.0) as f32).clamp(0.0, 1.0))
}

pub fn recency_score(cfg: &RankingRecency, age: Duration) -> f32 {
	if age < Duration::days(i64::from(cfg.day_days)) {
		cfg.day_score
	} else if age < Duration::days(i64::from(cfg.week_days)) {
		cfg.week_score
	} else if age <= Duration::days(i64::from(cfg.month_days)) {
		cfg.month_score
	} else {
		cfg.older_score
	}
}

pub fn satisfaction_score(cfg: &RankingSatisfaction, rating: Option<u8>) -> f32 {
	match rating {
		Some(rating @ 1..=5) => cfg.by_rating[usize::from(rating) - 1],
		_ => cfg.absent,
	}
}
