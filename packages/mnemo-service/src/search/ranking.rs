mod score;
mod text;

pub use score::{
	Scores, ScoringQuery, combine, normalized_cosine, recency_score, satisfaction_score, score,
};
pub use text::{keyword_overlap, keyword_tokens};

use std::cmp::Ordering;

use time::OffsetDateTime;

use mnemo_config::Ranking;
use mnemo_domain::Record;

#[derive(Debug, Clone, Copy)]
pub struct RankedRecord<'a> {
	pub record: &'a Record,
	pub scores: Scores,
}

/// Scores every candidate and orders them by final score, then recency, then id.
pub fn rank<'a, I>(
	ranking: &Ranking,
	query: &ScoringQuery,
	candidates: I,
	now: OffsetDateTime,
) -> Vec<RankedRecord<'a>>
where
	I: IntoIterator<Item = &'a Record>,
{
	let mut ranked: Vec<RankedRecord<'a>> = candidates
		.into_iter()
		.map(|record| RankedRecord { record, scores: score(ranking, query, record, now) })
		.collect();

	ranked.sort_by(cmp_ranked);

	ranked
}

pub fn cmp_ranked(a: &RankedRecord<'_>, b: &RankedRecord<'_>) -> Ordering {
	cmp_f32_desc(a.scores.final_score, b.scores.final_score)
		.then_with(|| cmp_f32_desc(a.scores.recency_score, b.scores.recency_score))
		.then_with(|| a.record.id.cmp(&b.record.id))
}

pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeSet;

	use time::{Duration, macros::datetime};

	use super::*;
	use mnemo_domain::RecordKind;

	fn record(id: &str, content: &str, age: Duration) -> Record {
		Record {
			id: id.to_string(),
			kind: RecordKind::Document,
			owner_id: "system".to_string(),
			content: content.to_string(),
			tags: BTreeSet::new(),
			outcome: None,
			satisfaction_rating: None,
			created_at: datetime!(2026-05-01 00:00 UTC) - age,
			embedding: None,
		}
	}

	#[test]
	fn orders_by_score_then_recency_then_id() {
		let ranking = Ranking::default();
		let query = ScoringQuery::new(&ranking, "kubernetes upgrade", None);
		let records = vec![
			record("c", "nothing relevant", Duration::hours(1)),
			record("b", "kubernetes upgrade notes", Duration::days(40)),
			record("a", "kubernetes upgrade notes", Duration::days(40)),
			record("d", "kubernetes upgrade notes", Duration::hours(2)),
		];
		let ranked = rank(&ranking, &query, &records, datetime!(2026-05-01 00:00 UTC));
		let ids: Vec<&str> = ranked.iter().map(|item| item.record.id.as_str()).collect();

		assert_eq!(ids, vec!["d", "a", "b", "c"]);
	}

	#[test]
	fn nan_sorts_last() {
		assert_eq!(cmp_f32_desc(f32::NAN, 0.1), Ordering::Greater);
		assert_eq!(cmp_f32_desc(0.9, 0.1), Ordering::Less);
	}
}
