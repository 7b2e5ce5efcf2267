use std::collections::BTreeSet;

use mnemo_domain::{Outcome, Record, RecordKind};

/// Structured constraints applied to every candidate before scoring.
#[derive(Debug, Clone)]
pub struct RecordFilter {
	pub owner_id: String,
	/// Records owned by this id are visible to every owner.
	pub shared_owner_id: String,
	pub kind: Option<RecordKind>,
	/// Every tag must be present on the record.
	pub tags: BTreeSet<String>,
	pub outcome: Option<Outcome>,
}
impl RecordFilter {
	pub fn matches(&self, record: &Record) -> bool {
		if record.owner_id != self.owner_id && record.owner_id != self.shared_owner_id {
			return false;
		}
		if let Some(kind) = self.kind
			&& record.kind != kind
		{
			return false;
		}
		if let Some(outcome) = self.outcome
			&& record.outcome != Some(outcome)
		{
			return false;
		}

		record.has_tags(&self.tags)
	}
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;

	fn record(id: &str, kind: RecordKind, owner_id: &str, tags: &[&str]) -> Record {
		Record {
			id: id.to_string(),
			kind,
			owner_id: owner_id.to_string(),
			content: String::new(),
			tags: tags.iter().map(|tag| tag.to_string()).collect(),
			outcome: match kind {
				RecordKind::Interaction => Some(Outcome::Solved),
				RecordKind::Document => None,
			},
			satisfaction_rating: None,
			created_at: datetime!(2026-01-01 00:00 UTC),
			embedding: None,
		}
	}

	fn filter() -> RecordFilter {
		RecordFilter {
			owner_id: "u1".to_string(),
			shared_owner_id: "system".to_string(),
			kind: None,
			tags: BTreeSet::new(),
			outcome: None,
		}
	}

	#[test]
	fn owner_scope_includes_shared_records() {
		let filter = filter();

		assert!(filter.matches(&record("a", RecordKind::Interaction, "u1", &[])));
		assert!(filter.matches(&record("b", RecordKind::Document, "system", &[])));
		assert!(!filter.matches(&record("c", RecordKind::Interaction, "u2", &[])));
	}

	#[test]
	fn tags_use_and_semantics() {
		let filter = RecordFilter {
			tags: ["a".to_string(), "b".to_string()].into_iter().collect(),
			..filter()
		};

		assert!(filter.matches(&record("x", RecordKind::Document, "u1", &["a", "b", "c"])));
		assert!(!filter.matches(&record("y", RecordKind::Document, "u1", &["a"])));
		assert!(!filter.matches(&record("z", RecordKind::Document, "u1", &["b", "c"])));
	}

	#[test]
	fn kind_and_outcome_are_exact() {
		let filter = RecordFilter {
			kind: Some(RecordKind::Interaction),
			outcome: Some(Outcome::Solved),
			..filter()
		};

		assert!(filter.matches(&record("a", RecordKind::Interaction, "u1", &[])));
		assert!(!filter.matches(&record("b", RecordKind::Document, "u1", &[])));

		let unsolved = RecordFilter { outcome: Some(Outcome::Unsolved), ..filter };

		assert!(!unsolved.matches(&record("c", RecordKind::Interaction, "u1", &[])));
	}
}
