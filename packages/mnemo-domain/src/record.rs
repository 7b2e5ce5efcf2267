use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
	Interaction,
	Document,
}
impl RecordKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Interaction => "interaction",
			Self::Document => "document",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
	Solved,
	Unsolved,
	Partial,
	Revisited,
}

/// Shared projection of every backend record variant.
///
/// Variant-specific fields stay `None` on records that do not carry them, so "no rating" is
/// never confused with a low rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
	pub id: String,
	pub kind: RecordKind,
	pub owner_id: String,
	pub content: String,
	pub tags: BTreeSet<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub outcome: Option<Outcome>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub satisfaction_rating: Option<u8>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	#[serde(default, skip_serializing)]
	pub embedding: Option<Vec<f32>>,
}
impl Record {
	pub fn has_tags<'a, I>(&self, required: I) -> bool
	where
		I: IntoIterator<Item = &'a String>,
	{
		required.into_iter().all(|tag| self.tags.contains(tag))
	}
}

/// Canonical tag form shared by snapshot records and query filters.
pub fn normalize_tag(raw: &str) -> Option<String> {
	let trimmed = raw.trim();

	if trimmed.is_empty() {
		return None;
	}

	Some(trimmed.to_lowercase())
}
