use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::record::{Outcome, Record, RecordKind, normalize_tag};

/// Raw item shapes returned by the remote memory store, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RemotePayload {
	Interaction(InteractionPayload),
	Document(DocumentPayload),
}
impl RemotePayload {
	pub fn from_value(value: Value) -> serde_json::Result<Self> {
		serde_json::from_value(value)
	}

	pub fn id(&self) -> &str {
		match self {
			Self::Interaction(payload) => &payload.id,
			Self::Document(payload) => &payload.id,
		}
	}

	/// Projects the payload into a [`Record`]. Documents without an owner fall back to
	/// `shared_owner_id`.
	pub fn into_record(self, shared_owner_id: &str) -> Record {
		match self {
			Self::Interaction(payload) => {
				let content = match payload.question.as_deref().map(str::trim) {
					Some(question) if !question.is_empty() =>
						format!("{question}\n\n{}", payload.summary.trim()),
					_ => payload.summary.trim().to_string(),
				};

				Record {
					id: payload.id,
					kind: RecordKind::Interaction,
					owner_id: payload.user_id,
					content,
					tags: collect_tags(payload.tags),
					outcome: payload.outcome,
					satisfaction_rating: payload
						.satisfaction_rating
						.filter(|rating| (1..=5).contains(rating))
						.map(|rating| rating as u8),
					created_at: payload.created_at,
					embedding: non_empty_embedding(payload.embedding),
				}
			},
			Self::Document(payload) => {
				let content = match payload.title.as_deref().map(str::trim) {
					Some(title) if !title.is_empty() =>
						format!("{title}\n\n{}", payload.content.trim()),
					_ => payload.content.trim().to_string(),
				};
				let owner_id = payload
					.owner_id
					.filter(|owner| !owner.trim().is_empty())
					.unwrap_or_else(|| shared_owner_id.to_string());

				Record {
					id: payload.id,
					kind: RecordKind::Document,
					owner_id,
					content,
					tags: collect_tags(payload.tags),
					outcome: None,
					satisfaction_rating: None,
					created_at: payload.created_at,
					embedding: non_empty_embedding(payload.embedding),
				}
			},
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionPayload {
	pub id: String,
	pub user_id: String,
	pub summary: String,
	#[serde(default)]
	pub question: Option<String>,
	#[serde(default)]
	pub tags: Option<Vec<String>>,
	#[serde(default)]
	pub outcome: Option<Outcome>,
	#[serde(default)]
	pub satisfaction_rating: Option<i64>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	#[serde(default)]
	pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentPayload {
	pub id: String,
	#[serde(default)]
	pub owner_id: Option<String>,
	#[serde(default)]
	pub title: Option<String>,
	pub content: String,
	#[serde(default)]
	pub tags: Option<Vec<String>>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	#[serde(default)]
	pub embedding: Option<Vec<f32>>,
}

fn collect_tags(tags: Option<Vec<String>>) -> BTreeSet<String> {
	tags.unwrap_or_default().iter().filter_map(|tag| normalize_tag(tag)).collect()
}

fn non_empty_embedding(embedding: Option<Vec<f32>>) -> Option<Vec<f32>> {
	embedding.filter(|values| !values.is_empty() && values.iter().all(|value| value.is_finite()))
}
