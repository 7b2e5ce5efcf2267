use std::collections::BTreeSet;

use time::macros::datetime;

use mnemo_domain::{Outcome, Record, RecordKind, normalize_tag};

fn record(tags: &[&str]) -> Record {
	Record {
		id: "int-1".to_string(),
		kind: RecordKind::Interaction,
		owner_id: "user-1".to_string(),
		content: "Resolved the deploy failure.".to_string(),
		tags: tags.iter().map(|tag| tag.to_string()).collect::<BTreeSet<_>>(),
		outcome: Some(Outcome::Partial),
		satisfaction_rating: None,
		created_at: datetime!(2026-03-01 12:00:00 UTC),
		embedding: Some(vec![0.1, 0.2]),
	}
}

#[test]
fn record_serializes_public_projection() {
	let json = serde_json::to_value(record(&["deploy"])).expect("serialize failed");

	assert_eq!(json["ownerId"], "user-1");
	assert_eq!(json["kind"], "interaction");
	assert_eq!(json["outcome"], "partial");
	assert_eq!(json["createdAt"], "2026-03-01T12:00:00Z");
	assert!(json.get("satisfactionRating").is_none());
	assert!(json.get("embedding").is_none());
}

#[test]
fn has_tags_requires_every_tag() {
	let record = record(&["a", "b", "c"]);
	let ab = vec!["a".to_string(), "b".to_string()];
	let ad = vec!["a".to_string(), "d".to_string()];

	assert!(record.has_tags(&ab));
	assert!(!record.has_tags(&ad));
	assert!(record.has_tags(&Vec::<String>::new()));
}

#[test]
fn normalize_tag_trims_and_lowercases() {
	assert_eq!(normalize_tag("  Billing "), Some("billing".to_string()));
	assert_eq!(normalize_tag("   "), None);
}

#[test]
fn created_at_accepts_rfc3339_offsets() {
	let json = serde_json::json!({
		"id": "doc-1",
		"kind": "document",
		"ownerId": "system",
		"content": "Runbook.",
		"tags": [],
		"createdAt": "2026-03-01T14:00:00+02:00"
	});
	let record: Record = serde_json::from_value(json).expect("deserialize failed");

	assert_eq!(record.created_at, datetime!(2026-03-01 12:00:00 UTC));
	assert!(serde_json::from_value::<Record>(serde_json::json!({
		"id": "doc-1",
		"kind": "document",
		"ownerId": "system",
		"content": "Runbook.",
		"tags": [],
		"createdAt": "yesterday"
	}))
	.is_err());
}
