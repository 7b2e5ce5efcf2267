use mnemo_domain::Record;

/// Lowercased query tokens of at least `min_chars` characters, split on anything that is not
/// alphanumeric. Repeated words are kept, each occurrence counts toward the overlap.
pub fn keyword_tokens(query: &str, min_chars: usize) -> Vec<String> {
	let mut normalized = String::with_capacity(query.len());

	for ch in query.chars() {
		if ch.is_alphanumeric() {
			normalized.extend(ch.to_lowercase());
		} else {
			normalized.push(' ');
		}
	}

	normalized
		.split_whitespace()
		.filter(|token| token.chars().count() >= min_chars)
		.map(str::to_string)
		.collect()
}

/// Share of `tokens` found as substrings of the record content or of any tag.
pub fn keyword_overlap(tokens: &[String], record: &Record) -> f32 {
	if tokens.is_empty() {
		return 0.0;
	}

	let content = record.content.to_lowercase();
	let mut matched = 0_usize;

	for token in tokens {
		if content.contains(token.as_str()) || record.tags.iter().any(|tag| tag.contains(token.as_str()))
		{
			matched += 1;
		}
	}

	matched as f32 / tokens.len() as f32
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeSet;

	use time::macros::datetime;

	use super::*;
	use mnemo_domain::RecordKind;

	fn record(content: &str, tags: &[&str]) -> Record {
		Record {
			id: "r1".to_string(),
			kind: RecordKind::Document,
			owner_id: "system".to_string(),
			content: content.to_string(),
			tags: tags.iter().map(|tag| tag.to_string()).collect::<BTreeSet<_>>(),
			outcome: None,
			satisfaction_rating: None,
			created_at: datetime!(2026-01-01 00:00 UTC),
			embedding: None,
		}
	}

	#[test]
	fn tokens_split_on_punctuation_and_drop_short_words() {
		assert_eq!(
			keyword_tokens("How do I reset the VPN-client's token? token!", 4),
			vec!["reset", "client", "token", "token"]
		);
	}

	#[test]
	fn repeated_tokens_count_every_occurrence() {
		let tokens = keyword_tokens("reset reset client", 4);
		let record = record("Run the reset script.", &[]);

		assert_eq!(tokens, vec!["reset", "reset", "client"]);
		assert!((keyword_overlap(&tokens, &record) - 2.0 / 3.0).abs() < 1e-6);
	}

	#[test]
	fn tokens_lowercase_unicode() {
		assert_eq!(keyword_tokens("Überweisung FEHLER", 4), vec!["überweisung", "fehler"]);
	}

	#[test]
	fn overlap_counts_content_and_tag_substrings() {
		let tokens = keyword_tokens("billing refunds invoice", 4);
		let record = record("Refunds are processed weekly.", &["billing-ops"]);

		assert!((keyword_overlap(&tokens, &record) - 2.0 / 3.0).abs() < 1e-6);
	}

	#[test]
	fn no_qualifying_tokens_scores_zero() {
		let tokens = keyword_tokens("how do i", 4);

		assert!(tokens.is_empty());
		assert_eq!(keyword_overlap(&tokens, &record("how do i", &[])), 0.0);
	}
}
