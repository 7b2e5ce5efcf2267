use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use mnemo_config::EmbeddingProviderConfig;

use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
	data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
	#[serde(default)]
	index: usize,
	embedding: Vec<f32>,
}

/// Embeds one query string. The vector must match the configured dimensions.
pub async fn embed_query(cfg: &EmbeddingProviderConfig, text: &str) -> Result<Vec<f32>> {
	let client = Client::builder()
		.timeout(Duration::from_millis(cfg.timeout_ms))
		.build()
		.map_err(|err| Error::InvalidConfig { message: err.to_string() })?;
	let body = serde_json::json!({
		"model": cfg.model,
		"input": text,
		"dimensions": cfg.dimensions,
	});
	let res = client
		.post(format!("{}{}", cfg.api_base, cfg.path))
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await
		.map_err(Error::from_transport)?;
	let status = res.status();

	if !status.is_success() {
		let body = res.text().await.unwrap_or_default();

		return Err(Error::from_status(status, &body));
	}

	let response: EmbeddingResponse = res.json().await.map_err(Error::from_transport)?;

	query_vector(response, cfg.dimensions as usize)
}

fn query_vector(response: EmbeddingResponse, dimensions: usize) -> Result<Vec<f32>> {
	let Some(item) = response.data.into_iter().min_by_key(|item| item.index) else {
		return Err(Error::InvalidResponse {
			message: "Embedding response has no vectors.".to_string(),
		});
	};

	if item.embedding.len() != dimensions {
		return Err(Error::InvalidResponse {
			message: format!(
				"Embedding has {} dimensions, expected {dimensions}.",
				item.embedding.len()
			),
		});
	}
	if item.embedding.iter().any(|value| !value.is_finite()) {
		return Err(Error::InvalidResponse {
			message: "Embedding contains non-finite values.".to_string(),
		});
	}

	Ok(item.embedding)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn response(json: serde_json::Value) -> EmbeddingResponse {
		serde_json::from_value(json).expect("parse failed")
	}

	#[test]
	fn takes_the_first_indexed_vector() {
		let parsed = response(serde_json::json!({
			"data": [
				{ "index": 1, "embedding": [2.0, 3.0] },
				{ "index": 0, "embedding": [0.5, 1.5] }
			]
		}));

		assert_eq!(query_vector(parsed, 2).expect("vector expected"), vec![0.5, 1.5]);
	}

	#[test]
	fn rejects_dimension_mismatch() {
		let parsed = response(serde_json::json!({ "data": [{ "embedding": [1.0, 0.0, 0.0] }] }));

		assert!(matches!(query_vector(parsed, 2), Err(Error::InvalidResponse { .. })));
	}

	#[test]
	fn rejects_empty_data() {
		let parsed = response(serde_json::json!({ "data": [] }));

		assert!(matches!(query_vector(parsed, 2), Err(Error::InvalidResponse { .. })));
	}

	#[test]
	fn non_numeric_values_fail_to_decode() {
		let result =
			serde_json::from_value::<EmbeddingResponse>(serde_json::json!({ "data": [{ "embedding": ["a"] }] }));

		assert!(result.is_err());
	}
}
