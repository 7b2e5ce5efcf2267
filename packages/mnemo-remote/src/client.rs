use std::time::Duration;

use reqwest::{Client, RequestBuilder, header::HeaderMap};
use serde_json::Value;

use mnemo_config::Remote;
use mnemo_domain::RemotePayload;

use crate::{Error, Result, RetryPolicy};

/// One page of the remote store's bulk listing.
#[derive(Debug, Clone, Default)]
pub struct Page {
	pub items: Vec<RemotePayload>,
	pub next_cursor: Option<String>,
	/// Items dropped because they did not match any known record shape.
	pub skipped: usize,
}

/// Retrying transport for the remote memory store's list and search endpoints.
#[derive(Debug, Clone)]
pub struct RemoteClient {
	http: Client,
	headers: HeaderMap,
	list_url: String,
	search_url: String,
	page_size: u32,
	retry: RetryPolicy,
}
impl RemoteClient {
	pub fn new(cfg: &Remote) -> Result<Self> {
		let http = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.build()
			.map_err(|err| Error::InvalidConfig { message: err.to_string() })?;

		Ok(Self {
			http,
			headers: crate::auth_headers(&cfg.api_key, &cfg.default_headers)?,
			list_url: format!("{}{}", cfg.api_base, cfg.list_path),
			search_url: format!("{}{}", cfg.api_base, cfg.search_path),
			page_size: cfg.page_size,
			retry: RetryPolicy::from_config(&cfg.retry),
		})
	}

	pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;

		self
	}

	/// Fetches one listing page. Transient failures are retried per the retry policy; permanent
	/// ones surface immediately.
	pub async fn fetch_page(&self, cursor: Option<&str>) -> Result<Page> {
		let json = self.retry.run("list", || self.send(self.list_request(cursor))).await?;

		parse_page(json)
	}

	/// Best-effort free-text search. An empty result does not mean nothing matches.
	pub async fn raw_search(&self, text: &str, limit: u32) -> Result<Vec<RemotePayload>> {
		let body = serde_json::json!({ "query": text, "limit": limit });
		let json = self
			.retry
			.run("search", || self.send(self.http.post(&self.search_url).json(&body)))
			.await?;

		parse_search(json)
	}

	fn list_request(&self, cursor: Option<&str>) -> RequestBuilder {
		let mut request =
			self.http.get(&self.list_url).query(&[("limit", self.page_size.to_string())]);

		if let Some(cursor) = cursor {
			request = request.query(&[("cursor", cursor)]);
		}

		request
	}

	async fn send(&self, request: RequestBuilder) -> Result<Value> {
		let res = request.headers(self.headers.clone()).send().await.map_err(Error::from_transport)?;
		let status = res.status();

		if !status.is_success() {
			let body = res.text().await.unwrap_or_default();

			return Err(Error::from_status(status, &body));
		}

		res.json::<Value>().await.map_err(Error::from_transport)
	}
}

pub fn parse_page(json: Value) -> Result<Page> {
	let items = json
		.get("items")
		.and_then(|v| v.as_array())
		.ok_or_else(|| Error::InvalidResponse {
			message: "List response is missing items array.".to_string(),
		})?;
	let next_cursor = match json.get("next_cursor") {
		None | Some(Value::Null) => None,
		Some(Value::String(cursor)) if cursor.is_empty() => None,
		Some(Value::String(cursor)) => Some(cursor.clone()),
		Some(other) => {
			return Err(Error::InvalidResponse {
				message: format!("List response next_cursor must be a string, got {other}."),
			});
		},
	};
	let (items, skipped) = parse_items(items);

	Ok(Page { items, next_cursor, skipped })
}

pub fn parse_search(json: Value) -> Result<Vec<RemotePayload>> {
	let items = json
		.get("items")
		.or_else(|| json.get("results"))
		.and_then(|v| v.as_array())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Search response is missing items array.".to_string(),
		})?;
	let (items, _) = parse_items(items);

	Ok(items)
}

fn parse_items(raw: &[Value]) -> (Vec<RemotePayload>, usize) {
	let mut items = Vec::with_capacity(raw.len());
	let mut skipped = 0_usize;

	for (index, item) in raw.iter().enumerate() {
		match RemotePayload::from_value(item.clone()) {
			Ok(payload) => items.push(payload),
			Err(err) => {
				skipped += 1;

				tracing::warn!(
					index,
					id = item.get("id").and_then(|v| v.as_str()).unwrap_or("<missing>"),
					error = %err,
					"Skipping malformed remote record."
				);
			},
		}
	}

	(items, skipped)
}
