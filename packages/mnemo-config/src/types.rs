use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub remote: Remote,
	#[serde(default)]
	pub cache: Cache,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub ranking: Ranking,
	#[serde(default)]
	pub providers: Providers,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Remote {
	pub api_base: String,
	pub api_key: String,
	#[serde(default = "default_list_path")]
	pub list_path: String,
	#[serde(default = "default_search_path")]
	pub search_path: String,
	#[serde(default = "default_page_size")]
	pub page_size: u32,
	#[serde(default = "default_remote_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
	#[serde(default)]
	pub retry: Retry,
}

/// Transient remote failures are retried `max_retries` times after the first attempt, waiting
/// `base_backoff_ms * 2^n` (capped at `max_backoff_ms`) between attempts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Retry {
	pub max_retries: u32,
	pub base_backoff_ms: u64,
	pub max_backoff_ms: u64,
}
impl Default for Retry {
	fn default() -> Self {
		Self { max_retries: 3, base_backoff_ms: 200, max_backoff_ms: 5_000 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Cache {
	pub ttl_seconds: u64,
	/// Upper bound for one complete paged fetch, retries included.
	pub refresh_timeout_ms: u64,
	pub max_pages: u32,
}
impl Default for Cache {
	fn default() -> Self {
		Self { ttl_seconds: 300, refresh_timeout_ms: 30_000, max_pages: 1_000 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Search {
	pub default_limit: u32,
	pub max_limit: u32,
	/// Try the remote store's own search before scoring the cached snapshot.
	pub native_search: bool,
	pub native_search_limit: u32,
	/// Owner id of records visible to every caller.
	pub shared_owner_id: String,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			default_limit: 20,
			max_limit: 100,
			native_search: true,
			native_search_limit: 200,
			shared_owner_id: "system".to_string(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ranking {
	#[serde(default)]
	pub weights: RankingWeights,
	#[serde(default)]
	pub recency: RankingRecency,
	#[serde(default)]
	pub satisfaction: RankingSatisfaction,
	/// Query tokens shorter than this many characters are ignored by keyword matching.
	#[serde(default = "default_min_token_chars")]
	pub min_token_chars: u32,
}
impl Default for Ranking {
	fn default() -> Self {
		Self {
			weights: RankingWeights::default(),
			recency: RankingRecency::default(),
			satisfaction: RankingSatisfaction::default(),
			min_token_chars: default_min_token_chars(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankingWeights {
	pub semantic: f32,
	pub keyword: f32,
	pub recency: f32,
	pub satisfaction: f32,
}
impl Default for RankingWeights {
	fn default() -> Self {
		Self { semantic: 0.6, keyword: 0.3, recency: 0.07, satisfaction: 0.03 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankingRecency {
	pub day_days: u32,
	pub week_days: u32,
	pub month_days: u32,
	pub day_score: f32,
	pub week_score: f32,
	pub month_score: f32,
	pub older_score: f32,
}
impl Default for RankingRecency {
	fn default() -> Self {
		Self {
			day_days: 1,
			week_days: 7,
			month_days: 30,
			day_score: 1.0,
			week_score: 0.5,
			month_score: 0.1,
			older_score: 0.01,
		}
	}
}

/// Index `n` of `by_rating` holds the score for a rating of `n + 1`.
#[derive(Debug, Clone, Deserialize)]
pub struct RankingSatisfaction {
	pub by_rating: [f32; 5],
	pub absent: f32,
}
impl Default for RankingSatisfaction {
	fn default() -> Self {
		Self { by_rating: [0.2, 0.4, 0.6, 0.8, 1.0], absent: 0.5 }
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Providers {
	pub embedding: Option<EmbeddingProviderConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_list_path() -> String {
	"/v1/memories".to_string()
}

fn default_search_path() -> String {
	"/v1/memories/search".to_string()
}

fn default_page_size() -> u32 {
	100
}

fn default_remote_timeout_ms() -> u64 {
	5_000
}

fn default_min_token_chars() -> u32 {
	4
}
