mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Cache, Config, EmbeddingProviderConfig, Providers, Ranking, RankingRecency,
	RankingSatisfaction, RankingWeights, Remote, Retry, Search, Service,
};

use std::{fs, path::Path};

/// Hard ceiling for a single page of results.
pub const MAX_PAGE_LIMIT: u32 = 100;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (label, value) in [
		("service.http_bind", &cfg.service.http_bind),
		("service.admin_bind", &cfg.service.admin_bind),
		("remote.api_base", &cfg.remote.api_base),
		("remote.api_key", &cfg.remote.api_key),
		("remote.list_path", &cfg.remote.list_path),
		("remote.search_path", &cfg.remote.search_path),
		("search.shared_owner_id", &cfg.search.shared_owner_id),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.remote.page_size == 0 {
		return Err(Error::Validation {
			message: "remote.page_size must be greater than zero.".to_string(),
		});
	}
	if cfg.remote.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "remote.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.remote.retry.max_backoff_ms < cfg.remote.retry.base_backoff_ms {
		return Err(Error::Validation {
			message: "remote.retry.max_backoff_ms must be at least remote.retry.base_backoff_ms."
				.to_string(),
		});
	}
	if cfg.cache.refresh_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "cache.refresh_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.cache.max_pages == 0 {
		return Err(Error::Validation {
			message: "cache.max_pages must be greater than zero.".to_string(),
		});
	}
	if cfg.search.max_limit == 0 || cfg.search.max_limit > MAX_PAGE_LIMIT {
		return Err(Error::Validation {
			message: format!("search.max_limit must be in the range 1-{MAX_PAGE_LIMIT}."),
		});
	}
	if cfg.search.default_limit == 0 || cfg.search.default_limit > cfg.search.max_limit {
		return Err(Error::Validation {
			message: "search.default_limit must be in the range 1-search.max_limit.".to_string(),
		});
	}
	if cfg.search.native_search && cfg.search.native_search_limit == 0 {
		return Err(Error::Validation {
			message: "search.native_search_limit must be greater than zero when native_search is enabled."
				.to_string(),
		});
	}

	validate_ranking(&cfg.ranking)?;

	if let Some(embedding) = cfg.providers.embedding.as_ref() {
		if embedding.api_key.trim().is_empty() || embedding.api_base.trim().is_empty() {
			return Err(Error::Validation {
				message: "providers.embedding api_base and api_key must be non-empty.".to_string(),
			});
		}
		if embedding.dimensions == 0 {
			return Err(Error::Validation {
				message: "providers.embedding.dimensions must be greater than zero.".to_string(),
			});
		}
		if embedding.timeout_ms == 0 {
			return Err(Error::Validation {
				message: "providers.embedding.timeout_ms must be greater than zero.".to_string(),
			});
		}
	}

	Ok(())
}

fn validate_ranking(ranking: &Ranking) -> Result<()> {
	let weights = &ranking.weights;

	for (label, weight) in [
		("ranking.weights.semantic", weights.semantic),
		("ranking.weights.keyword", weights.keyword),
		("ranking.weights.recency", weights.recency),
		("ranking.weights.satisfaction", weights.satisfaction),
	] {
		if !weight.is_finite() {
			return Err(Error::Validation { message: format!("{label} must be a finite number.") });
		}
		if weight < 0.0 {
			return Err(Error::Validation { message: format!("{label} must be zero or greater.") });
		}
	}

	if weights.semantic + weights.keyword + weights.recency + weights.satisfaction <= 0.0 {
		return Err(Error::Validation {
			message: "ranking.weights must not all be zero.".to_string(),
		});
	}

	let recency = &ranking.recency;

	if recency.day_days == 0
		|| recency.week_days <= recency.day_days
		|| recency.month_days <= recency.week_days
	{
		return Err(Error::Validation {
			message: "ranking.recency boundaries must be positive and strictly increasing."
				.to_string(),
		});
	}

	for (label, score) in [
		("ranking.recency.day_score", recency.day_score),
		("ranking.recency.week_score", recency.week_score),
		("ranking.recency.month_score", recency.month_score),
		("ranking.recency.older_score", recency.older_score),
		("ranking.satisfaction.absent", ranking.satisfaction.absent),
	]
	.into_iter()
	.chain(ranking.satisfaction.by_rating.iter().map(|score| ("ranking.satisfaction.by_rating", *score)))
	{
		if !(0.0..=1.0).contains(&score) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-1.0."),
			});
		}
	}

	if ranking.min_token_chars == 0 {
		return Err(Error::Validation {
			message: "ranking.min_token_chars must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.remote.api_base = cfg.remote.api_base.trim_end_matches('/').to_string();

	if let Some(embedding) = cfg.providers.embedding.as_mut() {
		embedding.api_base = embedding.api_base.trim_end_matches('/').to_string();
	}
	if cfg
		.providers
		.embedding
		.as_ref()
		.map(|embedding| embedding.model.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.providers.embedding = None;
	}
}
