use serde_json::Value;

use gumshoe_storage::queries::CandidateFilter;

pub(crate) const RANK_PREFIX: &str = "rank:detectives:";
pub(crate) const FEATURED_PREFIX: &str = "services:featured:";

const RANK_CACHE_SCHEMA_VERSION: i32 = 1;

/// Builds the cache key for one ranking predicate. Every parameter that
/// changes the result set is part of the hashed payload, so two different
/// predicates can never collide; the readable namespace prefix is what bulk
/// invalidation matches on.
pub(crate) fn rank_key(filter: &CandidateFilter, limit: u32) -> Option<String> {
	let payload = serde_json::json!({
		"kind": "rank",
		"schema_version": RANK_CACHE_SCHEMA_VERSION,
		"country": filter.country,
		"city": filter.city,
		"query": filter.query.as_deref().map(str::trim),
		"limit": limit,
	});

	hash_payload(&payload).map(|hash| format!("{RANK_PREFIX}{hash}"))
}

pub(crate) fn featured_home_key(count: u32) -> String {
	format!("{FEATURED_PREFIX}home:{count}")
}

pub(crate) fn key_prefix(key: &str) -> &str {
	let len = key.len().min(28);

	&key[..len]
}

fn hash_payload(payload: &Value) -> Option<String> {
	match serde_json::to_vec(payload) {
		Ok(raw) => Some(blake3::hash(&raw).to_hex().to_string()),
		Err(err) => {
			tracing::warn!(error = %err, "Cache key build failed.");

			None
		},
	}
}
