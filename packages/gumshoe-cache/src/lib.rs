use std::{collections::HashMap, sync::Mutex};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use time::{Duration, OffsetDateTime};

#[derive(Debug)]
struct Entry {
	value: Value,
	expires_at: OffsetDateTime,
}

/// Lazy expiring key-value store. Entries past their TTL are logically absent
/// and physically removed the next time they are read; there is no background
/// sweep and no eviction policy beyond expiry. The store is a plain instance
/// with no teardown to run, so dropping it is the whole lifecycle.
///
/// Every operation is total: lock poisoning is recovered and serialization
/// problems degrade to a miss, because the cache is a performance layer and
/// callers must stay correct with it disabled.
#[derive(Debug, Default)]
pub struct LazyCache {
	entries: Mutex<HashMap<String, Entry>>,
}

impl LazyCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, key: &str) -> Option<Value> {
		self.get_at(key, OffsetDateTime::now_utc())
	}

	/// `get` with an explicit clock, the seam deterministic tests use.
	/// Expired entries are deleted as a side effect of the read.
	pub fn get_at(&self, key: &str, now: OffsetDateTime) -> Option<Value> {
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
		let Some(entry) = entries.get(key) else {
			return None;
		};

		if now >= entry.expires_at {
			entries.remove(key);

			return None;
		}

		Some(entry.value.clone())
	}

	/// Decodes a cached value into `T`. A payload that no longer matches the
	/// expected shape counts as a miss, never an error.
	pub fn get_json<T>(&self, key: &str, now: OffsetDateTime) -> Option<T>
	where
		T: DeserializeOwned,
	{
		let value = self.get_at(key, now)?;

		match serde_json::from_value(value) {
			Ok(decoded) => Some(decoded),
			Err(err) => {
				tracing::warn!(error = %err, key, "Cache payload decode failed.");

				None
			},
		}
	}

	pub fn set(&self, key: &str, value: Value, ttl_seconds: i64) {
		self.set_at(key, value, ttl_seconds, OffsetDateTime::now_utc());
	}

	/// A non-positive TTL is a no-op so nothing is ever cached forever by
	/// accident.
	pub fn set_at(&self, key: &str, value: Value, ttl_seconds: i64, now: OffsetDateTime) {
		if ttl_seconds <= 0 {
			tracing::debug!(key, ttl_seconds, "Cache set skipped for non-positive TTL.");

			return;
		}

		let entry = Entry { value, expires_at: now + Duration::seconds(ttl_seconds) };
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		entries.insert(key.to_string(), entry);
	}

	/// Serializes and stores `value`. Encoding failures are swallowed; the
	/// next read simply misses.
	pub fn set_json<T>(&self, key: &str, value: &T, ttl_seconds: i64, now: OffsetDateTime)
	where
		T: Serialize,
	{
		match serde_json::to_value(value) {
			Ok(encoded) => self.set_at(key, encoded, ttl_seconds, now),
			Err(err) => {
				tracing::warn!(error = %err, key, "Cache payload encode failed.");
			},
		}
	}

	pub fn del(&self, key: &str) {
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		entries.remove(key);
	}

	/// All stored keys, including entries whose TTL has already passed but
	/// which no read has cleaned up yet. Exists for prefix-based bulk
	/// invalidation.
	pub fn keys(&self) -> Vec<String> {
		let entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		entries.keys().cloned().collect()
	}

	/// Removes every entry whose key starts with `prefix` and reports how
	/// many were dropped.
	pub fn del_prefix(&self, prefix: &str) -> usize {
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
		let before = entries.len();

		entries.retain(|key, _| !key.starts_with(prefix));

		before - entries.len()
	}
}
