pub mod featured;
pub mod rank;
pub mod time_serde;
pub mod visibility;

mod cache_keys;

pub use featured::{FeaturedDetective, FeaturedResponse, FeaturedService};
pub use rank::{RankRequest, RankResponse, RankedDetective};
pub use visibility::{
	OverrideRecord, OverrideRequest, OverviewDetective, OverviewItem, OverviewResponse,
	RecalculateResponse,
};

use gumshoe_cache::LazyCache;
use gumshoe_config::Config;
use gumshoe_domain::{Badges, DetectiveLevel, ReviewStats, ScoreSignals};
use gumshoe_storage::{db::Db, models::CandidateRow};
use time::OffsetDateTime;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
	InvalidRequest { message: String },
	NotFound { message: String },
	Storage { message: String },
}

impl std::fmt::Display for ServiceError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
			Self::NotFound { message } => write!(f, "Not found: {message}"),
			Self::Storage { message } => write!(f, "Storage error: {message}"),
		}
	}
}

impl std::error::Error for ServiceError {}

impl From<gumshoe_storage::Error> for ServiceError {
	fn from(err: gumshoe_storage::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

/// The engine behind every ranked surface. Holds the config, the store
/// handle, and the one shared cache instance; route handlers call its
/// operations directly.
pub struct GumshoeService {
	pub cfg: Config,
	pub db: Db,
	pub cache: LazyCache,
}

impl GumshoeService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, db, cache: LazyCache::new() }
	}

	pub fn with_cache(cfg: Config, db: Db, cache: LazyCache) -> Self {
		Self { cfg, db, cache }
	}

	/// Drops every cached ranked surface. Coarse on purpose: stale
	/// visibility state is worse than a few recomputed pages.
	pub(crate) fn invalidate_ranked_surfaces(&self) {
		let dropped = self.cache.del_prefix(cache_keys::RANK_PREFIX)
			+ self.cache.del_prefix(cache_keys::FEATURED_PREFIX);

		tracing::debug!(dropped, "Invalidated ranked surface caches.");
	}
}

/// Maps a candidate row onto score inputs. Every missing column degrades to
/// the score model's documented default rather than skipping the detective.
pub(crate) fn candidate_signals(row: &CandidateRow, now: OffsetDateTime) -> ScoreSignals {
	ScoreSignals {
		manual_rank: row.manual_rank,
		level: DetectiveLevel::parse(row.level.as_deref()),
		badges: Badges::from_subscription(
			row.subscription_plan.as_deref(),
			row.subscription_package_id.is_some(),
			row.subscription_expires_at,
			now,
		),
		last_active_at: row.last_active_at,
		reviews: Some(ReviewStats {
			published_count: row.review_count.unwrap_or(0),
			average_rating: row.avg_rating.unwrap_or(0.0),
		}),
	}
}

pub(crate) fn normalize_param(value: Option<String>) -> Option<String> {
	value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}
