use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use gumshoe_domain::{
	DetectiveLevel, RankingKey, ScoreBreakdown, compare_for_ranking, visibility_score,
};
use gumshoe_storage::{
	models::CandidateRow,
	queries::{self, CandidateFilter},
};

use crate::{
	GumshoeService, ServiceError, ServiceResult, cache_keys, candidate_signals, normalize_param,
};

/// Listing request for the public directory surfaces. `anonymous` is decided
/// at the HTTP edge; only anonymous traffic may be served from the cache.
#[derive(Clone, Debug, Default)]
pub struct RankRequest {
	pub country: Option<String>,
	pub city: Option<String>,
	pub query: Option<String>,
	pub limit: Option<u32>,
	pub anonymous: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedDetective {
	pub detective_id: Uuid,
	pub business_name: String,
	pub country: Option<String>,
	pub state: Option<String>,
	pub city: Option<String>,
	pub level: String,
	pub is_featured: bool,
	pub review_count: i64,
	pub average_rating: f64,
	#[serde(with = "crate::time_serde::option")]
	pub last_active_at: Option<OffsetDateTime>,
	pub score: ScoreBreakdown,
	pub rank_position: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankResponse {
	pub detectives: Vec<RankedDetective>,
}

impl GumshoeService {
	/// The ranking read path: load candidates, score, gate on visibility,
	/// order, truncate. Store failures propagate so callers can tell "no
	/// detectives" from "failed to fetch detectives".
	pub async fn rank_detectives(&self, req: RankRequest) -> ServiceResult<RankResponse> {
		let limit = req.limit.unwrap_or(self.cfg.ranking.default_limit);

		if limit == 0 {
			return Err(ServiceError::InvalidRequest {
				message: "limit must be greater than zero.".to_string(),
			});
		}

		let limit = limit.min(self.cfg.ranking.max_limit);
		let filter = CandidateFilter {
			country: normalize_param(req.country),
			city: normalize_param(req.city),
			query: normalize_param(req.query),
		};
		let now = OffsetDateTime::now_utc();
		let cache_key = if self.cfg.cache.enabled && req.anonymous {
			cache_keys::rank_key(&filter, limit)
		} else {
			None
		};

		if let Some(key) = cache_key.as_deref() {
			if let Some(cached) = self.cache.get_json::<RankResponse>(key, now) {
				tracing::info!(
					cache_key_prefix = cache_keys::key_prefix(key),
					hit = true,
					"Ranking cache hit."
				);

				return Ok(cached);
			}

			tracing::info!(
				cache_key_prefix = cache_keys::key_prefix(key),
				hit = false,
				"Ranking cache miss."
			);
		}

		let rows = queries::load_active_candidates(&self.db, &filter).await?;
		let response = rank_rows(rows, now, limit as usize);

		if let Some(key) = cache_key.as_deref() {
			self.cache.set_json(key, &response, self.cfg.cache.rank_ttl_seconds, now);
		}

		Ok(response)
	}
}

/// Pure assembly step. The visibility gate runs before scoring and sorting,
/// so hidden detectives never occupy a slot in the truncated result.
pub(crate) fn rank_rows(
	rows: Vec<CandidateRow>,
	now: OffsetDateTime,
	limit: usize,
) -> RankResponse {
	let mut scored: Vec<(RankingKey, RankedDetective)> = rows
		.into_iter()
		.filter(|row| row.is_visible.unwrap_or(false))
		.map(|row| {
			let signals = candidate_signals(&row, now);
			let breakdown = visibility_score(&signals, now);
			let key = RankingKey {
				detective_id: row.detective_id,
				manual_rank: signals.manual_rank,
				score: breakdown.total,
				review_count: row.review_count.unwrap_or(0),
				last_active_at: row.last_active_at,
			};
			let detective = RankedDetective {
				detective_id: row.detective_id,
				business_name: row.business_name,
				country: row.country,
				state: row.state,
				city: row.city,
				level: DetectiveLevel::parse(row.level.as_deref()).as_str().to_string(),
				is_featured: row.is_featured.unwrap_or(false),
				review_count: row.review_count.unwrap_or(0),
				average_rating: row.avg_rating.unwrap_or(0.0),
				last_active_at: row.last_active_at,
				score: breakdown,
				rank_position: 0,
			};

			(key, detective)
		})
		.collect();

	scored.sort_by(|a, b| compare_for_ranking(&a.0, &b.0));

	let detectives = scored
		.into_iter()
		.take(limit)
		.enumerate()
		.map(|(idx, (_, mut detective))| {
			detective.rank_position = idx + 1;

			detective
		})
		.collect();

	RankResponse { detectives }
}

#[cfg(test)]
mod tests {
	use time::{Duration, OffsetDateTime, macros::datetime};
	use uuid::Uuid;

	use gumshoe_storage::models::CandidateRow;

	use crate::rank::rank_rows;

	const NOW: OffsetDateTime = datetime!(2025-06-01 12:00 UTC);

	fn row(id: u128) -> CandidateRow {
		CandidateRow {
			detective_id: Uuid::from_u128(id),
			business_name: format!("Agency {id}"),
			contact_email: None,
			country: Some("DE".to_string()),
			state: None,
			city: Some("Berlin".to_string()),
			status: "active".to_string(),
			level: None,
			subscription_plan: None,
			subscription_package_id: None,
			subscription_expires_at: None,
			last_active_at: None,
			created_at: NOW - Duration::days(200),
			is_visible: Some(true),
			is_featured: Some(false),
			manual_rank: None,
			review_count: None,
			avg_rating: None,
		}
	}

	fn maxed(id: u128) -> CandidateRow {
		let mut row = row(id);

		row.level = Some("pro".to_string());
		row.subscription_plan = Some("agency".to_string());
		row.subscription_package_id = Some(Uuid::from_u128(id + 1_000));
		row.subscription_expires_at = Some(NOW + Duration::days(30));
		row.last_active_at = Some(NOW - Duration::hours(1));
		row.review_count = Some(80);
		row.avg_rating = Some(4.9);

		row
	}

	#[test]
	fn hidden_detective_never_appears_even_when_maxed_out() {
		let mut hidden = maxed(1);

		hidden.is_visible = Some(false);

		let candidates = vec![hidden, row(2), row(3)];
		let response = rank_rows(candidates, NOW, 100);

		assert_eq!(response.detectives.len(), 2);
		assert!(
			response.detectives.iter().all(|d| d.detective_id != Uuid::from_u128(1)),
			"hidden detective leaked into the ranking"
		);
	}

	#[test]
	fn missing_override_row_means_not_visible() {
		let mut unlisted = maxed(1);

		unlisted.is_visible = None;

		let response = rank_rows(vec![unlisted, row(2)], NOW, 100);

		assert_eq!(response.detectives.len(), 1);
		assert_eq!(response.detectives[0].detective_id, Uuid::from_u128(2));
	}

	#[test]
	fn hidden_detectives_do_not_occupy_truncation_slots() {
		let mut hidden_a = maxed(1);
		let mut hidden_b = maxed(2);

		hidden_a.is_visible = Some(false);
		hidden_b.is_visible = Some(false);

		let candidates = vec![hidden_a, hidden_b, row(3), row(4), row(5)];
		let response = rank_rows(candidates, NOW, 3);

		assert_eq!(response.detectives.len(), 3);
	}

	#[test]
	fn manual_rank_beats_a_higher_computed_score() {
		let strong = maxed(1);
		let mut pinned = row(2);

		pinned.manual_rank = Some(10);

		let response = rank_rows(vec![strong, pinned], NOW, 10);

		assert_eq!(response.detectives[0].detective_id, Uuid::from_u128(2));
		assert_eq!(response.detectives[1].detective_id, Uuid::from_u128(1));
		assert!(response.detectives[1].score.total > response.detectives[0].score.total);
	}

	#[test]
	fn rank_positions_are_one_based() {
		let response = rank_rows(vec![maxed(1), row(2), row(3)], NOW, 10);
		let positions: Vec<usize> =
			response.detectives.iter().map(|d| d.rank_position).collect();

		assert_eq!(positions, vec![1, 2, 3]);
	}

	#[test]
	fn limit_truncates_the_ordered_list() {
		let candidates = vec![row(1), row(2), row(3), row(4)];
		let response = rank_rows(candidates, NOW, 2);

		assert_eq!(response.detectives.len(), 2);
	}

	#[test]
	fn ordering_is_deterministic_for_a_fixed_snapshot() {
		let candidates: Vec<CandidateRow> = (0..20)
			.map(|id| if id % 3 == 0 { maxed(id) } else { row(id) })
			.collect();
		let first = rank_rows(candidates.clone(), NOW, 20);

		for _ in 0..5 {
			assert_eq!(rank_rows(candidates.clone(), NOW, 20), first);
		}
	}

	#[test]
	fn equal_signals_fall_back_to_detective_id() {
		let response = rank_rows(vec![row(7), row(3), row(5)], NOW, 10);
		let ids: Vec<Uuid> = response.detectives.iter().map(|d| d.detective_id).collect();

		assert_eq!(
			ids,
			vec![Uuid::from_u128(3), Uuid::from_u128(5), Uuid::from_u128(7)],
		);
	}
}
