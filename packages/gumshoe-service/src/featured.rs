use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use gumshoe_domain::{
	Badges, DetectiveLevel, RankingKey, ReviewStats, ScoreSignals, compare_for_ranking,
	visibility_score,
};
use gumshoe_storage::{models::FeaturedServiceRow, queries};

use crate::{GumshoeService, ServiceResult, cache_keys};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeaturedDetective {
	pub detective_id: Uuid,
	pub business_name: String,
	pub city: Option<String>,
	pub country: Option<String>,
	pub level: String,
	pub is_featured: bool,
	pub visibility_score: f64,
}

/// One home-page service card: the detective's best image-bearing service
/// plus enough detective identity to render the card.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeaturedService {
	pub service_id: Uuid,
	pub title: String,
	pub category: Option<String>,
	pub description: Option<String>,
	pub images: Vec<String>,
	pub base_price: Option<f64>,
	pub offer_price: Option<f64>,
	pub is_on_enquiry: bool,
	pub order_count: i64,
	pub review_count: i64,
	pub average_rating: f64,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
	pub detective: FeaturedDetective,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeaturedResponse {
	pub services: Vec<FeaturedService>,
}

impl GumshoeService {
	/// Home-page featured set: one service per visible detective, ordered by
	/// the detective tie-break chain, truncated to the configured count.
	pub async fn featured_home_services(&self, anonymous: bool) -> ServiceResult<FeaturedResponse> {
		let count = self.cfg.ranking.featured_count;
		let now = OffsetDateTime::now_utc();
		let cache_key = (self.cfg.cache.enabled && anonymous)
			.then(|| cache_keys::featured_home_key(count));

		if let Some(key) = cache_key.as_deref() {
			if let Some(cached) = self.cache.get_json::<FeaturedResponse>(key, now) {
				tracing::info!(
					cache_key_prefix = cache_keys::key_prefix(key),
					hit = true,
					"Featured cache hit."
				);

				return Ok(cached);
			}

			tracing::info!(
				cache_key_prefix = cache_keys::key_prefix(key),
				hit = false,
				"Featured cache miss."
			);
		}

		let rows = queries::load_featured_rows(&self.db).await?;
		let response = select_featured(rows, now, count as usize);

		if let Some(key) = cache_key.as_deref() {
			self.cache.set_json(key, &response, self.cfg.cache.featured_ttl_seconds, now);
		}

		Ok(response)
	}
}

pub(crate) fn select_featured(
	rows: Vec<FeaturedServiceRow>,
	now: OffsetDateTime,
	count: usize,
) -> FeaturedResponse {
	let mut scored: Vec<(RankingKey, FeaturedService)> = rows
		.into_iter()
		.filter(|row| row.is_visible.unwrap_or(false))
		.map(|row| {
			let signals = featured_signals(&row, now);
			let breakdown = visibility_score(&signals, now);
			let key = RankingKey {
				detective_id: row.detective_id,
				manual_rank: row.manual_rank,
				score: breakdown.total,
				review_count: row.review_count.unwrap_or(0),
				last_active_at: row.last_active_at,
			};
			let service = FeaturedService {
				service_id: row.service_id,
				title: row.title,
				category: row.category,
				description: row.description,
				images: row.images,
				base_price: row.base_price,
				offer_price: row.offer_price,
				is_on_enquiry: row.is_on_enquiry,
				order_count: row.order_count,
				review_count: row.service_review_count.unwrap_or(0),
				average_rating: row.service_avg_rating.unwrap_or(0.0),
				updated_at: row.updated_at,
				detective: FeaturedDetective {
					detective_id: row.detective_id,
					business_name: row.business_name,
					city: row.city,
					country: row.country,
					level: DetectiveLevel::parse(row.level.as_deref()).as_str().to_string(),
					is_featured: row.is_featured.unwrap_or(false),
					visibility_score: breakdown.total,
				},
			};

			(key, service)
		})
		.collect();

	scored.sort_by(|a, b| compare_for_ranking(&a.0, &b.0));

	let services = scored.into_iter().take(count).map(|(_, service)| service).collect();

	FeaturedResponse { services }
}

fn featured_signals(row: &FeaturedServiceRow, now: OffsetDateTime) -> ScoreSignals {
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

#[cfg(test)]
mod tests {
	use time::{Duration, OffsetDateTime, macros::datetime};
	use uuid::Uuid;

	use gumshoe_storage::models::FeaturedServiceRow;

	use crate::featured::select_featured;

	const NOW: OffsetDateTime = datetime!(2025-06-01 12:00 UTC);

	fn row(id: u128) -> FeaturedServiceRow {
		FeaturedServiceRow {
			service_id: Uuid::from_u128(id + 10_000),
			detective_id: Uuid::from_u128(id),
			title: format!("Background check {id}"),
			category: Some("background-checks".to_string()),
			description: None,
			images: vec!["cover.jpg".to_string()],
			base_price: Some(150.0),
			offer_price: None,
			is_on_enquiry: false,
			order_count: 4,
			updated_at: NOW - Duration::days(2),
			business_name: format!("Agency {id}"),
			city: Some("Berlin".to_string()),
			country: Some("DE".to_string()),
			level: None,
			subscription_plan: None,
			subscription_package_id: None,
			subscription_expires_at: None,
			last_active_at: None,
			is_visible: Some(true),
			is_featured: Some(false),
			manual_rank: None,
			service_review_count: Some(2),
			service_avg_rating: Some(4.0),
			review_count: Some(2),
			avg_rating: Some(4.0),
		}
	}

	#[test]
	fn hidden_detectives_are_excluded_from_the_home_page() {
		let mut hidden = row(1);

		hidden.is_visible = Some(false);
		hidden.level = Some("pro".to_string());

		let mut unlisted = row(2);

		unlisted.is_visible = None;

		let response = select_featured(vec![hidden, unlisted, row(3)], NOW, 8);

		assert_eq!(response.services.len(), 1);
		assert_eq!(response.services[0].detective.detective_id, Uuid::from_u128(3));
	}

	#[test]
	fn count_bounds_the_featured_set() {
		let rows = (0..12).map(row).collect();
		let response = select_featured(rows, NOW, 8);

		assert_eq!(response.services.len(), 8);
	}

	#[test]
	fn stronger_detectives_lead_the_set() {
		let mut strong = row(9);

		strong.level = Some("level3".to_string());
		strong.last_active_at = Some(NOW - Duration::hours(3));

		let response = select_featured(vec![row(1), strong, row(2)], NOW, 8);

		assert_eq!(response.services[0].detective.detective_id, Uuid::from_u128(9));
		assert!(
			response.services[0].detective.visibility_score
				> response.services[1].detective.visibility_score
		);
	}

	#[test]
	fn manual_rank_pins_a_detective_to_the_front() {
		let mut strong = row(1);

		strong.level = Some("pro".to_string());
		strong.review_count = Some(60);
		strong.avg_rating = Some(4.9);

		let mut pinned = row(2);

		pinned.manual_rank = Some(1);

		let response = select_featured(vec![strong, pinned], NOW, 8);

		assert_eq!(response.services[0].detective.detective_id, Uuid::from_u128(2));
	}
}
