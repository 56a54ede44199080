use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use gumshoe_domain::{
	Badges, DetectiveLevel, MANUAL_RANK_MAX, MANUAL_RANK_MIN, ReviewStats, ScoreBreakdown,
	ScoreSignals, visibility_score,
};
use gumshoe_storage::{
	models::{OverviewRow, VisibilityRow},
	queries::{self, OverridePatch},
};

use crate::{GumshoeService, ServiceError, ServiceResult, candidate_signals};

/// Admin patch for one detective's override record. Absent fields are left
/// unchanged; an explicit `"manual_rank": null` clears the pin.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct OverrideRequest {
	pub is_visible: Option<bool>,
	pub is_featured: Option<bool>,
	#[serde(default, deserialize_with = "double_option")]
	pub manual_rank: Option<Option<i32>>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<i32>>, D::Error>
where
	D: Deserializer<'de>,
{
	Option::<i32>::deserialize(deserializer).map(Some)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OverrideRecord {
	pub detective_id: Uuid,
	pub is_visible: bool,
	pub is_featured: bool,
	pub manual_rank: Option<i32>,
	pub visibility_score: f64,
	#[serde(with = "crate::time_serde")]
	pub last_evaluated_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}

impl From<VisibilityRow> for OverrideRecord {
	fn from(row: VisibilityRow) -> Self {
		Self {
			detective_id: row.detective_id,
			is_visible: row.is_visible,
			is_featured: row.is_featured,
			manual_rank: row.manual_rank,
			visibility_score: row.visibility_score,
			last_evaluated_at: row.last_evaluated_at,
			created_at: row.created_at,
			updated_at: row.updated_at,
		}
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OverviewDetective {
	pub business_name: String,
	pub contact_email: Option<String>,
	pub status: String,
	pub level: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OverviewItem {
	pub detective_id: Uuid,
	pub is_visible: bool,
	pub is_featured: bool,
	pub manual_rank: Option<i32>,
	pub stored_score: f64,
	#[serde(with = "crate::time_serde")]
	pub last_evaluated_at: OffsetDateTime,
	pub computed: ScoreBreakdown,
	pub review_count: i64,
	pub average_rating: f64,
	pub detective: OverviewDetective,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OverviewResponse {
	pub visibility: Vec<OverviewItem>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecalculateResponse {
	pub detective_id: Uuid,
	pub score: ScoreBreakdown,
}

impl GumshoeService {
	/// Validated write path for `is_visible` / `is_featured` / `manual_rank`.
	/// The three fields are applied as one atomic upsert and every cached
	/// ranked surface is invalidated before the call reports success.
	pub async fn set_override(
		&self,
		detective_id: Uuid,
		req: OverrideRequest,
	) -> ServiceResult<OverrideRecord> {
		validate_override(&req)?;

		if !queries::detective_exists(&self.db, detective_id).await? {
			return Err(ServiceError::NotFound { message: "Detective not found.".to_string() });
		}

		let patch = OverridePatch {
			is_visible: req.is_visible,
			is_featured: req.is_featured,
			manual_rank: req.manual_rank.flatten(),
			set_manual_rank: req.manual_rank.is_some(),
		};
		let row = queries::upsert_override(&self.db, detective_id, &patch).await?;

		self.invalidate_ranked_surfaces();

		tracing::info!(detective_id = %detective_id, "Visibility override updated.");

		Ok(OverrideRecord::from(row))
	}

	/// Every override row enriched with detective identity and a freshly
	/// computed score, for the admin ranking screen.
	pub async fn visibility_overview(&self) -> ServiceResult<OverviewResponse> {
		let now = OffsetDateTime::now_utc();
		let rows = queries::load_overview(&self.db).await?;
		let visibility = rows.into_iter().map(|row| overview_item(row, now)).collect();

		Ok(OverviewResponse { visibility })
	}

	/// Recomputes one detective's score and persists it on the override row
	/// for display. The row is created with safe defaults when missing.
	pub async fn recalculate_score(
		&self,
		detective_id: Uuid,
	) -> ServiceResult<RecalculateResponse> {
		let Some(row) = queries::load_candidate(&self.db, detective_id).await? else {
			return Err(ServiceError::NotFound { message: "Detective not found.".to_string() });
		};
		let now = OffsetDateTime::now_utc();
		let breakdown = visibility_score(&candidate_signals(&row, now), now);

		queries::persist_score(&self.db, detective_id, breakdown.total, now).await?;

		Ok(RecalculateResponse { detective_id, score: breakdown })
	}
}

pub(crate) fn validate_override(req: &OverrideRequest) -> ServiceResult<()> {
	if let Some(Some(rank)) = req.manual_rank
		&& !(MANUAL_RANK_MIN..=MANUAL_RANK_MAX).contains(&rank)
	{
		return Err(ServiceError::InvalidRequest {
			message: format!(
				"manual_rank must be between {MANUAL_RANK_MIN} and {MANUAL_RANK_MAX} or null."
			),
		});
	}

	Ok(())
}

fn overview_item(row: OverviewRow, now: OffsetDateTime) -> OverviewItem {
	let signals = overview_signals(&row, now);
	let computed = visibility_score(&signals, now);

	OverviewItem {
		detective_id: row.detective_id,
		is_visible: row.is_visible,
		is_featured: row.is_featured,
		manual_rank: row.manual_rank,
		stored_score: row.visibility_score,
		last_evaluated_at: row.last_evaluated_at,
		computed,
		review_count: row.review_count.unwrap_or(0),
		average_rating: row.avg_rating.unwrap_or(0.0),
		detective: OverviewDetective {
			business_name: row.business_name,
			contact_email: row.contact_email,
			status: row.status,
			level: DetectiveLevel::parse(row.level.as_deref()).as_str().to_string(),
		},
	}
}

fn overview_signals(row: &OverviewRow, now: OffsetDateTime) -> ScoreSignals {
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
