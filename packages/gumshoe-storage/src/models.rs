use time::OffsetDateTime;
use uuid::Uuid;

/// One ranking candidate: detective columns joined with its override row and
/// the published-review aggregate. Override and aggregate columns are `None`
/// when the joined row does not exist.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct CandidateRow {
	pub detective_id: Uuid,
	pub business_name: String,
	pub contact_email: Option<String>,
	pub country: Option<String>,
	pub state: Option<String>,
	pub city: Option<String>,
	pub status: String,
	pub level: Option<String>,
	pub subscription_plan: Option<String>,
	pub subscription_package_id: Option<Uuid>,
	pub subscription_expires_at: Option<OffsetDateTime>,
	pub last_active_at: Option<OffsetDateTime>,
	pub created_at: OffsetDateTime,
	pub is_visible: Option<bool>,
	pub is_featured: Option<bool>,
	pub manual_rank: Option<i32>,
	pub review_count: Option<i64>,
	pub avg_rating: Option<f64>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct VisibilityRow {
	pub detective_id: Uuid,
	pub is_visible: bool,
	pub is_featured: bool,
	pub manual_rank: Option<i32>,
	pub visibility_score: f64,
	pub last_evaluated_at: OffsetDateTime,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

/// Admin overview row: the persisted override joined with detective identity
/// and the signals needed to recompute a fresh score for display.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct OverviewRow {
	pub detective_id: Uuid,
	pub business_name: String,
	pub contact_email: Option<String>,
	pub status: String,
	pub level: Option<String>,
	pub subscription_plan: Option<String>,
	pub subscription_package_id: Option<Uuid>,
	pub subscription_expires_at: Option<OffsetDateTime>,
	pub last_active_at: Option<OffsetDateTime>,
	pub is_visible: bool,
	pub is_featured: bool,
	pub manual_rank: Option<i32>,
	pub visibility_score: f64,
	pub last_evaluated_at: OffsetDateTime,
	pub review_count: Option<i64>,
	pub avg_rating: Option<f64>,
}

/// One home-page candidate: a detective's best image-bearing service plus the
/// detective signals the ranking chain needs.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct FeaturedServiceRow {
	pub service_id: Uuid,
	pub detective_id: Uuid,
	pub title: String,
	pub category: Option<String>,
	pub description: Option<String>,
	pub images: Vec<String>,
	pub base_price: Option<f64>,
	pub offer_price: Option<f64>,
	pub is_on_enquiry: bool,
	pub order_count: i64,
	pub updated_at: OffsetDateTime,
	pub business_name: String,
	pub city: Option<String>,
	pub country: Option<String>,
	pub level: Option<String>,
	pub subscription_plan: Option<String>,
	pub subscription_package_id: Option<Uuid>,
	pub subscription_expires_at: Option<OffsetDateTime>,
	pub last_active_at: Option<OffsetDateTime>,
	pub is_visible: Option<bool>,
	pub is_featured: Option<bool>,
	pub manual_rank: Option<i32>,
	pub service_review_count: Option<i64>,
	pub service_avg_rating: Option<f64>,
	pub review_count: Option<i64>,
	pub avg_rating: Option<f64>,
}
