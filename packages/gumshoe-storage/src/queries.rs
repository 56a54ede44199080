use sqlx::QueryBuilder;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Result,
	db::Db,
	models::{CandidateRow, FeaturedServiceRow, OverviewRow, VisibilityRow},
};

const CANDIDATE_BASE: &str = "\
SELECT
	d.detective_id,
	d.business_name,
	d.contact_email,
	d.country,
	d.state,
	d.city,
	d.status,
	d.level,
	d.subscription_plan,
	d.subscription_package_id,
	d.subscription_expires_at,
	d.last_active_at,
	d.created_at,
	v.is_visible,
	v.is_featured,
	v.manual_rank,
	r.review_count,
	r.avg_rating
FROM detectives d
LEFT JOIN detective_visibility v ON v.detective_id = d.detective_id
LEFT JOIN (
	SELECT s.detective_id, COUNT(rv.review_id) AS review_count, AVG(rv.rating) AS avg_rating
	FROM reviews rv
	JOIN services s ON s.service_id = rv.service_id
	WHERE rv.is_published
	GROUP BY s.detective_id
) r ON r.detective_id = d.detective_id";

/// Listing predicate for the public read path. `status = 'active'` is always
/// enforced; the optional fields narrow the candidate set further.
#[derive(Clone, Debug, Default)]
pub struct CandidateFilter {
	pub country: Option<String>,
	pub city: Option<String>,
	pub query: Option<String>,
}

pub async fn load_active_candidates(
	db: &Db,
	filter: &CandidateFilter,
) -> Result<Vec<CandidateRow>> {
	let mut builder = QueryBuilder::new(CANDIDATE_BASE);

	builder.push(" WHERE d.status = ");
	builder.push_bind("active");

	if let Some(country) = &filter.country {
		builder.push(" AND d.country = ");
		builder.push_bind(country);
	}
	if let Some(city) = &filter.city {
		builder.push(" AND d.city = ");
		builder.push_bind(city);
	}
	if let Some(query) = &filter.query {
		builder.push(" AND d.business_name ILIKE ");
		builder.push_bind(format!("%{query}%"));
	}

	let rows = builder.build_query_as().fetch_all(&db.pool).await?;

	Ok(rows)
}

pub async fn load_candidate(db: &Db, detective_id: Uuid) -> Result<Option<CandidateRow>> {
	let mut builder = QueryBuilder::new(CANDIDATE_BASE);

	builder.push(" WHERE d.detective_id = ");
	builder.push_bind(detective_id);

	let row = builder.build_query_as().fetch_optional(&db.pool).await?;

	Ok(row)
}

pub async fn detective_exists(db: &Db, detective_id: Uuid) -> Result<bool> {
	let found: Option<Uuid> =
		sqlx::query_scalar("SELECT detective_id FROM detectives WHERE detective_id = $1")
			.bind(detective_id)
			.fetch_optional(&db.pool)
			.await?;

	Ok(found.is_some())
}

/// Admin patch applied as one atomic upsert. Absent fields keep their stored
/// value; `set_manual_rank` distinguishes "leave the rank alone" from "clear
/// it".
#[derive(Clone, Copy, Debug, Default)]
pub struct OverridePatch {
	pub is_visible: Option<bool>,
	pub is_featured: Option<bool>,
	pub manual_rank: Option<i32>,
	pub set_manual_rank: bool,
}

pub async fn upsert_override(
	db: &Db,
	detective_id: Uuid,
	patch: &OverridePatch,
) -> Result<VisibilityRow> {
	let row = sqlx::query_as(
		"\
INSERT INTO detective_visibility (detective_id, is_visible, is_featured, manual_rank)
VALUES ($1, COALESCE($2, FALSE), COALESCE($3, FALSE), $4)
ON CONFLICT (detective_id) DO UPDATE
SET
	is_visible = COALESCE($2, detective_visibility.is_visible),
	is_featured = COALESCE($3, detective_visibility.is_featured),
	manual_rank = CASE WHEN $5 THEN $4 ELSE detective_visibility.manual_rank END,
	updated_at = now()
RETURNING
	detective_id,
	is_visible,
	is_featured,
	manual_rank,
	visibility_score,
	last_evaluated_at,
	created_at,
	updated_at",
	)
	.bind(detective_id)
	.bind(patch.is_visible)
	.bind(patch.is_featured)
	.bind(patch.manual_rank)
	.bind(patch.set_manual_rank)
	.fetch_one(&db.pool)
	.await?;

	Ok(row)
}

/// Stores a freshly computed score for display. Ranked reads never consult
/// this column; they recompute.
pub async fn persist_score(
	db: &Db,
	detective_id: Uuid,
	score: f64,
	now: OffsetDateTime,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO detective_visibility (detective_id, visibility_score, last_evaluated_at)
VALUES ($1, $2, $3)
ON CONFLICT (detective_id) DO UPDATE
SET
	visibility_score = EXCLUDED.visibility_score,
	last_evaluated_at = EXCLUDED.last_evaluated_at,
	updated_at = now()",
	)
	.bind(detective_id)
	.bind(score)
	.bind(now)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn load_overview(db: &Db) -> Result<Vec<OverviewRow>> {
	let rows = sqlx::query_as(
		"\
SELECT
	v.detective_id,
	d.business_name,
	d.contact_email,
	d.status,
	d.level,
	d.subscription_plan,
	d.subscription_package_id,
	d.subscription_expires_at,
	d.last_active_at,
	v.is_visible,
	v.is_featured,
	v.manual_rank,
	v.visibility_score,
	v.last_evaluated_at,
	r.review_count,
	r.avg_rating
FROM detective_visibility v
JOIN detectives d ON d.detective_id = v.detective_id
LEFT JOIN (
	SELECT s.detective_id, COUNT(rv.review_id) AS review_count, AVG(rv.rating) AS avg_rating
	FROM reviews rv
	JOIN services s ON s.service_id = rv.service_id
	WHERE rv.is_published
	GROUP BY s.detective_id
) r ON r.detective_id = v.detective_id
ORDER BY d.business_name, v.detective_id",
	)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// One image-bearing service per active detective: the most ordered, most
/// recently updated one. Ordering across detectives happens in the service
/// layer with the full tie-break chain.
pub async fn load_featured_rows(db: &Db) -> Result<Vec<FeaturedServiceRow>> {
	let rows = sqlx::query_as(
		"\
SELECT
	u.service_id,
	u.detective_id,
	u.title,
	u.category,
	u.description,
	u.images,
	u.base_price,
	u.offer_price,
	u.is_on_enquiry,
	u.order_count,
	u.updated_at,
	d.business_name,
	d.city,
	d.country,
	d.level,
	d.subscription_plan,
	d.subscription_package_id,
	d.subscription_expires_at,
	d.last_active_at,
	v.is_visible,
	v.is_featured,
	v.manual_rank,
	sr.review_count AS service_review_count,
	sr.avg_rating AS service_avg_rating,
	dr.review_count,
	dr.avg_rating
FROM (
	SELECT DISTINCT ON (s.detective_id)
		s.service_id,
		s.detective_id,
		s.title,
		s.category,
		s.description,
		s.images,
		s.base_price,
		s.offer_price,
		s.is_on_enquiry,
		s.order_count,
		s.updated_at
	FROM services s
	WHERE s.is_active AND cardinality(s.images) > 0
	ORDER BY s.detective_id, s.order_count DESC, s.updated_at DESC
) u
JOIN detectives d ON d.detective_id = u.detective_id
LEFT JOIN detective_visibility v ON v.detective_id = u.detective_id
LEFT JOIN (
	SELECT rv.service_id, COUNT(rv.review_id) AS review_count, AVG(rv.rating) AS avg_rating
	FROM reviews rv
	WHERE rv.is_published
	GROUP BY rv.service_id
) sr ON sr.service_id = u.service_id
LEFT JOIN (
	SELECT s.detective_id, COUNT(rv.review_id) AS review_count, AVG(rv.rating) AS avg_rating
	FROM reviews rv
	JOIN services s ON s.service_id = rv.service_id
	WHERE rv.is_published
	GROUP BY s.detective_id
) dr ON dr.detective_id = u.detective_id
WHERE d.status = 'active'",
	)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}
