use time::OffsetDateTime;
use uuid::Uuid;

use gumshoe_config::Postgres;
use gumshoe_storage::{
	db::Db,
	queries::{self, CandidateFilter, OverridePatch},
};
use gumshoe_testkit::TestDatabase;

async fn test_env() -> Option<TestDatabase> {
	let base_dsn = match gumshoe_testkit::env_dsn() {
		Some(dsn) => dsn,
		None => {
			eprintln!("Skipping storage tests; set GUMSHOE_PG_DSN to run this test.");

			return None;
		},
	};

	match TestDatabase::new(&base_dsn).await {
		Ok(db) => Some(db),
		Err(err) => {
			eprintln!("Skipping storage tests; failed to create test database: {err}.");

			None
		},
	}
}

async fn connect(test_db: &TestDatabase) -> Db {
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to test database.");

	db.ensure_schema().await.expect("Failed to apply schema.");

	db
}

async fn seed_detective(db: &Db, business_name: &str) -> Uuid {
	let detective_id = Uuid::new_v4();

	sqlx::query(
		"\
INSERT INTO detectives (detective_id, business_name, country, city, status)
VALUES ($1, $2, 'DE', 'Berlin', 'active')",
	)
	.bind(detective_id)
	.bind(business_name)
	.execute(&db.pool)
	.await
	.expect("Failed to seed detective.");

	detective_id
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set GUMSHOE_PG_DSN to run."]
async fn schema_bootstrap_is_idempotent() {
	let Some(test_db) = test_env().await else {
		return;
	};
	let db = connect(&test_db).await;

	db.ensure_schema().await.expect("Second bootstrap should be a no-op.");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set GUMSHOE_PG_DSN to run."]
async fn candidates_join_override_and_review_aggregate() {
	let Some(test_db) = test_env().await else {
		return;
	};
	let db = connect(&test_db).await;
	let detective_id = seed_detective(&db, "Joined Agency").await;
	let service_id = Uuid::new_v4();

	sqlx::query(
		"\
INSERT INTO services (service_id, detective_id, title, images, is_active)
VALUES ($1, $2, 'Surveillance', ARRAY['a.jpg'], TRUE)",
	)
	.bind(service_id)
	.bind(detective_id)
	.execute(&db.pool)
	.await
	.expect("Failed to seed service.");

	for rating in [4.0, 5.0] {
		sqlx::query(
			"INSERT INTO reviews (review_id, service_id, rating, is_published) VALUES ($1, $2, $3, TRUE)",
		)
		.bind(Uuid::new_v4())
		.bind(service_id)
		.bind(rating)
		.execute(&db.pool)
		.await
		.expect("Failed to seed review.");
	}

	// An unpublished review must stay out of the aggregate.
	sqlx::query(
		"INSERT INTO reviews (review_id, service_id, rating, is_published) VALUES ($1, $2, 1.0, FALSE)",
	)
	.bind(Uuid::new_v4())
	.bind(service_id)
	.execute(&db.pool)
	.await
	.expect("Failed to seed review.");

	let rows = queries::load_active_candidates(&db, &CandidateFilter::default())
		.await
		.expect("Failed to load candidates.");

	assert_eq!(rows.len(), 1);

	let row = &rows[0];

	assert_eq!(row.detective_id, detective_id);
	assert_eq!(row.is_visible, None, "no override row was seeded");
	assert_eq!(row.review_count, Some(2));
	assert_eq!(row.avg_rating, Some(4.5));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set GUMSHOE_PG_DSN to run."]
async fn upsert_override_creates_with_safe_defaults_and_patches() {
	let Some(test_db) = test_env().await else {
		return;
	};
	let db = connect(&test_db).await;
	let detective_id = seed_detective(&db, "Patched Agency").await;

	// First write with an empty patch: the row materializes hidden.
	let row = queries::upsert_override(&db, detective_id, &OverridePatch::default())
		.await
		.expect("Failed to upsert override.");

	assert!(!row.is_visible);
	assert!(!row.is_featured);
	assert_eq!(row.manual_rank, None);

	let patch = OverridePatch {
		is_visible: Some(true),
		is_featured: None,
		manual_rank: Some(7),
		set_manual_rank: true,
	};
	let row = queries::upsert_override(&db, detective_id, &patch)
		.await
		.expect("Failed to upsert override.");

	assert!(row.is_visible);
	assert!(!row.is_featured);
	assert_eq!(row.manual_rank, Some(7));

	// Omitting manual_rank keeps the pin; set_manual_rank with None clears it.
	let keep = OverridePatch { is_featured: Some(true), ..Default::default() };
	let row = queries::upsert_override(&db, detective_id, &keep)
		.await
		.expect("Failed to upsert override.");

	assert!(row.is_visible);
	assert!(row.is_featured);
	assert_eq!(row.manual_rank, Some(7));

	let clear = OverridePatch { set_manual_rank: true, ..Default::default() };
	let row = queries::upsert_override(&db, detective_id, &clear)
		.await
		.expect("Failed to upsert override.");

	assert_eq!(row.manual_rank, None);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set GUMSHOE_PG_DSN to run."]
async fn persist_score_creates_a_hidden_row_when_missing() {
	let Some(test_db) = test_env().await else {
		return;
	};
	let db = connect(&test_db).await;
	let detective_id = seed_detective(&db, "Scored Agency").await;
	let now = OffsetDateTime::now_utc();

	queries::persist_score(&db, detective_id, 420.0, now)
		.await
		.expect("Failed to persist score.");

	let rows = queries::load_overview(&db).await.expect("Failed to load overview.");

	assert_eq!(rows.len(), 1);
	assert!(!rows[0].is_visible, "lazily created rows must default to hidden");
	assert_eq!(rows[0].visibility_score, 420.0);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set GUMSHOE_PG_DSN to run."]
async fn detective_exists_distinguishes_unknown_ids() {
	let Some(test_db) = test_env().await else {
		return;
	};
	let db = connect(&test_db).await;
	let detective_id = seed_detective(&db, "Known Agency").await;

	assert!(queries::detective_exists(&db, detective_id).await.expect("Query failed."));
	assert!(!queries::detective_exists(&db, Uuid::new_v4()).await.expect("Query failed."));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
