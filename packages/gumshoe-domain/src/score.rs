use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

pub const MANUAL_RANK_MIN: i32 = 0;
pub const MANUAL_RANK_MAX: i32 = 1_000;

/// Detective tier. Unknown or missing levels fall back to the entry tier so
/// incomplete profiles still score, they never drop to zero.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectiveLevel {
	#[default]
	Level1,
	Level2,
	Level3,
	Pro,
}
impl DetectiveLevel {
	pub fn parse(raw: Option<&str>) -> Self {
		match raw {
			Some("level2") => Self::Level2,
			Some("level3") => Self::Level3,
			Some("pro") => Self::Pro,
			_ => Self::Level1,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Level1 => "level1",
			Self::Level2 => "level2",
			Self::Level3 => "level3",
			Self::Pro => "pro",
		}
	}

	fn score(self) -> f64 {
		match self {
			Self::Level1 => 100.0,
			Self::Level2 => 200.0,
			Self::Level3 => 300.0,
			Self::Pro => 500.0,
		}
	}
}

/// Effective badge flags. All fields are mandatory so the score model never
/// null-checks; `recommended` has no computation path yet and stays false
/// until a dedicated signal exists.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Badges {
	pub blue_tick: bool,
	pub pro: bool,
	pub recommended: bool,
}
impl Badges {
	pub fn from_subscription(
		plan: Option<&str>,
		has_package: bool,
		package_expires_at: Option<OffsetDateTime>,
		now: OffsetDateTime,
	) -> Self {
		let blue_tick = matches!(plan, Some("pro") | Some("agency"));
		let pro = has_package && package_expires_at.map(|ts| ts > now).unwrap_or(false);

		Self { blue_tick, pro, recommended: false }
	}

	fn score(self) -> f64 {
		let mut score = 0.0;

		if self.blue_tick {
			score += 100.0;
		}
		if self.pro {
			score += 200.0;
		}
		if self.recommended {
			score += 300.0;
		}

		score
	}
}

/// Published-review aggregate for one detective.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReviewStats {
	pub published_count: i64,
	pub average_rating: f64,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ScoreSignals {
	pub manual_rank: Option<i32>,
	pub level: DetectiveLevel,
	pub badges: Badges,
	pub last_active_at: Option<OffsetDateTime>,
	pub reviews: Option<ReviewStats>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ScoreBreakdown {
	pub manual: f64,
	pub level: f64,
	pub badge: f64,
	pub activity: f64,
	pub review_count: f64,
	pub review_rating: f64,
	pub total: f64,
}

/// Computes the additive visibility score. Total over all inputs: malformed
/// or missing fields degrade to their documented defaults instead of failing
/// the whole computation.
pub fn visibility_score(signals: &ScoreSignals, now: OffsetDateTime) -> ScoreBreakdown {
	let manual = signals
		.manual_rank
		.map(|rank| f64::from(rank.clamp(MANUAL_RANK_MIN, MANUAL_RANK_MAX)))
		.unwrap_or(0.0);
	let level = signals.level.score();
	let badge = signals.badges.score();
	let activity = activity_score(signals.last_active_at, now);
	let (review_count, review_rating) = match signals.reviews {
		Some(reviews) => (count_score(reviews.published_count), rating_score(&reviews)),
		None => (0.0, 0.0),
	};
	let total = (manual + level + badge + activity + review_count + review_rating).max(0.0);

	ScoreBreakdown { manual, level, badge, activity, review_count, review_rating, total }
}

/// Activity decay over `now - last_active_at`. Buckets are left-closed /
/// right-open on the day boundary, first match wins. A negative age from
/// clock skew lands in the freshest bucket.
fn activity_score(last_active_at: Option<OffsetDateTime>, now: OffsetDateTime) -> f64 {
	let Some(last_active_at) = last_active_at else {
		return 0.0;
	};
	let age = now - last_active_at;

	if age < Duration::days(1) {
		100.0
	} else if age < Duration::days(7) {
		75.0
	} else if age < Duration::days(30) {
		50.0
	} else if age < Duration::days(90) {
		25.0
	} else {
		0.0
	}
}

fn count_score(published_count: i64) -> f64 {
	if published_count >= 50 {
		250.0
	} else if published_count >= 30 {
		200.0
	} else if published_count >= 20 {
		150.0
	} else if published_count >= 10 {
		100.0
	} else if published_count >= 5 {
		50.0
	} else if published_count >= 1 {
		25.0
	} else {
		0.0
	}
}

fn rating_score(reviews: &ReviewStats) -> f64 {
	if reviews.published_count < 1 || !reviews.average_rating.is_finite() {
		return 0.0;
	}

	let rating = reviews.average_rating;

	if rating >= 4.8 {
		250.0
	} else if rating >= 4.5 {
		200.0
	} else if rating >= 4.2 {
		150.0
	} else if rating >= 4.0 {
		100.0
	} else if rating >= 3.5 {
		50.0
	} else {
		0.0
	}
}
