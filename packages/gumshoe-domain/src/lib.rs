mod ranking;
mod score;

pub use ranking::{RankingKey, cmp_f64_desc, compare_for_ranking};
pub use score::{
	Badges, DetectiveLevel, MANUAL_RANK_MAX, MANUAL_RANK_MIN, ReviewStats, ScoreBreakdown,
	ScoreSignals, visibility_score,
};
