use std::cmp::Ordering;

use time::OffsetDateTime;
use uuid::Uuid;

/// Per-detective sort key for ranked surfaces. Only visible detectives get a
/// key; the visibility gate is applied before ordering, never after.
#[derive(Clone, Copy, Debug)]
pub struct RankingKey {
	pub detective_id: Uuid,
	pub manual_rank: Option<i32>,
	pub score: f64,
	pub review_count: i64,
	pub last_active_at: Option<OffsetDateTime>,
}

/// Tie-break chain: manual rank (descending, absent after present), total
/// score (descending), published review count (descending), last activity
/// (descending, absent last), detective id (ascending). The final key makes
/// the order total, so repeated sorts of the same snapshot always agree.
pub fn compare_for_ranking(a: &RankingKey, b: &RankingKey) -> Ordering {
	manual_rank_desc(a.manual_rank, b.manual_rank)
		.then_with(|| cmp_f64_desc(a.score, b.score))
		.then_with(|| b.review_count.cmp(&a.review_count))
		.then_with(|| timestamp_desc(a.last_active_at, b.last_active_at))
		.then_with(|| a.detective_id.cmp(&b.detective_id))
}

fn manual_rank_desc(left: Option<i32>, right: Option<i32>) -> Ordering {
	match (left, right) {
		(Some(lhs), Some(rhs)) => rhs.cmp(&lhs),
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => Ordering::Equal,
	}
}

fn timestamp_desc(left: Option<OffsetDateTime>, right: Option<OffsetDateTime>) -> Ordering {
	match (left, right) {
		(Some(lhs), Some(rhs)) => rhs.cmp(&lhs),
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => Ordering::Equal,
	}
}

pub fn cmp_f64_desc(a: f64, b: f64) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

#[cfg(test)]
mod tests {
	use std::cmp::Ordering;

	use time::{Duration, OffsetDateTime, macros::datetime};
	use uuid::Uuid;

	use crate::ranking::{RankingKey, cmp_f64_desc, compare_for_ranking};

	const NOW: OffsetDateTime = datetime!(2025-06-01 12:00 UTC);

	fn key(id: u128) -> RankingKey {
		RankingKey {
			detective_id: Uuid::from_u128(id),
			manual_rank: None,
			score: 0.0,
			review_count: 0,
			last_active_at: None,
		}
	}

	#[test]
	fn manual_rank_beats_any_computed_score() {
		let mut ranked = key(1);
		let mut unranked = key(2);

		ranked.manual_rank = Some(10);
		ranked.score = 110.0;
		unranked.score = 2_000.0;

		assert_eq!(compare_for_ranking(&ranked, &unranked), Ordering::Less);
		assert_eq!(compare_for_ranking(&unranked, &ranked), Ordering::Greater);
	}

	#[test]
	fn higher_manual_rank_wins_between_ranked() {
		let mut a = key(1);
		let mut b = key(2);

		a.manual_rank = Some(900);
		b.manual_rank = Some(10);

		assert_eq!(compare_for_ranking(&a, &b), Ordering::Less);
	}

	#[test]
	fn score_orders_unranked_detectives() {
		let mut a = key(1);
		let mut b = key(2);

		a.score = 700.0;
		b.score = 650.0;

		assert_eq!(compare_for_ranking(&a, &b), Ordering::Less);
	}

	#[test]
	fn review_count_breaks_score_ties() {
		let mut a = key(1);
		let mut b = key(2);

		a.score = 500.0;
		b.score = 500.0;
		a.review_count = 3;
		b.review_count = 40;

		assert_eq!(compare_for_ranking(&a, &b), Ordering::Greater);
	}

	#[test]
	fn activity_breaks_review_ties_and_absent_sorts_last() {
		let mut a = key(1);
		let mut b = key(2);
		let mut c = key(3);

		a.last_active_at = Some(NOW - Duration::days(2));
		b.last_active_at = Some(NOW);
		c.last_active_at = None;

		assert_eq!(compare_for_ranking(&b, &a), Ordering::Less);
		assert_eq!(compare_for_ranking(&a, &c), Ordering::Less);
	}

	#[test]
	fn detective_id_makes_the_order_total() {
		let a = key(1);
		let b = key(2);

		assert_eq!(compare_for_ranking(&a, &b), Ordering::Less);
		assert_eq!(compare_for_ranking(&b, &a), Ordering::Greater);
		assert_eq!(compare_for_ranking(&a, &a), Ordering::Equal);
	}

	#[test]
	fn sort_is_stable_across_shuffles() {
		let mut keys: Vec<RankingKey> = (0..16_u128)
			.map(|id| {
				let mut key = key(id);

				key.manual_rank = if id % 5 == 0 { Some((id % 7) as i32) } else { None };
				key.score = f64::from((id % 4) as u32) * 100.0;
				key.review_count = (id % 3) as i64;

				key
			})
			.collect();
		let mut sorted = keys.clone();

		sorted.sort_by(compare_for_ranking);

		keys.reverse();
		keys.sort_by(compare_for_ranking);

		let lhs: Vec<Uuid> = sorted.iter().map(|key| key.detective_id).collect();
		let rhs: Vec<Uuid> = keys.iter().map(|key| key.detective_id).collect();

		assert_eq!(lhs, rhs);
	}

	#[test]
	fn nan_scores_sort_after_real_scores() {
		assert_eq!(cmp_f64_desc(f64::NAN, 1.0), Ordering::Greater);
		assert_eq!(cmp_f64_desc(1.0, f64::NAN), Ordering::Less);
		assert_eq!(cmp_f64_desc(f64::NAN, f64::NAN), Ordering::Equal);
	}
}
