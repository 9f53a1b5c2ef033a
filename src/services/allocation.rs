//! 互评候选选择
//!
//! 纯函数，不访问存储。候选列表需按 (created_at, uuid) 升序排列。

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::models::assessments::entities::PeerCandidate;

/// 选择参数
#[derive(Debug, Clone, Copy)]
pub struct SelectionRules {
    // 提交需要的互评数量
    pub required: u32,
    // 已满足要求的提交是否仍可分配
    pub over_grading_allowed: bool,
    // 评估数最少的候选中参与随机挑选的数量
    pub tie_window: usize,
    // 领取记录视为正在评估的时长
    pub checkout_timeout: Duration,
}

impl SelectionRules {
    /// 候选是否仍需要（或允许）更多互评
    pub fn is_eligible(&self, candidate: &PeerCandidate) -> bool {
        self.over_grading_allowed || candidate.assessment_count < self.required
    }

    /// 候选是否正被其他评估者评估（领取未过期）
    pub fn is_checked_out(&self, candidate: &PeerCandidate, now: DateTime<Utc>) -> bool {
        candidate
            .checked_out_at
            .is_some_and(|started_at| now - started_at < self.checkout_timeout)
    }
}

/// 从候选中选出下一份待评提交
///
/// 只考虑评估数最少的一组；组内优先选择没有被他人领取的提交，
/// 再在最早的 `tie_window` 份中随机挑选一份。
pub fn select_candidate<R: Rng>(
    candidates: Vec<PeerCandidate>,
    rules: &SelectionRules,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Option<PeerCandidate> {
    let mut eligible: Vec<PeerCandidate> = candidates
        .into_iter()
        .filter(|candidate| rules.is_eligible(candidate))
        .collect();
    // 稳定排序，同数量时保持 (created_at, uuid) 顺序
    eligible.sort_by_key(|candidate| candidate.assessment_count);

    let fewest = eligible.first()?.assessment_count;
    let least_assessed: Vec<PeerCandidate> = eligible
        .into_iter()
        .take_while(|candidate| candidate.assessment_count == fewest)
        .collect();

    let (free, busy): (Vec<_>, Vec<_>) = least_assessed
        .into_iter()
        .partition(|candidate| !rules.is_checked_out(candidate, now));
    let mut pool = if free.is_empty() { busy } else { free };

    let window = rules.tie_window.max(1).min(pool.len());
    let index = rng.random_range(0..window);
    Some(pool.swap_remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::submissions::entities::{StudentItem, Submission};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn candidate(uuid: &str, created_at: i64, count: u32) -> PeerCandidate {
        let created_at = DateTime::<Utc>::from_timestamp(created_at, 0).unwrap();
        PeerCandidate {
            submission: Submission {
                uuid: uuid.to_string(),
                student_item: StudentItem {
                    student_id: format!("student-{uuid}"),
                    item_id: "item".to_string(),
                    course_id: "course".to_string(),
                },
                submitted_at: created_at,
                created_at,
                answer: serde_json::Value::Null,
            },
            assessment_count: count,
            checked_out_at: None,
        }
    }

    fn rules(required: u32, tie_window: usize) -> SelectionRules {
        SelectionRules {
            required,
            over_grading_allowed: false,
            tie_window,
            checkout_timeout: Duration::hours(4),
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(10_000, 0).unwrap()
    }

    fn pick(candidates: Vec<PeerCandidate>, rules: &SelectionRules) -> Option<String> {
        let mut rng = StdRng::seed_from_u64(7);
        select_candidate(candidates, rules, now(), &mut rng).map(|c| c.submission.uuid)
    }

    #[test]
    fn test_fewest_assessments_first() {
        let candidates = vec![
            candidate("a", 1, 2),
            candidate("b", 2, 0),
            candidate("c", 3, 1),
        ];
        assert_eq!(pick(candidates, &rules(3, 1)).as_deref(), Some("b"));
    }

    #[test]
    fn test_oldest_first_within_same_count() {
        let candidates = vec![candidate("a", 1, 1), candidate("b", 2, 1)];
        assert_eq!(pick(candidates, &rules(3, 1)).as_deref(), Some("a"));
    }

    #[test]
    fn test_fully_assessed_excluded_unless_over_grading() {
        let candidates = vec![candidate("a", 1, 2), candidate("b", 2, 2)];
        assert_eq!(pick(candidates.clone(), &rules(2, 1)), None);

        let over = SelectionRules {
            over_grading_allowed: true,
            ..rules(2, 1)
        };
        assert_eq!(pick(candidates, &over).as_deref(), Some("a"));
    }

    #[test]
    fn test_one_short_of_requirement_is_eligible() {
        let candidates = vec![candidate("a", 1, 2)];
        assert_eq!(pick(candidates, &rules(3, 1)).as_deref(), Some("a"));
    }

    #[test]
    fn test_active_checkout_by_other_is_skipped() {
        let mut busy = candidate("a", 1, 0);
        busy.checked_out_at = Some(now() - Duration::minutes(5));
        let candidates = vec![busy, candidate("b", 2, 0)];
        assert_eq!(pick(candidates, &rules(1, 1)).as_deref(), Some("b"));
    }

    #[test]
    fn test_expired_or_only_checkout_still_eligible() {
        let mut stale = candidate("a", 1, 0);
        stale.checked_out_at = Some(now() - Duration::hours(5));
        assert_eq!(
            pick(vec![stale, candidate("b", 2, 0)], &rules(1, 1)).as_deref(),
            Some("a")
        );

        // 所有候选都被领取时仍然分配
        let mut busy = candidate("a", 1, 0);
        busy.checked_out_at = Some(now());
        assert_eq!(pick(vec![busy], &rules(1, 1)).as_deref(), Some("a"));
    }

    #[test]
    fn test_tie_window_limits_random_choice() {
        let candidates: Vec<_> = (0..10)
            .map(|i| candidate(&format!("s{i}"), i, 0))
            .collect();
        let rules = rules(1, 3);
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let chosen = select_candidate(candidates.clone(), &rules, now(), &mut rng).unwrap();
            assert!(["s0", "s1", "s2"].contains(&chosen.submission.uuid.as_str()));
        }
    }

    #[test]
    fn test_empty_pool() {
        assert_eq!(pick(Vec::new(), &rules(1, 3)), None);
    }
}
