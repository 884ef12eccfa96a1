use super::shuffle::fisher_yates;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;

/// 可参与抽奖的对象
pub trait DrawCandidate {
    /// 分组标识，None 表示不受分组限制
    fn group(&self) -> Option<&str>;
    /// 是否明确标记为非亲属（stranger）
    fn is_stranger(&self) -> bool;
}

/// 抽奖策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawPolicy {
    /// 洗牌后直接取前 N 个
    #[default]
    Unrestricted,
    /// 先从 stranger 中抽取 stranger_quota 个，再从剩余参赛者补足；
    /// 同一分组最多一人中奖
    GroupFair { stranger_quota: usize },
}

/// 从参赛池中抽取最多 `count` 个不重复的中奖者（count 超过池大小时按池大小截断）。
///
/// `GroupFair` 下若分组冲突导致候选不足，返回的中奖者数量可能少于 `count`。
pub fn select_winners<T, R>(pool: Vec<T>, count: usize, policy: DrawPolicy, rng: &mut R) -> Vec<T>
where
    T: DrawCandidate,
    R: Rng + ?Sized,
{
    let mut shuffled = pool;
    fisher_yates(&mut shuffled, rng);

    let target = count.min(shuffled.len());

    match policy {
        DrawPolicy::Unrestricted => {
            shuffled.truncate(target);
            shuffled
        }
        DrawPolicy::GroupFair { stranger_quota } => {
            let mut taken = vec![false; shuffled.len()];
            let mut groups: HashSet<String> = HashSet::new();
            let mut picks: Vec<usize> = Vec::with_capacity(target);

            fill(
                &shuffled,
                &mut taken,
                &mut groups,
                &mut picks,
                stranger_quota.min(target),
                |c| c.is_stranger(),
            );
            fill(&shuffled, &mut taken, &mut groups, &mut picks, target, |_| true);

            let mut slots: Vec<Option<T>> = shuffled.into_iter().map(Some).collect();
            picks
                .into_iter()
                .filter_map(|idx| slots[idx].take())
                .collect()
        }
    }
}

/// 按洗牌顺序挑选满足条件且分组未出现过的候选，直到 picks 达到 limit
fn fill<T: DrawCandidate>(
    pool: &[T],
    taken: &mut [bool],
    groups: &mut HashSet<String>,
    picks: &mut Vec<usize>,
    limit: usize,
    eligible: impl Fn(&T) -> bool,
) {
    for (idx, candidate) in pool.iter().enumerate() {
        if picks.len() >= limit {
            break;
        }
        if taken[idx] || !eligible(candidate) {
            continue;
        }
        if let Some(group) = candidate.group()
            && !groups.insert(group.to_string())
        {
            continue;
        }
        taken[idx] = true;
        picks.push(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::{BTreeSet, HashMap};

    #[derive(Debug, Clone, PartialEq)]
    struct Ticket {
        id: u32,
        group: Option<&'static str>,
        stranger: bool,
    }

    impl DrawCandidate for Ticket {
        fn group(&self) -> Option<&str> {
            self.group
        }
        fn is_stranger(&self) -> bool {
            self.stranger
        }
    }

    fn plain(n: u32) -> Vec<Ticket> {
        (1..=n)
            .map(|id| Ticket {
                id,
                group: None,
                stranger: false,
            })
            .collect()
    }

    fn ticket(id: u32, group: Option<&'static str>, stranger: bool) -> Ticket {
        Ticket {
            id,
            group,
            stranger,
        }
    }

    #[test]
    fn test_count_is_clamped_to_pool_size() {
        let mut rng = StdRng::seed_from_u64(1);
        let winners = select_winners(plain(5), 10, DrawPolicy::Unrestricted, &mut rng);
        assert_eq!(winners.len(), 5);
        let ids: BTreeSet<u32> = winners.iter().map(|t| t.id).collect();
        assert_eq!(ids, (1..=5).collect());
    }

    #[test]
    fn test_winners_are_distinct() {
        let mut rng = StdRng::seed_from_u64(3);
        let winners = select_winners(plain(100), 30, DrawPolicy::Unrestricted, &mut rng);
        let ids: BTreeSet<u32> = winners.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), 30);
    }

    #[test]
    fn test_zero_count_yields_nobody() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(select_winners(plain(4), 0, DrawPolicy::Unrestricted, &mut rng).is_empty());
    }

    #[test]
    fn test_subset_selection_is_roughly_uniform() {
        // 从 5 人中抽 2 人，共 10 种组合，每种期望 4000 次
        let mut rng = StdRng::seed_from_u64(99);
        let trials = 40_000;
        let mut counts: HashMap<(u32, u32), u32> = HashMap::new();
        for _ in 0..trials {
            let winners = select_winners(plain(5), 2, DrawPolicy::Unrestricted, &mut rng);
            let (a, b) = (winners[0].id, winners[1].id);
            *counts.entry((a.min(b), a.max(b))).or_default() += 1;
        }
        assert_eq!(counts.len(), 10);

        let expected = trials as f64 / 10.0;
        let chi_square: f64 = counts
            .values()
            .map(|&c| (c as f64 - expected).powi(2) / expected)
            .sum();
        // 自由度 9，p = 0.0001 的临界值约为 33.7
        assert!(chi_square < 33.7, "chi-square too large: {chi_square}");
    }

    #[test]
    fn test_group_fair_never_repeats_a_group() {
        let pool = vec![
            ticket(1, Some("family-a"), false),
            ticket(2, Some("family-a"), false),
            ticket(3, Some("family-b"), true),
            ticket(4, Some("family-b"), false),
            ticket(5, Some("family-c"), true),
            ticket(6, None, false),
            ticket(7, None, true),
        ];
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let winners = select_winners(
                pool.clone(),
                7,
                DrawPolicy::GroupFair { stranger_quota: 2 },
                &mut rng,
            );
            let groups: Vec<&str> = winners.iter().filter_map(|t| t.group).collect();
            let unique: BTreeSet<&str> = groups.iter().copied().collect();
            assert_eq!(groups.len(), unique.len(), "seed {seed}: {winners:?}");
            // 3 个分组各一人 + 2 个无分组
            assert_eq!(winners.len(), 5);
        }
    }

    #[test]
    fn test_group_fair_fills_stranger_quota_first() {
        let pool = vec![
            ticket(1, None, false),
            ticket(2, None, false),
            ticket(3, None, false),
            ticket(4, None, true),
            ticket(5, None, true),
        ];
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let winners = select_winners(
                pool.clone(),
                3,
                DrawPolicy::GroupFair { stranger_quota: 2 },
                &mut rng,
            );
            assert_eq!(winners.len(), 3);
            assert!(winners[0].stranger && winners[1].stranger);
            assert!(!winners[2].stranger);
        }
    }

    #[test]
    fn test_group_fair_excludes_groups_won_by_strangers() {
        let pool = vec![
            ticket(1, Some("g"), true),
            ticket(2, Some("g"), false),
            ticket(3, Some("g"), false),
        ];
        let mut rng = StdRng::seed_from_u64(5);
        let winners = select_winners(
            pool,
            3,
            DrawPolicy::GroupFair { stranger_quota: 1 },
            &mut rng,
        );
        assert_eq!(winners, vec![ticket(1, Some("g"), true)]);
    }

    #[test]
    fn test_group_fair_quota_larger_than_count() {
        let pool = vec![
            ticket(1, None, true),
            ticket(2, None, true),
            ticket(3, None, true),
        ];
        let mut rng = StdRng::seed_from_u64(11);
        let winners = select_winners(
            pool,
            2,
            DrawPolicy::GroupFair { stranger_quota: 10 },
            &mut rng,
        );
        assert_eq!(winners.len(), 2);
    }

    #[test]
    fn test_policy_serde_shape() {
        let p: DrawPolicy =
            serde_json::from_str(r#"{"kind":"group_fair","stranger_quota":2}"#).unwrap();
        assert_eq!(p, DrawPolicy::GroupFair { stranger_quota: 2 });
        let p: DrawPolicy = serde_json::from_str(r#"{"kind":"unrestricted"}"#).unwrap();
        assert_eq!(p, DrawPolicy::Unrestricted);
    }
}
