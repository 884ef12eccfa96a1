use rand::Rng;

/// 原地 Fisher–Yates 洗牌：i 从最后一个下标递减到 1，与 [0, i] 内均匀选取的 j 交换。
/// 取洗牌结果的前缀即为无放回的均匀随机子集。
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut items: Vec<u32> = (0..50).collect();
        fisher_yates(&mut items, &mut rng);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_shuffle_handles_tiny_slices() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut empty: Vec<u8> = vec![];
        fisher_yates(&mut empty, &mut rng);
        assert!(empty.is_empty());

        let mut one = vec![42];
        fisher_yates(&mut one, &mut rng);
        assert_eq!(one, vec![42]);
    }

    #[test]
    fn test_every_permutation_is_roughly_equally_likely() {
        // 3 个元素共 6 种排列，每种期望 10000 次
        let mut rng = StdRng::seed_from_u64(2024);
        let trials = 60_000;
        let mut counts: HashMap<Vec<u8>, u32> = HashMap::new();
        for _ in 0..trials {
            let mut items = vec![0u8, 1, 2];
            fisher_yates(&mut items, &mut rng);
            *counts.entry(items).or_default() += 1;
        }
        assert_eq!(counts.len(), 6);
        for (perm, count) in counts {
            assert!(
                (9_400..=10_600).contains(&count),
                "permutation {perm:?} drawn {count} times"
            );
        }
    }
}
