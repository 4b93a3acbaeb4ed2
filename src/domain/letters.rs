/// Letter pool generation — answer letters plus random decoys.
///
/// ## Decoy count
///
/// For an answer of length L, the decoy count D is drawn uniformly from
/// the inclusive range `[max(1, 6−L), max(3, 6−L)]`. Short answers get
/// padded up toward a six-letter pool; long answers still get 1–3 decoys.
///
/// ## Decoy distinctness
///
/// Every decoy is an uppercase ASCII letter distinct from every letter
/// already in the pool (answer letters and earlier decoys). Redraw on
/// collision. Once the pool holds all 26 letters no further decoy can be
/// distinct, so generation stops early rather than looping.
///
/// The final order is a uniform random permutation (`SliceRandom::shuffle`).
/// Pure aside from the injected RNG; reseed for deterministic tests.

use rand::seq::SliceRandom;
use rand::Rng;

/// One selectable letter key in the pool.
///
/// `used` means the key is non-selectable: its letter has been spent into
/// the guess buffer, or claimed by a hint placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolSlot {
    pub letter: char,
    pub used: bool,
}

impl PoolSlot {
    fn fresh(letter: char) -> Self {
        PoolSlot { letter, used: false }
    }
}

/// Build a shuffled pool for the given answer.
pub fn generate<R: Rng>(answer: &str, rng: &mut R) -> Vec<PoolSlot> {
    let len = answer.chars().count();
    let mut letters: Vec<char> = answer.chars().collect();

    let lo = 1.max(6_i32.saturating_sub(len as i32)) as usize;
    let hi = 3.max(6_i32.saturating_sub(len as i32)) as usize;
    let decoys = rng.random_range(lo..=hi);

    for _ in 0..decoys {
        // All 26 letters present → no distinct decoy exists.
        if distinct_count(&letters) >= 26 {
            break;
        }
        loop {
            let candidate = (b'A' + rng.random_range(0..26u8)) as char;
            if !letters.contains(&candidate) {
                letters.push(candidate);
                break;
            }
        }
    }

    letters.shuffle(rng);
    letters.into_iter().map(PoolSlot::fresh).collect()
}

fn distinct_count(letters: &[char]) -> usize {
    let mut seen = [false; 26];
    for &c in letters {
        if c.is_ascii_uppercase() {
            seen[(c as u8 - b'A') as usize] = true;
        }
    }
    seen.iter().filter(|&&s| s).count()
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn counts(letters: &[char]) -> std::collections::HashMap<char, usize> {
        let mut m = std::collections::HashMap::new();
        for &c in letters {
            *m.entry(c).or_insert(0) += 1;
        }
        m
    }

    #[test]
    fn pool_size_within_decoy_range() {
        for (answer, lo, hi) in [("CAT", 3, 3), ("HOUSE", 1, 3), ("ELEPHANT", 1, 3)] {
            for seed in 0..50 {
                let mut rng = StdRng::seed_from_u64(seed);
                let pool = generate(answer, &mut rng);
                let d = pool.len() - answer.len();
                assert!(d >= lo && d <= hi, "{answer}: {d} decoys outside [{lo},{hi}]");
            }
        }
    }

    #[test]
    fn short_answer_gets_wider_decoy_range() {
        // L=3 → [3,3]; L=4 → [2,3]; L=5 → [1,3]
        let mut rng = StdRng::seed_from_u64(7);
        let pool = generate("SUN", &mut rng);
        assert_eq!(pool.len(), 6);
    }

    #[test]
    fn answer_letters_present_at_full_multiplicity() {
        let mut rng = StdRng::seed_from_u64(42);
        let pool = generate("BALLOON", &mut rng);
        let letters: Vec<char> = pool.iter().map(|s| s.letter).collect();
        let have = counts(&letters);
        let want = counts(&"BALLOON".chars().collect::<Vec<_>>());
        for (c, n) in want {
            assert!(have.get(&c).copied().unwrap_or(0) >= n, "missing {n}x '{c}'");
        }
    }

    #[test]
    fn decoys_distinct_from_answer_and_each_other() {
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let answer = "TREE";
            let pool = generate(answer, &mut rng);
            let letters: Vec<char> = pool.iter().map(|s| s.letter).collect();
            let have = counts(&letters);
            let want = counts(&answer.chars().collect::<Vec<_>>());
            // Any letter beyond the answer multiset is a decoy and must be unique.
            for (c, n) in have {
                let base = want.get(&c).copied().unwrap_or(0);
                assert!(n <= base + 1, "decoy '{c}' duplicated or collides");
                if base > 0 {
                    assert_eq!(n, base, "decoy '{c}' collides with answer letter");
                }
            }
        }
    }

    #[test]
    fn same_seed_same_pool() {
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        assert_eq!(generate("PICTURE", &mut a), generate("PICTURE", &mut b));
    }

    #[test]
    fn full_alphabet_answer_stops_adding_decoys() {
        let answer: String = ('A'..='Z').collect();
        let mut rng = StdRng::seed_from_u64(3);
        let pool = generate(&answer, &mut rng);
        assert_eq!(pool.len(), 26);
    }

    #[test]
    fn slots_start_selectable() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate("DOG", &mut rng).iter().all(|s| !s.used));
    }
}
