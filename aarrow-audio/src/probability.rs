//! Per-step probability gate.
//!
//! A step sounds only when its roll `r` in `1..=100` is strictly above the
//! skip threshold. Up/Down steps roll a fixed 100 and always pass any legal
//! threshold; Random steps take the roll from the same draw that picks the note.

/// Roll used for steps that are not randomized.
pub const ALWAYS_ROLL: u8 = 100;

/// One random draw split into a pool index and a gate roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRoll {
    pub index: usize,
    pub chance: u8, // 1-100
}

#[derive(Debug, Clone)]
pub struct ProbabilityGate {
    rng: fastrand::Rng,
}

impl Default for ProbabilityGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbabilityGate {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng.seed(seed);
    }

    /// Draw a uniform index in `0..pool_len` and a roll in `1..=100` from one value.
    /// `pool_len` must be non-zero.
    pub fn roll(&mut self, pool_len: usize) -> StepRoll {
        let draw = self.rng.u64(..);
        let hi = draw >> 32;
        let lo = draw & 0xFFFF_FFFF;
        StepRoll {
            index: ((hi * pool_len as u64) >> 32) as usize,
            chance: (((lo * 100) >> 32) + 1) as u8,
        }
    }
}

/// Whether a step with roll `chance` sounds under skip `threshold` (0-99).
pub fn passes(chance: u8, threshold: u8) -> bool {
    chance > threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_zero_always_sounds() {
        for r in 1..=100 {
            assert!(passes(r, 0));
        }
    }

    #[test]
    fn threshold_99_only_passes_100() {
        for r in 1..=99 {
            assert!(!passes(r, 99));
        }
        assert!(passes(100, 99));
        assert!(passes(ALWAYS_ROLL, 99));
    }

    #[test]
    fn rolls_stay_in_range() {
        let mut gate = ProbabilityGate::with_seed(7);
        let mut seen_low = false;
        let mut seen_high = false;
        for _ in 0..20_000 {
            let roll = gate.roll(5);
            assert!(roll.index < 5);
            assert!((1..=100).contains(&roll.chance));
            seen_low |= roll.chance <= 5;
            seen_high |= roll.chance >= 96;
        }
        assert!(seen_low && seen_high);
    }

    #[test]
    fn every_index_is_reachable() {
        let mut gate = ProbabilityGate::with_seed(11);
        let mut hits = [0u32; 4];
        for _ in 0..4000 {
            hits[gate.roll(4).index] += 1;
        }
        assert!(hits.iter().all(|&h| h > 800), "{:?}", hits);
    }

    #[test]
    fn same_seed_same_rolls() {
        let mut a = ProbabilityGate::with_seed(42);
        let mut b = ProbabilityGate::with_seed(42);
        for _ in 0..100 {
            assert_eq!(a.roll(7), b.roll(7));
        }
    }
}
