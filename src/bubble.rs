//! Bubble data and the spawner that draws them.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Numbers shown in bubbles are drawn from `0..VALUE_LIMIT`.
pub const VALUE_LIMIT: u16 = 1000;
/// Horizontal placement range, percent of the play area width.
pub const LEFT_RANGE: (f64, f64) = (5.0, 90.0);
/// Vertical placement range, percent of the play area height. Kept above the
/// progress bar.
pub const TOP_RANGE: (f64, f64) = (5.0, 75.0);

/// One on-screen bubble.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bubble {
    /// Unique per spawner; bubbles from the same spawner never share an id.
    pub id: u64,
    pub value: u16,
    pub left_pct: f64,
    pub top_pct: f64,
}

/// Result of a spawn: the bubble plus how it was obtained.
#[derive(Clone, Debug, PartialEq)]
pub struct Spawned {
    pub bubble: Bubble,
    /// Number of draws made (1 when the first candidate was accepted).
    pub attempts: u32,
    /// True when the attempt cap was hit and a repeated number was accepted.
    pub forced: bool,
}

pub struct BubbleSpawner {
    rng: SmallRng,
    next_id: u64,
    avoid_repeat: bool,
    max_attempts: u32,
}

impl BubbleSpawner {
    pub fn new(seed: u64, avoid_repeat: bool, max_attempts: u32) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            next_id: 1,
            avoid_repeat,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Draw the next bubble. With repeat avoidance on, candidates whose value
    /// equals `previous` are redrawn up to the attempt cap; the last draw is
    /// kept once the cap is reached.
    pub fn spawn(&mut self, previous: Option<u16>) -> Spawned {
        let mut attempts = 1;
        let mut candidate = self.draw();
        if self.avoid_repeat {
            while previous == Some(candidate.value) && attempts < self.max_attempts {
                attempts += 1;
                candidate = self.draw();
            }
        }
        let forced = self.avoid_repeat && previous == Some(candidate.value);
        Spawned { bubble: self.finish(candidate), attempts, forced }
    }

    fn draw(&mut self) -> Candidate {
        Candidate {
            value: self.rng.gen_range(0..VALUE_LIMIT),
            left_pct: self.rng.gen_range(LEFT_RANGE.0..LEFT_RANGE.1),
            top_pct: self.rng.gen_range(TOP_RANGE.0..TOP_RANGE.1),
        }
    }

    // Ids are only handed out to accepted candidates so they stay dense.
    fn finish(&mut self, c: Candidate) -> Bubble {
        let id = self.next_id;
        self.next_id += 1;
        Bubble { id, value: c.value, left_pct: c.left_pct, top_pct: c.top_pct }
    }
}

struct Candidate {
    value: u16,
    left_pct: f64,
    top_pct: f64,
}

/// Seed for a game RNG. Uses the platform entropy source (browser crypto on
/// wasm) and falls back to the high-resolution timer.
pub fn entropy_seed() -> u64 {
    let mut buf = [0u8; 8];
    match getrandom::getrandom(&mut buf) {
        Ok(()) => u64::from_le_bytes(buf),
        Err(err) => {
            log::warn!("entropy unavailable ({}), seeding from timer", err);
            let now = crate::clock::performance_now();
            now.to_bits()
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_stay_in_range() {
        let mut s = BubbleSpawner::new(7, true, 10);
        let mut prev = None;
        for _ in 0..2_000 {
            let b = s.spawn(prev).bubble;
            assert!(b.value < VALUE_LIMIT);
            assert!(b.left_pct >= LEFT_RANGE.0 && b.left_pct < LEFT_RANGE.1);
            assert!(b.top_pct >= TOP_RANGE.0 && b.top_pct < TOP_RANGE.1);
            prev = Some(b.value);
        }
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let mut s = BubbleSpawner::new(1, false, 10);
        let a = s.spawn(None).bubble.id;
        let b = s.spawn(None).bubble.id;
        let c = s.spawn(Some(3)).bubble.id;
        assert!(a < b && b < c);
    }

    #[test]
    fn never_repeats_previous_value_within_cap() {
        let mut s = BubbleSpawner::new(99, true, 10);
        let mut prev = s.spawn(None).bubble.value;
        for _ in 0..5_000 {
            let sp = s.spawn(Some(prev));
            if !sp.forced {
                assert_ne!(sp.bubble.value, prev);
            }
            assert!(sp.attempts >= 1 && sp.attempts <= 10);
            prev = sp.bubble.value;
        }
    }

    #[test]
    fn repeats_allowed_when_avoidance_is_off() {
        let mut s = BubbleSpawner::new(5, false, 10);
        for v in 0..200u16 {
            let sp = s.spawn(Some(v % VALUE_LIMIT));
            assert_eq!(sp.attempts, 1);
            assert!(!sp.forced);
        }
    }

    #[test]
    fn single_attempt_cap_reports_forced_repeat() {
        // With one attempt the first draw is always kept; find a seed whose first
        // draw we know, then ask to avoid exactly that value.
        let first = BubbleSpawner::new(42, true, 1).spawn(None).bubble.value;
        let sp = BubbleSpawner::new(42, true, 1).spawn(Some(first));
        assert_eq!(sp.attempts, 1);
        assert!(sp.forced);
        assert_eq!(sp.bubble.value, first);
    }

    #[test]
    fn redraw_happens_when_first_draw_repeats() {
        let first = BubbleSpawner::new(42, true, 10).spawn(None).bubble.value;
        let sp = BubbleSpawner::new(42, true, 10).spawn(Some(first));
        assert!(sp.attempts >= 2);
        assert_ne!(sp.bubble.value, first);
        assert!(!sp.forced);
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = BubbleSpawner::new(1234, true, 10);
        let mut b = BubbleSpawner::new(1234, true, 10);
        for _ in 0..50 {
            assert_eq!(a.spawn(None), b.spawn(None));
        }
    }

    #[test]
    fn entropy_seed_runs_natively() {
        // Two seeds colliding would need a 1 in 2^64 coincidence.
        assert_ne!(entropy_seed(), entropy_seed());
    }
}
