//! Wave table and per-wave spawn bookkeeping.

use serde::{Deserialize, Serialize};

/// One row of the wave table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveDefinition {
    /// Enemies spawned before the wave can be cleared.
    pub enemies: u32,
    /// Spawn pressure in percent (100 = 1.0). Higher spawns faster.
    pub difficulty_pct: u32,
}

impl WaveDefinition {
    /// Create a wave definition.
    #[must_use]
    pub const fn new(enemies: u32, difficulty_pct: u32) -> Self {
        Self {
            enemies,
            difficulty_pct,
        }
    }

    /// Whether a spawn timer has run past this wave's interval.
    ///
    /// The interval is `base - difficulty × step` ticks; integer math on a
    /// ×100 scale keeps fractional difficulties exact.
    #[must_use]
    pub fn timer_elapsed(&self, timer: u32, base_interval: u32, step_per_difficulty: u32) -> bool {
        let lhs = i64::from(timer) * 100;
        let rhs = i64::from(base_interval) * 100
            - i64::from(self.difficulty_pct) * i64::from(step_per_difficulty);
        lhs > rhs
    }
}

/// The ten default waves.
#[must_use]
pub fn default_waves() -> Vec<WaveDefinition> {
    vec![
        WaveDefinition::new(3, 100),
        WaveDefinition::new(4, 120),
        WaveDefinition::new(5, 140),
        WaveDefinition::new(6, 160),
        WaveDefinition::new(7, 180),
        WaveDefinition::new(8, 200),
        WaveDefinition::new(5, 220),
        WaveDefinition::new(6, 240),
        WaveDefinition::new(7, 260),
        WaveDefinition::new(8, 300),
    ]
}

/// Progress through the current wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaveState {
    /// 1-based wave number. One past the last wave once the game is cleared.
    pub number: u32,
    /// Enemies spawned so far this wave.
    pub spawned: u32,
    /// Ticks since the last spawn.
    pub spawn_timer: u32,
}

impl WaveState {
    /// Fresh state for a wave number.
    #[must_use]
    pub const fn start(number: u32) -> Self {
        Self {
            number,
            spawned: 0,
            spawn_timer: 0,
        }
    }

    /// Whether the quota of `definition` has been spawned.
    #[must_use]
    pub const fn all_spawned(&self, definition: &WaveDefinition) -> bool {
        self.spawned >= definition.enemies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_shape() {
        let waves = default_waves();
        assert_eq!(waves.len(), 10);
        assert_eq!(waves[0], WaveDefinition::new(3, 100));
        assert_eq!(waves[9], WaveDefinition::new(8, 300));
    }

    #[test]
    fn test_interval_for_first_wave() {
        // 60 - 1.0 × 5 = 55: the 56th increment fires.
        let wave = WaveDefinition::new(3, 100);
        assert!(!wave.timer_elapsed(55, 60, 5));
        assert!(wave.timer_elapsed(56, 60, 5));
    }

    #[test]
    fn test_interval_with_fractional_difficulty() {
        // 60 - 1.3 × 5 = 53.5
        let wave = WaveDefinition::new(1, 130);
        assert!(!wave.timer_elapsed(53, 60, 5));
        assert!(wave.timer_elapsed(54, 60, 5));
    }

    #[test]
    fn test_all_spawned() {
        let wave = WaveDefinition::new(2, 100);
        let mut state = WaveState::start(1);
        assert!(!state.all_spawned(&wave));
        state.spawned = 2;
        assert!(state.all_spawned(&wave));
    }
}
