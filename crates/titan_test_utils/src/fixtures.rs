//! Test fixtures and helpers.
//!
//! Pre-built games and unit placements for consistent testing.

use fixed::types::I32F32;
use titan_core::archetype::ArchetypeId;
use titan_core::config::GameConfig;
use titan_core::math::Vec2Fixed;
use titan_core::simulation::{Simulation, UnitSpawnParams};
use titan_core::unit::{Team, UnitId};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Default archetype ids by catalog position.
pub mod archetypes {
    use titan_core::archetype::ArchetypeId;

    /// Eren: 30 cost, 100 hp, 25 attack. Cheapest after the discount (24).
    pub const EREN: ArchetypeId = ArchetypeId(0);
    /// Mikasa: 40 cost, 80 hp, 35 attack.
    pub const MIKASA: ArchetypeId = ArchetypeId(1);
    /// Armin: 35 cost, 60 hp, 30 attack.
    pub const ARMIN: ArchetypeId = ArchetypeId(2);
    /// Levi: 60 cost, 95 hp, 50 attack.
    pub const LEVI: ArchetypeId = ArchetypeId(3);
    /// Jorbeck: 50 cost, 110 hp, 40 attack.
    pub const JORBECK: ArchetypeId = ArchetypeId(5);
    /// Connie: 38 cost, 80 hp, 30 attack.
    pub const CONNIE: ArchetypeId = ArchetypeId(9);
}

/// Default config with passive gold drift turned off.
///
/// Tests that count gold exactly need this; drift rolls otherwise add
/// one gold at random ticks.
#[must_use]
pub fn no_drift_config() -> GameConfig {
    let mut config = GameConfig::default();
    config.economy.drift_numerator = 0;
    config
}

/// A stock game without gold drift.
///
/// # Panics
///
/// Never with the stock configuration.
#[must_use]
pub fn quiet_simulation(seed: u64) -> Simulation {
    Simulation::with_config(no_drift_config(), seed).expect("stock config is valid")
}

/// Place a unit at integer coordinates, bypassing gold and the wave quota.
///
/// # Panics
///
/// Panics if the archetype is not in the catalog.
pub fn place_unit(
    sim: &mut Simulation,
    archetype: ArchetypeId,
    team: Team,
    x: i32,
    y: i32,
) -> UnitId {
    sim.spawn_unit(UnitSpawnParams {
        archetype,
        team,
        position: Vec2Fixed::from_ints(x, y),
    })
    .expect("archetype in catalog")
}

/// Player line facing an enemy line at close range.
///
/// Both lines use the same archetype so fights are symmetric.
#[must_use]
pub fn skirmish(seed: u64, archetype: ArchetypeId, per_side: i32) -> Simulation {
    let mut sim = quiet_simulation(seed);
    for i in 0..per_side {
        let y = 110 + i * 30;
        place_unit(&mut sim, archetype, Team::Player, 300, y);
        place_unit(&mut sim, archetype, Team::Enemy, 400, y);
    }
    sim
}

/// Tick `sim` until `done` holds or `limit` ticks pass. Returns ticks run.
pub fn tick_until<F>(sim: &mut Simulation, limit: u64, mut done: F) -> u64
where
    F: FnMut(&Simulation) -> bool,
{
    let mut ticks = 0;
    while ticks < limit && !done(sim) {
        sim.tick();
        ticks += 1;
    }
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_helpers() {
        assert_eq!(fixed(3), I32F32::from_num(3));
        assert_eq!(fixed_f(0.5) * fixed(2), fixed(1));
    }

    #[test]
    fn test_skirmish_places_both_sides() {
        let sim = skirmish(1, archetypes::EREN, 3);
        assert_eq!(sim.player_units().len(), 3);
        assert_eq!(sim.enemy_units().len(), 3);
    }

    #[test]
    fn test_tick_until_stops_on_condition() {
        let mut sim = quiet_simulation(1);
        let ran = tick_until(&mut sim, 1000, |s| s.get_tick() == 10);
        assert_eq!(ran, 10);
    }
}
