//! Core simulation loop.
//!
//! The simulation owns every piece of mutable game state: both unit lists,
//! the treasury, player hit points, wave progress, upgrades and the archetype
//! catalog. The presentation layer drives it with one [`Simulation::tick`]
//! per frame and the player actions below, and reads it back through
//! accessors or a [`Snapshot`](crate::snapshot::Snapshot).
//!
//! # Determinism
//!
//! - Positions use fixed-point math via [`Fixed`]
//! - All randomness comes from a seeded [`ChaCha8Rng`]
//! - Units are processed in list order
//! - Same seed and same commands always produce the same state
//!
//! # Example
//!
//! ```
//! use titan_core::archetype::ArchetypeId;
//! use titan_core::simulation::Simulation;
//!
//! let mut sim = Simulation::new(7);
//! sim.deploy(ArchetypeId(0)).unwrap();
//! sim.tick();
//! assert_eq!(sim.player_units().len(), 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::archetype::{ArchetypeId, Catalog};
use crate::config::GameConfig;
use crate::economy::Treasury;
use crate::error::{GameError, Result};
use crate::math::{Fixed, Vec2Fixed};
use crate::unit::{Team, Unit, UnitId};
use crate::upgrades::{UpgradeCounts, UpgradeKind};
use crate::wave::{WaveDefinition, WaveState};

/// Global difficulty selected by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Enemies spawn with reduced hp and attack.
    Easy,
    /// Stock stats.
    #[default]
    Normal,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Easy => f.write_str("easy"),
            Self::Normal => f.write_str("normal"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "normal" => Ok(Self::Normal),
            other => Err(format!("unknown difficulty '{other}'")),
        }
    }
}

/// Where the game stands. Exactly one holds at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Still being played.
    InProgress,
    /// Every wave cleared.
    Won,
    /// Player hit points reached zero.
    Lost,
}

impl GameStatus {
    /// Whether the game has ended.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// Events generated during a simulation tick.
///
/// The presentation layer uses these for effects; the headless runner
/// aggregates them into match metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickEvents {
    /// False when the tick was skipped (paused or finished).
    pub processed: bool,
    /// Enemies spawned this tick.
    pub spawned: Vec<UnitId>,
    /// Enemies killed in collisions.
    pub enemies_killed: Vec<UnitId>,
    /// Player units killed in collisions.
    pub units_lost: Vec<UnitId>,
    /// Player units that walked off the right edge.
    pub units_exited: Vec<UnitId>,
    /// Enemies that crossed the left edge.
    pub breaches: u32,
    /// Gold credited, bonuses included.
    pub gold_earned: u32,
    /// Player hit points lost.
    pub player_damage: u32,
    /// Wave that started this tick.
    pub wave_started: Option<u32>,
    /// Set on the tick the game ends.
    pub outcome: Option<GameStatus>,
}

/// Parameters for placing a unit directly.
///
/// Bypasses the economy and the spawn timer; used by scenarios and tests.
#[derive(Debug, Clone, Copy)]
pub struct UnitSpawnParams {
    /// Archetype to instantiate at its current level.
    pub archetype: ArchetypeId,
    /// Owning side.
    pub team: Team,
    /// Center position.
    pub position: Vec2Fixed,
}

/// The core game simulation.
///
/// # Tick Order
///
/// 1. **Movement** - advance units, drop dead ones and player units past the right edge
/// 2. **Spawn** - wave timer may add one enemy
/// 3. **Collision** - pairwise damage exchange, then left-edge breaches
/// 4. **Drift** - passive gold roll
/// 5. **Waves** - start the next wave once the current one is cleared
/// 6. **Termination** - loss before win
#[derive(Debug, Clone)]
pub struct Simulation {
    config: GameConfig,
    catalog: Catalog,
    seed: u64,
    rng: ChaCha8Rng,
    tick: u64,
    treasury: Treasury,
    player_hp: u32,
    player_max_hp: u32,
    wave: WaveState,
    difficulty: Difficulty,
    upgrades: UpgradeCounts,
    paused: bool,
    status: GameStatus,
    player_units: Vec<Unit>,
    enemy_units: Vec<Unit>,
    next_unit_id: u32,
}

impl Simulation {
    /// Create a game with the stock configuration.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let config = GameConfig::default();
        let catalog = Catalog::default();
        Self::build(config, catalog, seed)
    }

    /// Create a game from a validated configuration.
    pub fn with_config(config: GameConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let catalog = config.catalog()?;
        Ok(Self::build(config, catalog, seed))
    }

    fn build(config: GameConfig, catalog: Catalog, seed: u64) -> Self {
        let mut sim = Self {
            treasury: Treasury::new(config.starting_gold),
            player_hp: config.starting_hp,
            player_max_hp: config.starting_hp,
            config,
            catalog,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            tick: 0,
            wave: WaveState::start(1),
            difficulty: Difficulty::Normal,
            upgrades: UpgradeCounts::default(),
            paused: false,
            status: GameStatus::InProgress,
            player_units: Vec::new(),
            enemy_units: Vec::new(),
            next_unit_id: 1,
        };
        sim.start_wave(1);
        sim
    }

    /// Replace all game state with a fresh wave-1 game.
    ///
    /// Archetype levels, upgrades, gold, hit points and difficulty all
    /// return to their starting values. The random stream continues.
    pub fn reset(&mut self) {
        let catalog = match self.config.catalog() {
            Ok(catalog) => catalog,
            Err(err) => {
                tracing::error!(error = %err, "Catalog rebuild failed on reset, keeping levels");
                self.catalog.clone()
            }
        };
        let rng = self.rng.clone();
        *self = Self::build(self.config.clone(), catalog, self.seed);
        self.rng = rng;
        tracing::info!(seed = self.seed, "Game reset");
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Number of ticks processed since the last reset.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Seed the random stream started from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Archetype catalog with current levels.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Current gold.
    #[must_use]
    pub const fn gold(&self) -> u32 {
        self.treasury.gold()
    }

    /// Treasury with lifetime totals.
    #[must_use]
    pub const fn treasury(&self) -> &Treasury {
        &self.treasury
    }

    /// Player hit points.
    #[must_use]
    pub const fn player_hp(&self) -> u32 {
        self.player_hp
    }

    /// Player max hit points.
    #[must_use]
    pub const fn player_max_hp(&self) -> u32 {
        self.player_max_hp
    }

    /// Current 1-based wave number; one past the last wave once cleared.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave.number
    }

    /// Spawn progress of the current wave.
    #[must_use]
    pub const fn wave_state(&self) -> &WaveState {
        &self.wave
    }

    /// Number of waves in the game.
    #[must_use]
    pub fn total_waves(&self) -> u32 {
        self.config.total_waves()
    }

    /// Selected difficulty.
    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Upgrade purchase counts.
    #[must_use]
    pub const fn upgrades(&self) -> &UpgradeCounts {
        &self.upgrades
    }

    /// Whether ticks are currently skipped.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Game status.
    #[must_use]
    pub const fn status(&self) -> GameStatus {
        self.status
    }

    /// Live player units in list order.
    #[must_use]
    pub fn player_units(&self) -> &[Unit] {
        &self.player_units
    }

    /// Live enemy units in list order.
    #[must_use]
    pub fn enemy_units(&self) -> &[Unit] {
        &self.enemy_units
    }

    fn current_wave_definition(&self) -> Option<WaveDefinition> {
        let index = usize::try_from(self.wave.number.checked_sub(1)?).ok()?;
        self.config.waves.get(index).copied()
    }

    // ------------------------------------------------------------------
    // Player actions
    // ------------------------------------------------------------------

    /// Deploy a player unit of `archetype` at the left edge.
    ///
    /// Costs the archetype's current price and refunds the deploy rebate.
    ///
    /// # Errors
    ///
    /// [`GameError::InsufficientGold`] leaves gold and units untouched.
    /// [`GameError::UnknownArchetype`] and [`GameError::GameFinished`] as named.
    pub fn deploy(&mut self, archetype: ArchetypeId) -> Result<UnitId> {
        self.ensure_running()?;
        let stats = self.catalog.get(archetype)?.stats();
        self.treasury.spend(stats.cost)?;

        let position = Vec2Fixed::new(
            Fixed::from_num(self.config.combat.edge_inset),
            self.random_lane_y(),
        );
        let id = self.push_unit(archetype, Team::Player, position, stats.hp);
        let rebate = self.award_gold(self.config.economy.deploy_rebate);

        tracing::debug!(
            unit = %id,
            archetype = %archetype,
            cost = stats.cost,
            rebate,
            gold = self.gold(),
            "Unit deployed"
        );
        Ok(id)
    }

    /// Buy one step of an upgrade.
    ///
    /// Returns the counts after the purchase.
    pub fn purchase_upgrade(&mut self, kind: UpgradeKind) -> Result<UpgradeCounts> {
        self.ensure_running()?;
        let price = kind.price(&self.config.upgrades);
        self.treasury.spend(price)?;
        self.upgrades.increment(kind);

        match kind {
            UpgradeKind::CharacterLevel => self.catalog.level_up_all(),
            UpgradeKind::HpIncrease => {
                let bonus = self.config.upgrades.hp_per_upgrade;
                self.player_max_hp = self.player_max_hp.saturating_add(bonus);
                self.player_hp = self.player_hp.saturating_add(bonus).min(self.player_max_hp);
            }
            UpgradeKind::GoldIncrease | UpgradeKind::AttackIncrease => {}
        }

        tracing::debug!(upgrade = %kind, price, gold = self.gold(), "Upgrade purchased");
        Ok(self.upgrades)
    }

    /// Select the difficulty applied to future enemy spawns.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    /// Flip the pause flag; returns the new value.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Place a unit directly at its archetype's current stats.
    ///
    /// Enemy units placed this way still get the easy-difficulty scaling.
    /// They do not count toward the wave quota.
    pub fn spawn_unit(&mut self, params: UnitSpawnParams) -> Result<UnitId> {
        let hp = self.catalog.get(params.archetype)?.stats().hp;
        Ok(self.push_unit(params.archetype, params.team, params.position, hp))
    }

    /// Overwrite the gold stockpile. Scenario and debugging hook.
    pub fn set_gold(&mut self, gold: u32) {
        let old = self.treasury.gold();
        self.treasury = Treasury::new(gold);
        tracing::debug!(old, new = gold, "Gold overridden");
    }

    fn ensure_running(&self) -> Result<()> {
        if self.status.is_finished() {
            return Err(GameError::GameFinished(format!("{:?}", self.status)));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Advance the simulation by one frame.
    ///
    /// A no-op while paused or after the game has ended.
    pub fn tick(&mut self) -> TickEvents {
        let mut events = TickEvents::default();
        if self.paused || self.status.is_finished() {
            return events;
        }
        events.processed = true;
        self.tick += 1;

        // 1. Movement
        self.run_movement(&mut events);

        // 2. Spawn
        self.run_spawner(&mut events);

        // 3. Collision
        self.run_collisions(&mut events);
        self.run_breaches(&mut events);

        // 4. Drift
        let economy = self.config.economy;
        if self
            .rng
            .gen_ratio(economy.drift_numerator, economy.drift_denominator)
        {
            events.gold_earned += self.award_gold(economy.drift_amount);
        }

        // 5. Waves
        self.run_wave_progression(&mut events);

        // 6. Termination
        self.run_termination(&mut events);

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        events
    }

    fn run_movement(&mut self, events: &mut TickEvents) {
        for unit in self.player_units.iter_mut().chain(self.enemy_units.iter_mut()) {
            unit.advance();
        }

        let right_edge = Fixed::from_num(self.config.playfield.width);
        let exited = &mut events.units_exited;
        self.player_units.retain(|unit| {
            if unit.is_dead() {
                return false;
            }
            if unit.position.x >= right_edge {
                exited.push(unit.id);
                return false;
            }
            true
        });
        // Enemies past the left edge stay until breach resolution.
        self.enemy_units.retain(|unit| !unit.is_dead());
    }

    fn run_spawner(&mut self, events: &mut TickEvents) {
        let Some(definition) = self.current_wave_definition() else {
            return;
        };
        if self.wave.all_spawned(&definition) {
            return;
        }

        self.wave.spawn_timer += 1;
        let combat = self.config.combat;
        if !definition.timer_elapsed(
            self.wave.spawn_timer,
            combat.base_spawn_interval,
            combat.spawn_interval_step,
        ) {
            return;
        }
        self.wave.spawn_timer = 0;

        let archetype = ArchetypeId(self.rng.gen_range(0..self.catalog.len()) as u16);
        let hp = match self.catalog.get(archetype) {
            Ok(entry) => entry.stats().hp,
            Err(err) => {
                tracing::error!(error = %err, "Spawner drew an archetype outside the catalog");
                return;
            }
        };
        let position = Vec2Fixed::new(
            Fixed::from_num(self.config.playfield.width - combat.edge_inset),
            self.random_lane_y(),
        );
        let id = self.push_unit(archetype, Team::Enemy, position, hp);
        self.wave.spawned += 1;
        events.spawned.push(id);

        tracing::debug!(
            unit = %id,
            archetype = %archetype,
            wave = self.wave.number,
            spawned = self.wave.spawned,
            quota = definition.enemies,
            "Enemy spawned"
        );
    }

    fn run_collisions(&mut self, events: &mut TickEvents) {
        let radius = Fixed::from_num(self.config.combat.collision_radius);
        let chip_pct = self.config.combat.chip_damage_pct;
        let kill_reward = self.config.economy.kill_reward;

        let mut i = 0;
        while i < self.player_units.len() {
            let mut player_died = false;
            let mut j = 0;
            while j < self.enemy_units.len() {
                let player_pos = self.player_units[i].position;
                if !player_pos.within(self.enemy_units[j].position, radius) {
                    j += 1;
                    continue;
                }

                let damage = self.attack_of(&self.player_units[i]);
                if self.enemy_units[j].apply_damage(damage) {
                    let enemy = self.enemy_units.remove(j);
                    events.enemies_killed.push(enemy.id);
                    events.gold_earned += self.award_gold(kill_reward);
                    continue;
                }

                let enemy_attack = self.attack_of(&self.enemy_units[j]);
                if self.player_units[i].apply_damage(enemy_attack) {
                    let unit = self.player_units.remove(i);
                    events.units_lost.push(unit.id);
                    player_died = true;
                    break;
                }

                let chip = (u64::from(enemy_attack) * u64::from(chip_pct) / 100) as u32;
                events.player_damage += self.damage_player(chip);
                j += 1;
            }
            if !player_died {
                i += 1;
            }
        }
    }

    fn run_breaches(&mut self, events: &mut TickEvents) {
        let mut breaches = 0u32;
        self.enemy_units.retain(|unit| {
            let breached = unit.position.x < Fixed::ZERO;
            if breached {
                breaches += 1;
            }
            !breached
        });
        for _ in 0..breaches {
            events.player_damage += self.damage_player(self.config.combat.breach_damage);
        }
        if breaches > 0 {
            tracing::debug!(breaches, player_hp = self.player_hp, "Enemies breached the left edge");
        }
        events.breaches += breaches;
    }

    fn run_wave_progression(&mut self, events: &mut TickEvents) {
        let Some(definition) = self.current_wave_definition() else {
            return;
        };
        if !self.wave.all_spawned(&definition) || !self.enemy_units.is_empty() {
            return;
        }

        let next = self.wave.number + 1;
        if self.wave.number < self.total_waves() {
            self.start_wave(next);
            events.wave_started = Some(next);
        } else {
            self.wave = WaveState::start(next);
            tracing::debug!(wave = self.wave.number - 1, "Final wave cleared");
        }
    }

    fn run_termination(&mut self, events: &mut TickEvents) {
        if self.player_hp == 0 {
            self.finish(GameStatus::Lost);
        } else if self.wave.number > self.total_waves() && self.enemy_units.is_empty() {
            self.finish(GameStatus::Won);
        } else {
            return;
        }
        events.outcome = Some(self.status);
    }

    fn finish(&mut self, status: GameStatus) {
        self.status = status;
        tracing::info!(
            result = ?status,
            tick = self.tick,
            wave = self.wave.number,
            gold = self.gold(),
            player_hp = self.player_hp,
            "Game over"
        );
    }

    fn start_wave(&mut self, number: u32) {
        self.wave = WaveState::start(number);
        self.player_units.clear();
        self.enemy_units.clear();
        tracing::debug!(wave = number, "Wave started");
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn push_unit(
        &mut self,
        archetype: ArchetypeId,
        team: Team,
        position: Vec2Fixed,
        hp: u32,
    ) -> UnitId {
        let id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;

        let mut unit = Unit::new(
            id,
            archetype,
            team,
            position,
            self.config.combat.unit_speed,
            i32::try_from(hp).unwrap_or(i32::MAX),
        );
        match team {
            Team::Player => self.player_units.push(unit),
            Team::Enemy => {
                if self.difficulty == Difficulty::Easy {
                    unit = unit.scaled(self.config.combat.easy_enemy_scale_pct);
                }
                self.enemy_units.push(unit);
            }
        }
        id
    }

    fn random_lane_y(&mut self) -> Fixed {
        let combat = self.config.combat;
        let span_bits = i64::from(combat.lane_span) << 32;
        Fixed::from_num(combat.lane_min_y) + Fixed::from_bits(self.rng.gen_range(0..span_bits))
    }

    fn attack_of(&self, unit: &Unit) -> u32 {
        match unit.attack(&self.catalog) {
            Ok(attack) => attack,
            Err(err) => {
                debug_assert!(false, "unit {} references a missing archetype", unit.id);
                tracing::error!(unit = %unit.id, error = %err, "Attack lookup failed");
                0
            }
        }
    }

    fn award_gold(&mut self, amount: u32) -> u32 {
        self.treasury.credit(
            amount,
            self.upgrades.gold_increase,
            self.config.economy.bonus_pct_per_upgrade,
        )
    }

    fn damage_player(&mut self, amount: u32) -> u32 {
        let dealt = amount.min(self.player_hp);
        self.player_hp -= dealt;
        dealt
    }

    /// Hash of all simulation state, for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.treasury.hash(&mut hasher);
        self.player_hp.hash(&mut hasher);
        self.player_max_hp.hash(&mut hasher);
        self.wave.hash(&mut hasher);
        self.difficulty.hash(&mut hasher);
        self.upgrades.hash(&mut hasher);
        self.paused.hash(&mut hasher);
        self.status.hash(&mut hasher);
        self.next_unit_id.hash(&mut hasher);

        for (id, archetype) in self.catalog.iter() {
            id.hash(&mut hasher);
            archetype.level().hash(&mut hasher);
        }

        self.player_units.len().hash(&mut hasher);
        for unit in &self.player_units {
            unit.hash(&mut hasher);
        }
        self.enemy_units.len().hash(&mut hasher);
        for unit in &self.enemy_units {
            unit.hash(&mut hasher);
        }

        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.economy.drift_numerator = 0;
        config
    }

    fn sim() -> Simulation {
        Simulation::with_config(quiet_config(), 1).unwrap()
    }

    fn place(sim: &mut Simulation, archetype: u16, team: Team, x: i32, y: i32) -> UnitId {
        sim.spawn_unit(UnitSpawnParams {
            archetype: ArchetypeId(archetype),
            team,
            position: Vec2Fixed::from_ints(x, y),
        })
        .unwrap()
    }

    #[test]
    fn test_simulation_new() {
        let sim = Simulation::new(0);
        assert_eq!(sim.get_tick(), 0);
        assert_eq!(sim.gold(), 50);
        assert_eq!(sim.player_hp(), 100);
        assert_eq!(sim.player_max_hp(), 100);
        assert_eq!(sim.wave(), 1);
        assert_eq!(sim.status(), GameStatus::InProgress);
        assert!(sim.player_units().is_empty());
        assert!(sim.enemy_units().is_empty());
    }

    #[test]
    fn test_tick_increments() {
        let mut sim = sim();
        assert!(sim.tick().processed);
        assert!(sim.tick().processed);
        assert_eq!(sim.get_tick(), 2);
    }

    #[test]
    fn test_pause_skips_ticks() {
        let mut sim = sim();
        assert!(sim.toggle_pause());
        let events = sim.tick();
        assert!(!events.processed);
        assert_eq!(sim.get_tick(), 0);
        assert!(!sim.toggle_pause());
        sim.tick();
        assert_eq!(sim.get_tick(), 1);
    }

    #[test]
    fn test_deploy_places_unit_at_left_edge() {
        let mut sim = sim();
        let id = sim.deploy(ArchetypeId(0)).unwrap();
        let unit = &sim.player_units()[0];
        assert_eq!(unit.id, id);
        assert_eq!(unit.team, Team::Player);
        assert_eq!(unit.position.x, Fixed::from_num(50));
        assert!(unit.position.y >= Fixed::from_num(100));
        assert!(unit.position.y < Fixed::from_num(300));
        assert_eq!(unit.hp, 100);
        // 50 - 24 + 2
        assert_eq!(sim.gold(), 28);
    }

    #[test]
    fn test_deploy_unknown_archetype() {
        let mut sim = sim();
        assert_eq!(
            sim.deploy(ArchetypeId(42)),
            Err(GameError::UnknownArchetype(ArchetypeId(42)))
        );
        assert_eq!(sim.gold(), 50);
    }

    #[test]
    fn test_first_spawn_after_interval() {
        let mut sim = sim();
        for _ in 0..55 {
            assert!(sim.tick().spawned.is_empty());
        }
        let events = sim.tick();
        assert_eq!(events.spawned.len(), 1);
        let enemy = &sim.enemy_units()[0];
        assert_eq!(enemy.team, Team::Enemy);
        assert_eq!(enemy.position.x, Fixed::from_num(950));
        assert_eq!(sim.wave_state().spawned, 1);
        assert_eq!(sim.wave_state().spawn_timer, 0);
    }

    #[test]
    fn test_easy_scales_spawned_enemies() {
        let mut sim = sim();
        sim.set_difficulty(Difficulty::Easy);
        let id = place(&mut sim, 0, Team::Enemy, 500, 200);
        let enemy = sim.enemy_units().iter().find(|u| u.id == id).unwrap();
        assert_eq!(enemy.hp, 80);
        assert_eq!(enemy.max_hp, 80);
        assert_eq!(enemy.attack(sim.catalog()).unwrap(), 20);
        // The shared archetype is untouched.
        assert_eq!(sim.catalog().get(ArchetypeId(0)).unwrap().stats().attack, 25);
    }

    #[test]
    fn test_player_unit_leaves_right_edge() {
        let mut sim = sim();
        let id = place(&mut sim, 0, Team::Player, 997, 200);
        let events = sim.tick();
        assert_eq!(events.units_exited, vec![id]);
        assert!(sim.player_units().is_empty());
    }

    #[test]
    fn test_kill_awards_gold() {
        let mut sim = sim();
        // Levi (50 atk) against Armin (60 hp): two hits.
        place(&mut sim, 3, Team::Player, 400, 200);
        let enemy = place(&mut sim, 2, Team::Enemy, 440, 200);

        let first = sim.tick();
        assert!(first.enemies_killed.is_empty());
        // Armin's 30 attack → 3 chip damage.
        assert_eq!(sim.player_hp(), 97);

        let second = sim.tick();
        assert_eq!(second.enemies_killed, vec![enemy]);
        assert_eq!(second.gold_earned, 10);
        assert_eq!(sim.gold(), 60);
    }

    #[test]
    fn test_player_unit_death_stops_its_scan() {
        let mut sim = sim();
        // Armin (60 hp, 30 atk) against two Levis (95 hp, 50 atk).
        let player = place(&mut sim, 2, Team::Player, 400, 200);
        place(&mut sim, 3, Team::Enemy, 420, 200);
        place(&mut sim, 3, Team::Enemy, 420, 210);

        let events = sim.tick();
        // First Levi hits for 50 (Armin at 10), chip 5; second Levi kills Armin.
        assert_eq!(events.units_lost, vec![player]);
        assert_eq!(sim.player_hp(), 95);
        assert!(sim.player_units().is_empty());
        assert_eq!(sim.enemy_units().len(), 2);
    }

    #[test]
    fn test_hp_upgrade_raises_both() {
        let mut sim = sim();
        sim.set_gold(500);
        let counts = sim.purchase_upgrade(UpgradeKind::HpIncrease).unwrap();
        assert_eq!(counts.hp_increase, 1);
        assert_eq!(sim.player_hp(), 120);
        assert_eq!(sim.player_max_hp(), 120);
        assert_eq!(sim.gold(), 380);
    }

    #[test]
    fn test_character_level_upgrade_levels_catalog() {
        let mut sim = sim();
        sim.set_gold(100);
        sim.purchase_upgrade(UpgradeKind::CharacterLevel).unwrap();
        assert!(sim.catalog().iter().all(|(_, a)| a.level() == 2));
        assert_eq!(sim.gold(), 0);
    }

    #[test]
    fn test_attack_upgrade_is_counter_only() {
        let mut sim = sim();
        sim.set_gold(100);
        let before = sim.catalog().clone();
        let counts = sim.purchase_upgrade(UpgradeKind::AttackIncrease).unwrap();
        assert_eq!(counts.attack_increase, 1);
        assert_eq!(sim.catalog(), &before);
    }

    #[test]
    fn test_upgrade_insufficient_gold() {
        let mut sim = sim();
        let err = sim.purchase_upgrade(UpgradeKind::GoldIncrease).unwrap_err();
        assert_eq!(
            err,
            GameError::InsufficientGold {
                required: 80,
                available: 50
            }
        );
        assert_eq!(sim.upgrades(), &UpgradeCounts::default());
    }

    #[test]
    fn test_reset_restores_everything() {
        let mut sim = sim();
        sim.set_gold(1000);
        sim.purchase_upgrade(UpgradeKind::CharacterLevel).unwrap();
        sim.set_difficulty(Difficulty::Easy);
        sim.deploy(ArchetypeId(1)).unwrap();
        sim.toggle_pause();
        sim.reset();

        assert_eq!(sim.gold(), 50);
        assert_eq!(sim.difficulty(), Difficulty::Normal);
        assert!(!sim.is_paused());
        assert!(sim.player_units().is_empty());
        assert_eq!(sim.upgrades(), &UpgradeCounts::default());
        assert!(sim.catalog().iter().all(|(_, a)| a.level() == 1));
        assert_eq!(sim.get_tick(), 0);
    }

    #[test]
    fn test_same_seed_same_hash() {
        let run = || {
            let mut sim = Simulation::new(99);
            sim.deploy(ArchetypeId(9)).unwrap();
            for _ in 0..300 {
                sim.tick();
            }
            sim.state_hash()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_difficulty_parse() {
        assert_eq!("easy".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!(Difficulty::Normal.to_string(), "normal");
        assert!("hard".parse::<Difficulty>().is_err());
    }
}
