//! Read-only views of a running game for front ends.
//!
//! Renderers and the headless protocol read state through these owned
//! copies instead of borrowing the simulation.

use serde::{Deserialize, Serialize};

use crate::simulation::{Difficulty, GameStatus, Simulation};
use crate::unit::{HealthBand, Team, Unit, UnitId};
use crate::upgrades::UpgradeCounts;

/// One unit as a renderer needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitView {
    /// Unit identifier.
    pub id: UnitId,
    /// Owning side.
    pub team: Team,
    /// Archetype name.
    pub name: String,
    /// Archetype glyph.
    pub glyph: String,
    /// Center x.
    pub x: f32,
    /// Center y.
    pub y: f32,
    /// Bounding box width.
    pub width: i32,
    /// Bounding box height.
    pub height: i32,
    /// Current hit points.
    pub hp: i32,
    /// Hit points at spawn.
    pub max_hp: i32,
    /// Health bar fill in `[0, 1]`.
    pub health_fraction: f32,
    /// Health bar color band.
    pub band: HealthBand,
}

/// Full game state at one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Ticks processed.
    pub tick: u64,
    /// Current gold.
    pub gold: u32,
    /// Player hit points.
    pub player_hp: u32,
    /// Player max hit points.
    pub player_max_hp: u32,
    /// Current wave number.
    pub wave: u32,
    /// Waves in the game.
    pub total_waves: u32,
    /// Game status.
    pub status: GameStatus,
    /// Whether ticks are skipped.
    pub paused: bool,
    /// Selected difficulty.
    pub difficulty: Difficulty,
    /// Upgrade purchase counts.
    pub upgrades: UpgradeCounts,
    /// Player units, then enemies.
    pub units: Vec<UnitView>,
}

impl Snapshot {
    /// Units of one side.
    pub fn units_of(&self, team: Team) -> impl Iterator<Item = &UnitView> {
        self.units.iter().filter(move |unit| unit.team == team)
    }
}

/// End-of-game report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    /// How the game ended (or `InProgress` if asked early).
    pub status: GameStatus,
    /// Ticks processed.
    pub tick: u64,
    /// Gold on hand.
    pub gold: u32,
    /// Gold earned over the whole game.
    pub gold_earned: u64,
    /// Gold spent over the whole game.
    pub gold_spent: u64,
    /// Player hit points left.
    pub player_hp: u32,
    /// Player max hit points.
    pub player_max_hp: u32,
    /// Waves fully cleared.
    pub waves_cleared: u32,
    /// Waves in the game.
    pub total_waves: u32,
    /// Upgrade purchase counts.
    pub upgrades: UpgradeCounts,
}

impl Simulation {
    /// Copy out everything a renderer draws.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let units = self
            .player_units()
            .iter()
            .chain(self.enemy_units())
            .map(|unit| self.view_of(unit))
            .collect();

        Snapshot {
            tick: self.get_tick(),
            gold: self.gold(),
            player_hp: self.player_hp(),
            player_max_hp: self.player_max_hp(),
            wave: self.wave(),
            total_waves: self.total_waves(),
            status: self.status(),
            paused: self.is_paused(),
            difficulty: self.difficulty(),
            upgrades: *self.upgrades(),
            units,
        }
    }

    /// Summarize the game so far.
    #[must_use]
    pub fn summary(&self) -> GameSummary {
        let waves_cleared = match self.status() {
            GameStatus::Won => self.total_waves(),
            _ => self.wave().saturating_sub(1).min(self.total_waves()),
        };
        GameSummary {
            status: self.status(),
            tick: self.get_tick(),
            gold: self.gold(),
            gold_earned: self.treasury().earned(),
            gold_spent: self.treasury().spent(),
            player_hp: self.player_hp(),
            player_max_hp: self.player_max_hp(),
            waves_cleared,
            total_waves: self.total_waves(),
            upgrades: *self.upgrades(),
        }
    }

    fn view_of(&self, unit: &Unit) -> UnitView {
        let (name, glyph) = self
            .catalog()
            .get(unit.archetype)
            .map(|archetype| (archetype.data.name.clone(), archetype.data.glyph.clone()))
            .unwrap_or_else(|_| (unit.archetype.to_string(), String::from("?")));
        let combat = &self.config().combat;

        UnitView {
            id: unit.id,
            team: unit.team,
            name,
            glyph,
            x: unit.position.x.to_num(),
            y: unit.position.y.to_num(),
            width: combat.unit_width,
            height: combat.unit_height,
            hp: unit.hp,
            max_hp: unit.max_hp,
            health_fraction: unit.health_fraction(),
            band: unit.health_band(),
        }
    }
}
