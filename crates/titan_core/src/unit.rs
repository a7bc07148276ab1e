//! Live units on the field.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::archetype::{ArchetypeId, Catalog};
use crate::error::Result;
use crate::math::{Fixed, Vec2Fixed};

/// Unique identifier for a unit within one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.0)
    }
}

/// Which side a unit fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    /// Deployed by the player, walks right.
    Player,
    /// Spawned by the wave timer, walks left.
    Enemy,
}

impl Team {
    /// Sign of this team's horizontal velocity.
    #[must_use]
    pub const fn direction(self) -> i32 {
        match self {
            Self::Player => 1,
            Self::Enemy => -1,
        }
    }
}

/// Health bar band used by renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthBand {
    /// Above half health.
    Healthy,
    /// Above a quarter.
    Wounded,
    /// A quarter or less.
    Critical,
}

/// A unit on the field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Identifier, unique for the lifetime of a game.
    pub id: UnitId,
    /// Archetype this unit was spawned from.
    pub archetype: ArchetypeId,
    /// Owning side.
    pub team: Team,
    /// Center position.
    pub position: Vec2Fixed,
    /// Horizontal velocity per tick.
    #[serde(with = "crate::math::fixed_serde")]
    pub velocity: Fixed,
    /// Current hit points; may dip to or below zero until the unit is removed.
    pub hp: i32,
    /// Hit points at spawn.
    pub max_hp: i32,
    /// Percent applied to the archetype's live attack.
    pub attack_scale_pct: u32,
}

impl Unit {
    /// Create a unit at full health.
    #[must_use]
    pub fn new(
        id: UnitId,
        archetype: ArchetypeId,
        team: Team,
        position: Vec2Fixed,
        speed: i32,
        hp: i32,
    ) -> Self {
        Self {
            id,
            archetype,
            team,
            position,
            velocity: Fixed::from_num(speed * team.direction()),
            hp,
            max_hp: hp,
            attack_scale_pct: 100,
        }
    }

    /// Scale hit points and attack by `pct` percent.
    ///
    /// Hit points are whole numbers, so the scaled values round down
    /// (96 at 80% becomes 76, not 76.8) but never below 1 for a living unit.
    /// Attack is scaled the same way each time the live attack is looked up.
    #[must_use]
    pub fn scaled(mut self, pct: u32) -> Self {
        self.hp = scale_pct(self.hp, pct).max(self.hp.min(1));
        self.max_hp = scale_pct(self.max_hp, pct).max(self.max_hp.min(1));
        self.attack_scale_pct = pct;
        self
    }

    /// Move one tick along the velocity. No bounds checking.
    pub fn advance(&mut self) {
        self.position.x += self.velocity;
    }

    /// Subtract `amount` hit points; returns whether the unit is now dead.
    pub fn apply_damage(&mut self, amount: u32) -> bool {
        self.hp = self
            .hp
            .saturating_sub(i32::try_from(amount).unwrap_or(i32::MAX));
        self.is_dead()
    }

    /// Dead at zero, not only below.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.hp <= 0
    }

    /// Damage this unit deals right now, from its archetype's current level.
    pub fn attack(&self, catalog: &Catalog) -> Result<u32> {
        let base = catalog.get(self.archetype)?.stats().attack;
        Ok((u64::from(base) * u64::from(self.attack_scale_pct) / 100) as u32)
    }

    /// Remaining health in `[0, 1]`.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_hp <= 0 {
            return 0.0;
        }
        (self.hp.max(0) as f32 / self.max_hp as f32).min(1.0)
    }

    /// Band of the health bar.
    #[must_use]
    pub fn health_band(&self) -> HealthBand {
        // 4 × hp against 2 × max and 1 × max avoids float comparisons
        let hp = i64::from(self.hp) * 4;
        let max = i64::from(self.max_hp);
        if hp > max * 2 {
            HealthBand::Healthy
        } else if hp > max {
            HealthBand::Wounded
        } else {
            HealthBand::Critical
        }
    }
}

fn scale_pct(value: i32, pct: u32) -> i32 {
    (i64::from(value) * i64::from(pct) / 100) as i32
}
