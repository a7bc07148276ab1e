//! Game configuration.
//!
//! Every tunable number of a match lives here. [`GameConfig::default`]
//! reproduces the stock game; RON overrides let balance runs vary the
//! playfield, economy or wave table without touching code.

use serde::{Deserialize, Serialize};

use crate::archetype::{ArchetypeData, Catalog};
use crate::error::{GameError, Result};
use crate::wave::{default_waves, WaveDefinition};

/// Largest playfield width, height or lane extent accepted by
/// [`GameConfig::validate`].
pub const MAX_EXTENT: i32 = 1_000_000;

/// Largest collision radius accepted by [`GameConfig::validate`]; keeps the
/// squared radius inside the fixed-point range.
pub const MAX_COLLISION_RADIUS: i32 = 30_000;

/// Playfield dimensions in world units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playfield {
    /// Horizontal extent; player units leave at `x >= width`.
    pub width: i32,
    /// Vertical extent (informational for renderers).
    pub height: i32,
}

impl Default for Playfield {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 400,
        }
    }
}

/// Movement, spawning and collision constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatRules {
    /// Units collide when strictly closer than this.
    pub collision_radius: i32,
    /// Horizontal speed per tick (player +, enemy -).
    pub unit_speed: i32,
    /// Distance from the edge at which units enter the field.
    pub edge_inset: i32,
    /// Lowest spawn y.
    pub lane_min_y: i32,
    /// Spawn band height; y is drawn from `[lane_min_y, lane_min_y + lane_span)`.
    pub lane_span: i32,
    /// Unit bounding box width.
    pub unit_width: i32,
    /// Unit bounding box height.
    pub unit_height: i32,
    /// Percent of a surviving enemy's attack that bleeds through to player hp.
    pub chip_damage_pct: u32,
    /// Player hp lost when an enemy crosses the left edge.
    pub breach_damage: u32,
    /// Base ticks between enemy spawns.
    pub base_spawn_interval: u32,
    /// Ticks removed from the interval per 1.0 of wave difficulty.
    pub spawn_interval_step: u32,
    /// Enemy hp and attack scale on easy, in percent.
    pub easy_enemy_scale_pct: u32,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            collision_radius: 50,
            unit_speed: 3,
            edge_inset: 50,
            lane_min_y: 100,
            lane_span: 200,
            unit_width: 40,
            unit_height: 50,
            chip_damage_pct: 10,
            breach_damage: 10,
            base_spawn_interval: 60,
            spawn_interval_step: 5,
            easy_enemy_scale_pct: 80,
        }
    }
}

/// Gold income rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomyRules {
    /// Gold for killing an enemy.
    pub kill_reward: u32,
    /// Gold returned after every deploy.
    pub deploy_rebate: u32,
    /// Gold granted by a passive drift roll.
    pub drift_amount: u32,
    /// Drift chance numerator.
    pub drift_numerator: u32,
    /// Drift chance denominator.
    pub drift_denominator: u32,
    /// Bonus percent per gold-increase upgrade.
    pub bonus_pct_per_upgrade: u32,
}

impl Default for EconomyRules {
    fn default() -> Self {
        Self {
            kill_reward: 10,
            deploy_rebate: 2,
            drift_amount: 1,
            drift_numerator: 1,
            drift_denominator: 50,
            bonus_pct_per_upgrade: 10,
        }
    }
}

/// Upgrade prices and effect sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradePrices {
    /// Price of raising every archetype's level.
    pub character_level: u32,
    /// Price of one gold-increase step.
    pub gold_increase: u32,
    /// Price of one hp-increase step.
    pub hp_increase: u32,
    /// Price of one attack-increase step.
    pub attack_increase: u32,
    /// Current and max hp granted per hp-increase.
    pub hp_per_upgrade: u32,
}

impl Default for UpgradePrices {
    fn default() -> Self {
        Self {
            character_level: 100,
            gold_increase: 80,
            hp_increase: 120,
            attack_increase: 100,
            hp_per_upgrade: 20,
        }
    }
}

/// Complete configuration of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Gold at the start of a game.
    pub starting_gold: u32,
    /// Player hp (and max hp) at the start of a game.
    pub starting_hp: u32,
    /// Field dimensions.
    #[serde(default)]
    pub playfield: Playfield,
    /// Combat constants.
    #[serde(default)]
    pub combat: CombatRules,
    /// Economy constants.
    #[serde(default)]
    pub economy: EconomyRules,
    /// Upgrade prices.
    #[serde(default)]
    pub upgrades: UpgradePrices,
    /// Wave table, first wave first.
    #[serde(default = "default_waves")]
    pub waves: Vec<WaveDefinition>,
    /// Archetype definitions; `None` uses the built-in ten.
    #[serde(default)]
    pub archetypes: Option<Vec<ArchetypeData>>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_gold: 50,
            starting_hp: 100,
            playfield: Playfield::default(),
            combat: CombatRules::default(),
            economy: EconomyRules::default(),
            upgrades: UpgradePrices::default(),
            waves: default_waves(),
            archetypes: None,
        }
    }
}

impl GameConfig {
    /// Parse and validate a RON configuration.
    pub fn from_ron_str(ron_str: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron_str).map_err(|e| GameError::DataParseError {
            what: "game config".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::InvalidConfig(e.to_string()))
    }

    /// Number of waves in the table.
    #[must_use]
    pub fn total_waves(&self) -> u32 {
        self.waves.len() as u32
    }

    /// Build the archetype catalog this config describes.
    pub fn catalog(&self) -> Result<Catalog> {
        match &self.archetypes {
            Some(definitions) => Catalog::from_definitions(definitions.clone()),
            None => Ok(Catalog::default()),
        }
    }

    /// Reject configurations that cannot run a game.
    pub fn validate(&self) -> Result<()> {
        if self.waves.is_empty() {
            return Err(GameError::InvalidConfig(
                "wave table must not be empty".to_string(),
            ));
        }
        if self.playfield.width > MAX_EXTENT || self.playfield.height > MAX_EXTENT {
            return Err(GameError::InvalidConfig(format!(
                "playfield {}x{} exceeds the {MAX_EXTENT} unit limit",
                self.playfield.width, self.playfield.height
            )));
        }
        if self.combat.edge_inset < 0
            || self.playfield.width <= self.combat.edge_inset.saturating_mul(2)
        {
            return Err(GameError::InvalidConfig(format!(
                "playfield width {} leaves no room between edge insets of {}",
                self.playfield.width, self.combat.edge_inset
            )));
        }
        if self.combat.lane_span <= 0 {
            return Err(GameError::InvalidConfig(
                "lane_span must be positive".to_string(),
            ));
        }
        let lane_top = self.combat.lane_min_y.checked_add(self.combat.lane_span);
        if self.combat.lane_min_y.saturating_abs() > MAX_EXTENT
            || lane_top.map_or(true, |top| top > MAX_EXTENT)
        {
            return Err(GameError::InvalidConfig(format!(
                "lane {}..+{} exceeds the {MAX_EXTENT} unit limit",
                self.combat.lane_min_y, self.combat.lane_span
            )));
        }
        if !(1..=MAX_COLLISION_RADIUS).contains(&self.combat.collision_radius) {
            return Err(GameError::InvalidConfig(format!(
                "collision_radius {} must be in 1..={MAX_COLLISION_RADIUS}",
                self.combat.collision_radius
            )));
        }
        if self.economy.drift_denominator == 0
            || self.economy.drift_numerator > self.economy.drift_denominator
        {
            return Err(GameError::InvalidConfig(format!(
                "drift chance {}/{} is not a probability",
                self.economy.drift_numerator, self.economy.drift_denominator
            )));
        }
        self.catalog()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.total_waves(), 10);
        assert_eq!(config.starting_gold, 50);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = GameConfig::from_ron_str(
            "(starting_gold: 500, starting_hp: 40, waves: [(enemies: 1, difficulty_pct: 100)])",
        )
        .unwrap();
        assert_eq!(config.starting_gold, 500);
        assert_eq!(config.total_waves(), 1);
        assert_eq!(config.combat, CombatRules::default());
        assert_eq!(config.catalog().unwrap().len(), 10);
    }

    #[test]
    fn test_ron_round_trip() {
        let config = GameConfig::default();
        let text = config.to_ron_string().unwrap();
        assert_eq!(GameConfig::from_ron_str(&text).unwrap(), config);
    }

    #[test]
    fn test_empty_waves_rejected() {
        let err = GameConfig::from_ron_str("(starting_gold: 1, starting_hp: 1, waves: [])")
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(_)));
    }

    #[test]
    fn test_oversized_geometry_rejected() {
        let mut config = GameConfig::default();
        config.playfield.width = MAX_EXTENT + 1;
        assert!(matches!(config.validate(), Err(GameError::InvalidConfig(_))));

        let mut config = GameConfig::default();
        config.combat.lane_span = i32::MAX;
        assert!(matches!(config.validate(), Err(GameError::InvalidConfig(_))));

        let mut config = GameConfig::default();
        config.combat.collision_radius = MAX_COLLISION_RADIUS + 1;
        assert!(matches!(config.validate(), Err(GameError::InvalidConfig(_))));

        let mut config = GameConfig::default();
        config.playfield.width = MAX_EXTENT;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_drift_rejected() {
        let mut config = GameConfig::default();
        config.economy.drift_denominator = 0;
        assert!(config.validate().is_err());
    }
}
