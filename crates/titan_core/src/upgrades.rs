//! Persistent upgrades bought with gold.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::UpgradePrices;

/// The four purchasable upgrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeKind {
    /// Every archetype gains a level.
    CharacterLevel,
    /// Gold income gains a bonus step.
    GoldIncrease,
    /// Current and max player hp rise.
    HpIncrease,
    /// Counted only; no damage formula reads it.
    AttackIncrease,
}

impl UpgradeKind {
    /// All upgrades in shop order.
    pub const ALL: [Self; 4] = [
        Self::CharacterLevel,
        Self::GoldIncrease,
        Self::HpIncrease,
        Self::AttackIncrease,
    ];

    /// Protocol key.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::CharacterLevel => "character_level",
            Self::GoldIncrease => "gold_increase",
            Self::HpIncrease => "hp_increase",
            Self::AttackIncrease => "attack_increase",
        }
    }

    /// Price from the configured table.
    #[must_use]
    pub const fn price(&self, prices: &UpgradePrices) -> u32 {
        match self {
            Self::CharacterLevel => prices.character_level,
            Self::GoldIncrease => prices.gold_increase,
            Self::HpIncrease => prices.hp_increase,
            Self::AttackIncrease => prices.attack_increase,
        }
    }
}

impl fmt::Display for UpgradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for UpgradeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.key() == s)
            .ok_or_else(|| format!("unknown upgrade '{s}'"))
    }
}

/// How many times each upgrade has been bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UpgradeCounts {
    /// Character-level purchases.
    pub character_level: u32,
    /// Gold-increase purchases.
    pub gold_increase: u32,
    /// Hp-increase purchases.
    pub hp_increase: u32,
    /// Attack-increase purchases.
    pub attack_increase: u32,
}

impl UpgradeCounts {
    /// Count for one upgrade.
    #[must_use]
    pub const fn get(&self, kind: UpgradeKind) -> u32 {
        match kind {
            UpgradeKind::CharacterLevel => self.character_level,
            UpgradeKind::GoldIncrease => self.gold_increase,
            UpgradeKind::HpIncrease => self.hp_increase,
            UpgradeKind::AttackIncrease => self.attack_increase,
        }
    }

    /// Record one purchase.
    pub fn increment(&mut self, kind: UpgradeKind) {
        let slot = match kind {
            UpgradeKind::CharacterLevel => &mut self.character_level,
            UpgradeKind::GoldIncrease => &mut self.gold_increase,
            UpgradeKind::HpIncrease => &mut self.hp_increase,
            UpgradeKind::AttackIncrease => &mut self.attack_increase,
        };
        *slot = slot.saturating_add(1);
    }

    /// Sum of all purchases.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.character_level
            .saturating_add(self.gold_increase)
            .saturating_add(self.hp_increase)
            .saturating_add(self.attack_increase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prices() {
        let prices = UpgradePrices::default();
        assert_eq!(UpgradeKind::CharacterLevel.price(&prices), 100);
        assert_eq!(UpgradeKind::GoldIncrease.price(&prices), 80);
        assert_eq!(UpgradeKind::HpIncrease.price(&prices), 120);
        assert_eq!(UpgradeKind::AttackIncrease.price(&prices), 100);
    }

    #[test]
    fn test_increment_is_independent() {
        let mut counts = UpgradeCounts::default();
        counts.increment(UpgradeKind::GoldIncrease);
        counts.increment(UpgradeKind::GoldIncrease);
        counts.increment(UpgradeKind::AttackIncrease);
        assert_eq!(counts.get(UpgradeKind::GoldIncrease), 2);
        assert_eq!(counts.get(UpgradeKind::AttackIncrease), 1);
        assert_eq!(counts.get(UpgradeKind::CharacterLevel), 0);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_parse_keys() {
        for kind in UpgradeKind::ALL {
            assert_eq!(kind.key().parse::<UpgradeKind>().unwrap(), kind);
        }
        assert!("armor".parse::<UpgradeKind>().is_err());
    }
}
