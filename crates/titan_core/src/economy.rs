//! Gold economy.
//!
//! All calculations use integer math for deterministic simulation.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Bonus gold on top of `amount` for the given number of gold upgrades.
///
/// `floor(amount × upgrades × pct / 100)`.
#[must_use]
pub fn gold_bonus(amount: u32, upgrades: u32, pct_per_upgrade: u32) -> u32 {
    let bonus = u64::from(amount) * u64::from(upgrades) * u64::from(pct_per_upgrade) / 100;
    u32::try_from(bonus).unwrap_or(u32::MAX)
}

/// The player's gold stockpile plus lifetime totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Treasury {
    gold: u32,
    earned: u64,
    spent: u64,
}

impl Treasury {
    /// Start with `gold` in the bank.
    #[must_use]
    pub const fn new(gold: u32) -> Self {
        Self {
            gold,
            earned: 0,
            spent: 0,
        }
    }

    /// Current gold.
    #[must_use]
    pub const fn gold(&self) -> u32 {
        self.gold
    }

    /// Gold credited over the whole game, bonuses included.
    #[must_use]
    pub const fn earned(&self) -> u64 {
        self.earned
    }

    /// Gold spent over the whole game.
    #[must_use]
    pub const fn spent(&self) -> u64 {
        self.spent
    }

    /// Credit `amount` plus the upgrade bonus. Returns what was credited.
    pub fn credit(&mut self, amount: u32, upgrades: u32, pct_per_upgrade: u32) -> u32 {
        let total = amount.saturating_add(gold_bonus(amount, upgrades, pct_per_upgrade));
        self.gold = self.gold.saturating_add(total);
        self.earned += u64::from(total);
        total
    }

    /// Whether `amount` can be paid.
    #[must_use]
    pub const fn can_afford(&self, amount: u32) -> bool {
        self.gold >= amount
    }

    /// Pay `amount`, or leave the stockpile untouched and fail.
    pub fn spend(&mut self, amount: u32) -> Result<()> {
        if !self.can_afford(amount) {
            return Err(GameError::InsufficientGold {
                required: amount,
                available: self.gold,
            });
        }
        self.gold -= amount;
        self.spent += u64::from(amount);
        Ok(())
    }
}
