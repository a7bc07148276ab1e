//! Player commands.
//!
//! Every way the player can change a game, as data. Front ends translate
//! input into a [`PlayerCommand`]; replays store the same values.

use serde::{Deserialize, Serialize};

use crate::archetype::ArchetypeId;
use crate::error::Result;
use crate::simulation::{Difficulty, Simulation};
use crate::unit::UnitId;
use crate::upgrades::{UpgradeCounts, UpgradeKind};

/// A player action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerCommand {
    /// Deploy a unit of the given archetype.
    Deploy(ArchetypeId),
    /// Buy one step of an upgrade.
    PurchaseUpgrade(UpgradeKind),
    /// Select the difficulty.
    SetDifficulty(Difficulty),
    /// Flip the pause flag.
    TogglePause,
    /// Start over from wave 1.
    Reset,
}

/// What an applied command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// A unit entered the field.
    Deployed(UnitId),
    /// Upgrade counts after the purchase.
    Upgraded(UpgradeCounts),
    /// Difficulty changed.
    DifficultySet(Difficulty),
    /// New pause state.
    PauseToggled(bool),
    /// Game restarted.
    Reset,
}

impl Simulation {
    /// Apply a player command.
    ///
    /// Failed commands leave the simulation untouched.
    pub fn apply(&mut self, command: PlayerCommand) -> Result<CommandOutcome> {
        match command {
            PlayerCommand::Deploy(archetype) => self.deploy(archetype).map(CommandOutcome::Deployed),
            PlayerCommand::PurchaseUpgrade(kind) => {
                self.purchase_upgrade(kind).map(CommandOutcome::Upgraded)
            }
            PlayerCommand::SetDifficulty(difficulty) => {
                self.set_difficulty(difficulty);
                Ok(CommandOutcome::DifficultySet(difficulty))
            }
            PlayerCommand::TogglePause => Ok(CommandOutcome::PauseToggled(self.toggle_pause())),
            PlayerCommand::Reset => {
                self.reset();
                Ok(CommandOutcome::Reset)
            }
        }
    }
}
