//! JSON protocol for headless game communication.
//!
//! The headless runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controller
//! **Output (stdout):** Game state updates and responses
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0",...}`
//! 2. Controller sends commands as JSON lines
//! 3. Runner outputs state after each `tick` command (or on `query`)
//! 4. On game end, outputs `{"type":"game_over","result":"won"|"lost",...}`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0,"seed":7}
//! -> {"cmd":"deploy","archetype":"Connie"}
//! <- {"type":"deployed","unit_id":1,"archetype":"Connie","gold":22}
//! -> {"cmd":"tick","count":60}
//! <- {"type":"state","state":{"tick":60,"gold":22,...},"hash":1234}
//! -> {"cmd":"upgrade","kind":"hp_increase"}
//! <- {"type":"error","message":"Insufficient gold: need 120, have 22","cmd":"upgrade"}
//! ```

use serde::{Deserialize, Serialize};

use titan_core::archetype::{Ability, ArchetypeId, Catalog};
use titan_core::error::Result as GameResult;
use titan_core::simulation::{Difficulty, GameStatus};
use titan_core::snapshot::{GameSummary, Snapshot};
use titan_core::unit::UnitId;
use titan_core::upgrades::{UpgradeCounts, UpgradeKind};

/// Protocol version reported in the ready message.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (controller -> runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Advance simulation by N ticks (default: 1).
    Tick {
        /// Ticks to run.
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// Query current game state without advancing time.
    Query,

    /// Deploy a player unit.
    Deploy {
        /// Catalog index or archetype name.
        archetype: ArchetypeRef,
    },

    /// Buy one step of an upgrade.
    Upgrade {
        /// Which upgrade.
        kind: UpgradeKind,
    },

    /// Select the difficulty.
    Difficulty {
        /// `easy` or `normal`.
        level: Difficulty,
    },

    /// Toggle pause.
    Pause,

    /// Start a fresh game.
    Reset,

    /// Report the current state hash (for determinism verification).
    Hash,

    /// List the archetypes with their current stats.
    Catalog,

    /// Quit the session.
    Quit,
}

fn default_tick_count() -> u32 {
    1
}

/// An archetype named by catalog index or by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArchetypeRef {
    /// Catalog index.
    Id(u16),
    /// Case-insensitive name.
    Name(String),
}

impl ArchetypeRef {
    /// Resolve against a catalog.
    pub fn resolve(&self, catalog: &Catalog) -> GameResult<ArchetypeId> {
        match self {
            Self::Id(index) => {
                let id = ArchetypeId(*index);
                catalog.get(id)?;
                Ok(id)
            }
            Self::Name(name) => catalog.find_by_name(name),
        }
    }
}

// ============================================================================
// Output Responses (runner -> controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready {
        /// Protocol version.
        version: String,
        /// Current tick.
        tick: u64,
        /// Seed of the game.
        seed: u64,
    },

    /// Acknowledgment of a command.
    Ack {
        /// Command name.
        cmd: String,
    },

    /// Error processing a command.
    Error {
        /// What went wrong.
        message: String,
        /// Command name, if the line parsed.
        cmd: Option<String>,
    },

    /// Current game state.
    State {
        /// Full snapshot.
        state: Snapshot,
        /// State hash at this tick.
        hash: u64,
    },

    /// A unit was deployed.
    Deployed {
        /// New unit id.
        unit_id: UnitId,
        /// Archetype name.
        archetype: String,
        /// Gold after cost and rebate.
        gold: u32,
    },

    /// An upgrade was bought.
    Upgraded {
        /// Upgrade bought.
        kind: UpgradeKind,
        /// Counts after the purchase.
        counts: UpgradeCounts,
        /// Gold left.
        gold: u32,
        /// Player hp after the purchase.
        player_hp: u32,
        /// Player max hp after the purchase.
        player_max_hp: u32,
    },

    /// Archetype list.
    Catalog {
        /// One entry per archetype, in id order.
        archetypes: Vec<CatalogEntry>,
    },

    /// State hash for determinism verification.
    StateHash {
        /// Current tick.
        tick: u64,
        /// Hash value.
        hash: u64,
    },

    /// Game has ended.
    GameOver {
        /// Won or lost.
        result: GameStatus,
        /// End-of-game report.
        summary: GameSummary,
    },

    /// Goodbye message before shutdown.
    Bye,
}

/// One archetype as listed by the `catalog` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Catalog index.
    pub id: u16,
    /// Name.
    pub name: String,
    /// Display glyph.
    pub glyph: String,
    /// Flavor tag.
    pub ability: Ability,
    /// Current level.
    pub level: u32,
    /// Deploy cost.
    pub cost: u32,
    /// Hp of a unit deployed now.
    pub hp: u32,
    /// Attack at the current level.
    pub attack: u32,
}

impl CatalogEntry {
    /// List every archetype of a catalog.
    #[must_use]
    pub fn list(catalog: &Catalog) -> Vec<Self> {
        catalog
            .iter()
            .map(|(id, archetype)| {
                let stats = archetype.stats();
                Self {
                    id: id.0,
                    name: archetype.data.name.clone(),
                    glyph: archetype.data.glyph.clone(),
                    ability: archetype.data.ability,
                    level: archetype.level(),
                    cost: stats.cost,
                    hp: stats.hp,
                    attack: stats.attack,
                }
            })
            .collect()
    }
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    #[must_use]
    pub fn ready(tick: u64, seed: u64) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            tick,
            seed,
        }
    }

    /// Create an acknowledgment.
    #[must_use]
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    #[must_use]
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Query => "query",
            Self::Deploy { .. } => "deploy",
            Self::Upgrade { .. } => "upgrade",
            Self::Difficulty { .. } => "difficulty",
            Self::Pause => "pause",
            Self::Reset => "reset",
            Self::Hash => "hash",
            Self::Catalog => "catalog",
            Self::Quit => "quit",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use titan_core::simulation::Simulation;

    #[test]
    fn test_parse_tick_command() {
        let cmd = Command::from_json(r#"{"cmd":"tick","count":60}"#).unwrap();
        assert_eq!(cmd, Command::Tick { count: 60 });
    }

    #[test]
    fn test_default_tick_count() {
        let cmd = Command::from_json(r#"{"cmd":"tick"}"#).unwrap();
        assert_eq!(cmd, Command::Tick { count: 1 });
    }

    #[test]
    fn test_parse_deploy_by_id_and_name() {
        let by_id = Command::from_json(r#"{"cmd":"deploy","archetype":3}"#).unwrap();
        assert_eq!(
            by_id,
            Command::Deploy {
                archetype: ArchetypeRef::Id(3)
            }
        );
        let by_name = Command::from_json(r#"{"cmd":"deploy","archetype":"levi"}"#).unwrap();
        assert_eq!(
            by_name,
            Command::Deploy {
                archetype: ArchetypeRef::Name("levi".to_string())
            }
        );
    }

    #[test]
    fn test_parse_upgrade_and_difficulty() {
        let upgrade = Command::from_json(r#"{"cmd":"upgrade","kind":"gold_increase"}"#).unwrap();
        assert_eq!(
            upgrade,
            Command::Upgrade {
                kind: UpgradeKind::GoldIncrease
            }
        );
        let difficulty = Command::from_json(r#"{"cmd":"difficulty","level":"easy"}"#).unwrap();
        assert_eq!(
            difficulty,
            Command::Difficulty {
                level: Difficulty::Easy
            }
        );
    }

    #[test]
    fn test_unknown_command_rejected() {
        assert!(Command::from_json(r#"{"cmd":"spawn"}"#).is_err());
        assert!(Command::from_json("not json").is_err());
    }

    #[test]
    fn test_archetype_ref_resolution() {
        let catalog = Catalog::default();
        assert_eq!(
            ArchetypeRef::Name("MIKASA".into()).resolve(&catalog).unwrap(),
            ArchetypeId(1)
        );
        assert_eq!(ArchetypeRef::Id(9).resolve(&catalog).unwrap(), ArchetypeId(9));
        assert!(ArchetypeRef::Id(10).resolve(&catalog).is_err());
        assert!(ArchetypeRef::Name("Reiner".into()).resolve(&catalog).is_err());
    }

    #[test]
    fn test_serialize_state_response() {
        let sim = Simulation::new(1);
        let resp = Response::State {
            state: sim.snapshot(),
            hash: 12345,
        };
        let json = resp.to_json_line();
        assert!(json.ends_with('\n'));
        assert!(json.contains(r#""type":"state""#));
        assert!(json.contains(r#""gold":50"#));
        assert!(json.contains(r#""status":"in_progress""#));
    }

    #[test]
    fn test_catalog_entries() {
        let entries = CatalogEntry::list(&Catalog::default());
        assert_eq!(entries.len(), 10);
        assert_eq!(entries[9].name, "Connie");
        assert_eq!(entries[9].cost, 30);
        assert_eq!(entries[0].level, 1);
    }

    #[test]
    fn test_response_round_trip() {
        let resp = Response::error("boom", Some("deploy"));
        let parsed: Response = serde_json::from_str(resp.to_json_line().trim()).unwrap();
        assert_eq!(parsed, resp);
    }
}
