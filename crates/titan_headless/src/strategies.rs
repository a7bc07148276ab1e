//! Scripted autopilot strategies for headless playtesting.
//!
//! A strategy decides, every tick, which player commands to issue: an
//! opening script first, then upgrades and deploys by rule. Enemy waves
//! are driven by the simulation itself; strategies only play the player
//! side.

use std::collections::VecDeque;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use titan_core::archetype::ArchetypeId;
use titan_core::command::PlayerCommand;
use titan_core::simulation::{Difficulty, Simulation};
use titan_core::upgrades::UpgradeKind;

/// Error type for strategy operations.
#[derive(Error, Debug)]
pub enum StrategyError {
    /// File not found.
    #[error("Strategy file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read strategy file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse strategy: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// No built-in strategy with that name.
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),
}

/// How the autopilot picks which archetype to deploy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeployPreference {
    /// Lowest cost, lowest id on ties.
    Cheapest,
    /// Highest attack, then highest hp.
    Strongest,
    /// Uniform pick among affordable archetypes.
    Random,
    /// Cycle through the named archetypes in order.
    Rotation(Vec<String>),
}

/// One step of a strategy's opening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpeningItem {
    /// Deploy the named archetype as soon as it is affordable.
    Deploy(String),
    /// Buy an upgrade as soon as it is affordable.
    Upgrade(UpgradeKind),
    /// Wait until gold reaches this amount.
    WaitForGold(u32),
    /// Wait until this tick.
    WaitForTick(u64),
}

/// A complete autopilot configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    /// Strategy name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Difficulty selected before the first tick.
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Scripted opening, run before any rule.
    #[serde(default)]
    pub opening: Vec<OpeningItem>,
    /// Archetype choice for rule-based deploys.
    pub deploy_preference: DeployPreference,
    /// Minimum ticks between rule-based deploys.
    pub deploy_interval: u64,
    /// Gold a rule-based deploy must leave behind.
    pub gold_reserve: u32,
    /// Upgrades bought in this order, cycling.
    #[serde(default)]
    pub upgrade_priority: Vec<UpgradeKind>,
    /// Only shop for upgrades at or above this much gold.
    pub upgrade_threshold: u32,
    /// Stop deploying while this many player units are on the field.
    pub max_units_on_field: usize,
}

impl Default for Strategy {
    fn default() -> Self {
        Self::balanced()
    }
}

impl Strategy {
    /// Names accepted by [`Strategy::by_name`].
    pub const BUILT_IN: [&'static str; 5] = ["balanced", "swarm", "elite", "economist", "chaos"];

    /// Load a strategy from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StrategyError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StrategyError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, StrategyError> {
        Ok(ron::from_str(ron)?)
    }

    /// A built-in strategy by name.
    pub fn by_name(name: &str) -> Result<Self, StrategyError> {
        match name {
            "balanced" => Ok(Self::balanced()),
            "swarm" => Ok(Self::swarm()),
            "elite" => Ok(Self::elite()),
            "economist" | "eco" => Ok(Self::economist()),
            "chaos" => Ok(Self::chaos()),
            other => Err(StrategyError::UnknownStrategy(other.to_string())),
        }
    }

    /// A built-in name, or else a RON file path.
    pub fn resolve(name_or_path: &str) -> Result<Self, StrategyError> {
        match Self::by_name(name_or_path) {
            Err(StrategyError::UnknownStrategy(_)) if name_or_path.ends_with(".ron") => {
                Self::load(name_or_path)
            }
            other => other,
        }
    }

    /// Steady cheap deploys with a level upgrade when rich.
    #[must_use]
    pub fn balanced() -> Self {
        Self {
            name: "Balanced".to_string(),
            description: "Cheap units on a steady cadence, levels when rich".to_string(),
            difficulty: Difficulty::Normal,
            opening: vec![OpeningItem::Deploy("Eren".to_string())],
            deploy_preference: DeployPreference::Cheapest,
            deploy_interval: 90,
            gold_reserve: 0,
            upgrade_priority: vec![UpgradeKind::CharacterLevel, UpgradeKind::HpIncrease],
            upgrade_threshold: 150,
            max_units_on_field: 6,
        }
    }

    /// Deploy the cheapest unit whenever possible.
    #[must_use]
    pub fn swarm() -> Self {
        Self {
            name: "Swarm".to_string(),
            description: "Flood the lane with the cheapest unit".to_string(),
            difficulty: Difficulty::Normal,
            opening: Vec::new(),
            deploy_preference: DeployPreference::Cheapest,
            deploy_interval: 20,
            gold_reserve: 0,
            upgrade_priority: Vec::new(),
            upgrade_threshold: u32::MAX,
            max_units_on_field: 12,
        }
    }

    /// Save up for the strongest unit affordable.
    #[must_use]
    pub fn elite() -> Self {
        Self {
            name: "Elite".to_string(),
            description: "Few strong units, levels first".to_string(),
            difficulty: Difficulty::Normal,
            opening: vec![
                OpeningItem::WaitForGold(48),
                OpeningItem::Deploy("Levi".to_string()),
            ],
            deploy_preference: DeployPreference::Strongest,
            deploy_interval: 150,
            gold_reserve: 0,
            upgrade_priority: vec![UpgradeKind::CharacterLevel],
            upgrade_threshold: 120,
            max_units_on_field: 4,
        }
    }

    /// Buy gold bonuses early, then spend.
    #[must_use]
    pub fn economist() -> Self {
        Self {
            name: "Economist".to_string(),
            description: "Gold upgrades first, deploys with a reserve".to_string(),
            difficulty: Difficulty::Normal,
            opening: vec![
                OpeningItem::Deploy("Connie".to_string()),
                OpeningItem::WaitForGold(80),
                OpeningItem::Upgrade(UpgradeKind::GoldIncrease),
            ],
            deploy_preference: DeployPreference::Rotation(vec![
                "Connie".to_string(),
                "Eren".to_string(),
                "Sasha".to_string(),
            ]),
            deploy_interval: 120,
            gold_reserve: 20,
            upgrade_priority: vec![
                UpgradeKind::GoldIncrease,
                UpgradeKind::CharacterLevel,
                UpgradeKind::HpIncrease,
            ],
            upgrade_threshold: 100,
            max_units_on_field: 5,
        }
    }

    /// Random deploys on easy, as a smoke test.
    #[must_use]
    pub fn chaos() -> Self {
        Self {
            name: "Chaos".to_string(),
            description: "Random affordable unit every few seconds on easy".to_string(),
            difficulty: Difficulty::Easy,
            opening: Vec::new(),
            deploy_preference: DeployPreference::Random,
            deploy_interval: 60,
            gold_reserve: 0,
            upgrade_priority: UpgradeKind::ALL.to_vec(),
            upgrade_threshold: 200,
            max_units_on_field: 8,
        }
    }
}

/// Runtime state for executing a strategy.
#[derive(Debug, Clone)]
pub struct StrategyExecutor {
    strategy: Strategy,
    opening: VecDeque<OpeningItem>,
    rng: ChaCha8Rng,
    difficulty_set: bool,
    last_deploy_tick: Option<u64>,
    rotation_index: usize,
    upgrade_index: usize,
}

impl StrategyExecutor {
    /// Create an executor; `seed` drives [`DeployPreference::Random`].
    #[must_use]
    pub fn new(strategy: Strategy, seed: u64) -> Self {
        let opening = strategy.opening.iter().cloned().collect();
        Self {
            strategy,
            opening,
            rng: ChaCha8Rng::seed_from_u64(seed),
            difficulty_set: false,
            last_deploy_tick: None,
            rotation_index: 0,
            upgrade_index: 0,
        }
    }

    /// The strategy being executed.
    #[must_use]
    pub const fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Whether the opening script has finished.
    #[must_use]
    pub fn opening_done(&self) -> bool {
        self.opening.is_empty()
    }

    /// Commands to issue before the next tick.
    ///
    /// Only commands the simulation can currently afford are returned.
    pub fn next_commands(&mut self, sim: &Simulation) -> Vec<PlayerCommand> {
        let mut commands = Vec::new();
        if !self.difficulty_set {
            self.difficulty_set = true;
            if sim.difficulty() != self.strategy.difficulty {
                commands.push(PlayerCommand::SetDifficulty(self.strategy.difficulty));
            }
        }

        if !self.opening.is_empty() {
            if let Some(command) = self.next_opening_command(sim) {
                commands.push(command);
            }
            return commands;
        }

        if let Some(command) = self.next_upgrade(sim) {
            commands.push(command);
        } else if let Some(command) = self.next_deploy(sim) {
            commands.push(command);
        }
        commands
    }

    fn next_opening_command(&mut self, sim: &Simulation) -> Option<PlayerCommand> {
        loop {
            let item = self.opening.front()?;
            match item {
                OpeningItem::WaitForGold(amount) => {
                    if sim.gold() < *amount {
                        return None;
                    }
                    self.opening.pop_front();
                }
                OpeningItem::WaitForTick(tick) => {
                    if sim.get_tick() < *tick {
                        return None;
                    }
                    self.opening.pop_front();
                }
                OpeningItem::Deploy(name) => {
                    let Ok(id) = sim.catalog().find_by_name(name) else {
                        tracing::warn!(archetype = %name, "Opening names an unknown archetype, skipping");
                        self.opening.pop_front();
                        continue;
                    };
                    if !affordable(sim, id, 0) {
                        return None;
                    }
                    self.opening.pop_front();
                    self.last_deploy_tick = Some(sim.get_tick());
                    return Some(PlayerCommand::Deploy(id));
                }
                OpeningItem::Upgrade(kind) => {
                    if sim.gold() < kind.price(&sim.config().upgrades) {
                        return None;
                    }
                    let kind = *kind;
                    self.opening.pop_front();
                    return Some(PlayerCommand::PurchaseUpgrade(kind));
                }
            }
        }
    }

    fn next_upgrade(&mut self, sim: &Simulation) -> Option<PlayerCommand> {
        let priority = &self.strategy.upgrade_priority;
        if priority.is_empty() || sim.gold() < self.strategy.upgrade_threshold {
            return None;
        }
        let kind = priority[self.upgrade_index % priority.len()];
        if sim.gold() < kind.price(&sim.config().upgrades) {
            return None;
        }
        self.upgrade_index += 1;
        Some(PlayerCommand::PurchaseUpgrade(kind))
    }

    fn next_deploy(&mut self, sim: &Simulation) -> Option<PlayerCommand> {
        let tick = sim.get_tick();
        if let Some(last) = self.last_deploy_tick {
            if tick.saturating_sub(last) < self.strategy.deploy_interval {
                return None;
            }
        }
        if sim.player_units().len() >= self.strategy.max_units_on_field {
            return None;
        }

        let reserve = self.strategy.gold_reserve;
        let candidates: Vec<ArchetypeId> = sim
            .catalog()
            .iter()
            .map(|(id, _)| id)
            .filter(|id| affordable(sim, *id, reserve))
            .collect();

        let choice = match &self.strategy.deploy_preference {
            DeployPreference::Cheapest => candidates.into_iter().min_by_key(|id| cost_of(sim, *id)),
            DeployPreference::Strongest => candidates.into_iter().max_by_key(|id| {
                sim.catalog()
                    .get(*id)
                    .map(|a| {
                        let stats = a.stats();
                        (stats.attack, stats.hp)
                    })
                    .unwrap_or_default()
            }),
            DeployPreference::Random => candidates.choose(&mut self.rng).copied(),
            DeployPreference::Rotation(names) => {
                if names.is_empty() {
                    return None;
                }
                let name = &names[self.rotation_index % names.len()];
                let id = sim.catalog().find_by_name(name).ok()?;
                if !candidates.contains(&id) {
                    return None;
                }
                self.rotation_index += 1;
                Some(id)
            }
        }?;

        self.last_deploy_tick = Some(tick);
        Some(PlayerCommand::Deploy(choice))
    }
}

fn cost_of(sim: &Simulation, id: ArchetypeId) -> u32 {
    sim.catalog()
        .get(id)
        .map_or(u32::MAX, |archetype| archetype.stats().cost)
}

fn affordable(sim: &Simulation, id: ArchetypeId, reserve: u32) -> bool {
    sim.gold() >= cost_of(sim, id).saturating_add(reserve)
}
