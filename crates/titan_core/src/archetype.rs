//! Unit archetype catalog.
//!
//! Archetypes are the templates both sides draw from: the player deploys
//! them, the enemy spawner picks them at random. Each archetype carries a
//! level that is shared by every unit referencing it, so a level-up changes
//! all later stat lookups for that archetype. Units only capture their
//! hit points at spawn time; attack is looked up live on every collision.
//!
//! All scaling uses integer math: `hp = base × (level + 4) / 5` is exactly
//! `floor(base × (1 + 0.2 × (level - 1)))`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Index of an archetype inside its [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArchetypeId(pub u16);

impl ArchetypeId {
    /// Position of this archetype in the catalog list.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ArchetypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Flavor tag carried by each archetype.
///
/// Abilities are descriptive only; no simulation rule reads them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    /// Shifts into a titan body.
    TitanForm,
    /// Blade specialist.
    Slice,
    /// Battlefield planner.
    Strategy,
    /// Ackerman bloodline.
    Ackerman,
    /// Titan researcher.
    Analysis,
    /// Colossal frame.
    Colossal,
    /// Mounted charge.
    Charge,
    /// Shield wall.
    Defense,
    /// Thunder spear.
    Spear,
    /// Fast maneuvering gear.
    Mobility,
}

impl Ability {
    /// Short tag used in logs and the headless catalog listing.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::TitanForm => "titan_form",
            Self::Slice => "slice",
            Self::Strategy => "strategy",
            Self::Ackerman => "ackerman",
            Self::Analysis => "analysis",
            Self::Colossal => "colossal",
            Self::Charge => "charge",
            Self::Defense => "defense",
            Self::Spear => "spear",
            Self::Mobility => "mobility",
        }
    }
}

/// Data-driven archetype definition.
///
/// # Example RON
///
/// ```ron
/// ArchetypeData(
///     name: "Eren",
///     cost: 30,
///     hp: 100,
///     attack: 25,
///     ability: titan_form,
///     glyph: "😤",
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchetypeData {
    /// Display name, also used to look the archetype up by name.
    pub name: String,
    /// Base gold cost before the flat discount.
    pub cost: u32,
    /// Base hit points at level 1.
    pub hp: u32,
    /// Base attack at level 1.
    pub attack: u32,
    /// Flavor tag.
    pub ability: Ability,
    /// Display glyph for renderers.
    pub glyph: String,
}

impl ArchetypeData {
    fn new(name: &str, cost: u32, hp: u32, attack: u32, ability: Ability, glyph: &str) -> Self {
        Self {
            name: name.to_string(),
            cost,
            hp,
            attack,
            ability,
            glyph: glyph.to_string(),
        }
    }
}

/// Derived stats of an archetype at a given level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Hit points a freshly spawned unit starts with.
    pub hp: u32,
    /// Damage dealt per collision.
    pub attack: u32,
    /// Gold cost to deploy.
    pub cost: u32,
}

/// Scale a base stat by `1 + 0.2 × (level - 1)`, rounding down.
#[must_use]
pub fn scale_by_level(base: u32, level: u32) -> u32 {
    let scaled = u64::from(base) * (u64::from(level.max(1)) + 4) / 5;
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// Apply the flat 20% deploy discount, rounding down.
#[must_use]
pub const fn discounted_cost(base: u32) -> u32 {
    ((base as u64) * 4 / 5) as u32
}

/// A catalog entry: static definition plus its current level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archetype {
    /// Static definition.
    pub data: ArchetypeData,
    /// Current level, starts at 1.
    level: u32,
}

impl Archetype {
    /// Wrap a definition at level 1.
    #[must_use]
    pub fn new(data: ArchetypeData) -> Self {
        Self { data, level: 1 }
    }

    /// Current level.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Stats at an arbitrary level.
    #[must_use]
    pub fn stats_at(&self, level: u32) -> Stats {
        Stats {
            hp: scale_by_level(self.data.hp, level),
            attack: scale_by_level(self.data.attack, level),
            cost: discounted_cost(self.data.cost),
        }
    }

    /// Stats at the current level.
    #[must_use]
    pub fn stats(&self) -> Stats {
        self.stats_at(self.level)
    }

    fn level_up(&mut self) {
        self.level = self.level.saturating_add(1);
    }
}

/// The ordered set of archetypes a game draws from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    archetypes: Vec<Archetype>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            archetypes: default_definitions()
                .into_iter()
                .map(Archetype::new)
                .collect(),
        }
    }
}

impl Catalog {
    /// Build a catalog from definitions, every entry at level 1.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if `definitions` is empty or
    /// larger than an [`ArchetypeId`] can address.
    pub fn from_definitions(definitions: Vec<ArchetypeData>) -> Result<Self> {
        if definitions.is_empty() {
            return Err(GameError::InvalidConfig(
                "catalog must contain at least one archetype".to_string(),
            ));
        }
        if definitions.len() > usize::from(u16::MAX) {
            return Err(GameError::InvalidConfig(format!(
                "catalog has {} archetypes, at most {} supported",
                definitions.len(),
                u16::MAX
            )));
        }
        Ok(Self {
            archetypes: definitions.into_iter().map(Archetype::new).collect(),
        })
    }

    /// Parse a RON list of [`ArchetypeData`].
    pub fn from_ron_str(ron_str: &str) -> Result<Self> {
        let definitions: Vec<ArchetypeData> =
            ron::from_str(ron_str).map_err(|e| GameError::DataParseError {
                what: "catalog".to_string(),
                message: e.to_string(),
            })?;
        Self::from_definitions(definitions)
    }

    /// Definitions in catalog order, without levels.
    #[must_use]
    pub fn definitions(&self) -> Vec<ArchetypeData> {
        self.archetypes.iter().map(|a| a.data.clone()).collect()
    }

    /// Number of archetypes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    /// Always false for a constructed catalog; kept for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    /// Look up an archetype.
    pub fn get(&self, id: ArchetypeId) -> Result<&Archetype> {
        self.archetypes
            .get(id.index())
            .ok_or(GameError::UnknownArchetype(id))
    }

    /// Find an archetype id by case-insensitive name.
    pub fn find_by_name(&self, name: &str) -> Result<ArchetypeId> {
        self.archetypes
            .iter()
            .position(|a| a.data.name.eq_ignore_ascii_case(name))
            .map(|index| ArchetypeId(index as u16))
            .ok_or_else(|| GameError::UnknownArchetypeName(name.to_string()))
    }

    /// Iterate `(id, archetype)` in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (ArchetypeId, &Archetype)> {
        self.archetypes
            .iter()
            .enumerate()
            .map(|(index, a)| (ArchetypeId(index as u16), a))
    }

    /// Raise every archetype's level by one.
    pub fn level_up_all(&mut self) {
        for archetype in &mut self.archetypes {
            archetype.level_up();
        }
    }
}

/// The ten built-in archetypes.
#[must_use]
pub fn default_definitions() -> Vec<ArchetypeData> {
    vec![
        ArchetypeData::new("Eren", 30, 100, 25, Ability::TitanForm, "😤"),
        ArchetypeData::new("Mikasa", 40, 80, 35, Ability::Slice, "⚔️"),
        ArchetypeData::new("Armin", 35, 60, 30, Ability::Strategy, "🧠"),
        ArchetypeData::new("Levi", 60, 95, 50, Ability::Ackerman, "🗡️"),
        ArchetypeData::new("Hange", 45, 70, 28, Ability::Analysis, "🔬"),
        ArchetypeData::new("Jorbeck", 50, 110, 40, Ability::Colossal, "👹"),
        ArchetypeData::new("Sasha", 35, 75, 32, Ability::Charge, "🏇"),
        ArchetypeData::new("Jangrono", 55, 100, 38, Ability::Defense, "🛡️"),
        ArchetypeData::new("Aladdin", 40, 85, 33, Ability::Spear, "🔱"),
        ArchetypeData::new("Connie", 38, 80, 30, Ability::Mobility, "🚀"),
    ]
}
