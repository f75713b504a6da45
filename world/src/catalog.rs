//! Type catalog: footprints, capacities and actions for every placeable type.

use std::collections::HashSet;

use dungeon_editor_core::{coords::MAX_BOARD_DIMENSION, ActorKind, FootprintSize, TileKind};
use serde::{Deserialize, Serialize};

/// Instance buffer size used when a catalog entry does not specify one.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Static description of a tile type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSpec {
    /// Catalog name of the type.
    pub name: TileKind,
    /// Cells covered along the `q` axis.
    pub q_length: u32,
    /// Cells covered along the `s` axis.
    pub s_length: u32,
    /// Number of preallocated instance slots.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl TileSpec {
    /// Creates a tile spec with the default capacity.
    #[must_use]
    pub fn new(name: &str, q_length: u32, s_length: u32) -> Self {
        Self {
            name: TileKind::new(name),
            q_length,
            s_length,
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Footprint of the type as authored.
    #[must_use]
    pub const fn footprint(&self) -> FootprintSize {
        FootprintSize::new(self.q_length, self.s_length)
    }
}

/// Static description of an actor type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSpec {
    /// Catalog name of the type.
    pub name: ActorKind,
    /// Cells covered along the `q` axis.
    #[serde(default = "unit_length")]
    pub q_length: u32,
    /// Cells covered along the `s` axis.
    #[serde(default = "unit_length")]
    pub s_length: u32,
    /// Number of preallocated instance slots.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Looping or clamped state actions the actor can be set to.
    #[serde(default)]
    pub actions: Vec<String>,
}

impl ActorSpec {
    /// Creates a single-cell actor spec with the default capacity.
    #[must_use]
    pub fn new(name: &str, actions: &[&str]) -> Self {
        Self {
            name: ActorKind::new(name),
            q_length: 1,
            s_length: 1,
            capacity: DEFAULT_CAPACITY,
            actions: actions.iter().map(|action| (*action).to_owned()).collect(),
        }
    }

    /// Footprint of the type.
    #[must_use]
    pub const fn footprint(&self) -> FootprintSize {
        FootprintSize::new(self.q_length, self.s_length)
    }
}

/// Ordered set of placeable types. Order decides export order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Tile types in catalog order.
    #[serde(default)]
    pub tiles: Vec<TileSpec>,
    /// Actor types in catalog order.
    #[serde(default)]
    pub actors: Vec<ActorSpec>,
}

/// Failures raised while loading a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The TOML document could not be parsed.
    #[error("could not parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
    /// Two entries share a name.
    #[error("catalog lists '{0}' more than once")]
    Duplicate(String),
    /// An entry covers no cells.
    #[error("catalog entry '{0}' has an empty footprint")]
    EmptyFootprint(String),
    /// An entry is longer than the largest board on some axis.
    #[error("catalog entry '{0}' has a footprint longer than {max} cells", max = MAX_BOARD_DIMENSION)]
    OversizedFootprint(String),
}

impl Catalog {
    /// Catalog shipped with the editor.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            tiles: vec![
                TileSpec::new("first", 1, 1),
                TileSpec::new("second", 1, 1),
                TileSpec::new("third", 1, 1),
                TileSpec::new("fourth", 1, 1),
                TileSpec::new("fifth", 1, 1),
                TileSpec::new("specialFloor", 1, 1),
            ],
            actors: vec![
                ActorSpec::new("dad", &[]),
                ActorSpec::new(
                    "robot",
                    &["Idle", "Dance", "Walking", "Running", "Sitting", "Standing", "Death"],
                ),
                ActorSpec::new("robotStatic", &[]),
                ActorSpec::new("goblin", &["Death", "Idle", "Run", "Walk"]),
                ActorSpec::new("bat", &["Death", "Flying"]),
                ActorSpec::new("slime", &["Idle", "Walking", "Death"]),
                ActorSpec::new("dragon", &[]),
                ActorSpec::new("skeleton", &["Death", "Idle", "Running", "Spawn"]),
            ],
        }
    }

    /// Parses and validates a catalog from TOML.
    pub fn from_toml_str(contents: &str) -> Result<Self, CatalogError> {
        let catalog: Self = toml::from_str(contents)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Checks that names are unique per section and footprints fit a board.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for tile in &self.tiles {
            check_entry(&mut seen, tile.name.as_str(), tile.footprint())?;
        }
        seen.clear();
        for actor in &self.actors {
            check_entry(&mut seen, actor.name.as_str(), actor.footprint())?;
        }
        Ok(())
    }

    /// Tile spec registered under `kind`.
    #[must_use]
    pub fn tile(&self, kind: &TileKind) -> Option<&TileSpec> {
        self.tiles.iter().find(|tile| &tile.name == kind)
    }

    /// Actor spec registered under `kind`.
    #[must_use]
    pub fn actor(&self, kind: &ActorKind) -> Option<&ActorSpec> {
        self.actors.iter().find(|actor| &actor.name == kind)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn check_entry<'a>(
    seen: &mut HashSet<&'a str>,
    name: &'a str,
    footprint: FootprintSize,
) -> Result<(), CatalogError> {
    if footprint.q_length() == 0 || footprint.s_length() == 0 {
        return Err(CatalogError::EmptyFootprint(name.to_owned()));
    }
    if footprint.q_length() > MAX_BOARD_DIMENSION || footprint.s_length() > MAX_BOARD_DIMENSION {
        return Err(CatalogError::OversizedFootprint(name.to_owned()));
    }
    if !seen.insert(name) {
        return Err(CatalogError::Duplicate(name.to_owned()));
    }
    Ok(())
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn unit_length() -> u32 {
    1
}
