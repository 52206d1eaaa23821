use std::collections::HashMap;
use std::sync::Arc;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use super::direction::{Direction, Location};

/// Walls carry no facing: their orientation is the wall layer they are stored in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Building {
    #[serde(rename = "BaseBuilding")]
    Base { model: String },
    #[serde(rename = "OrientedBuilding")]
    Oriented { model: String, facing: Direction },
    Floor {
        model: String,
        facing: Direction,
        passable: bool,
    },
    Wall { model: String, passable: bool },
}

impl Building {
    pub fn base(model: impl Into<String>) -> Self {
        Self::Base {
            model: model.into(),
        }
    }

    pub fn oriented(model: impl Into<String>, facing: Direction) -> Self {
        Self::Oriented {
            model: model.into(),
            facing,
        }
    }

    pub fn floor(model: impl Into<String>, facing: Direction, passable: bool) -> Self {
        Self::Floor {
            model: model.into(),
            facing,
            passable,
        }
    }

    pub fn wall(model: impl Into<String>) -> Self {
        Self::Wall {
            model: model.into(),
            passable: false,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Self::Base { model }
            | Self::Oriented { model, .. }
            | Self::Floor { model, .. }
            | Self::Wall { model, .. } => model,
        }
    }

    pub fn facing(&self) -> Option<Direction> {
        match self {
            Self::Oriented { facing, .. } | Self::Floor { facing, .. } => Some(*facing),
            Self::Base { .. } | Self::Wall { .. } => None,
        }
    }

    pub fn passable(&self) -> Option<bool> {
        match self {
            Self::Floor { passable, .. } | Self::Wall { passable, .. } => Some(*passable),
            Self::Base { .. } | Self::Oriented { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buildings {
    tiles: Arc<HashMap<Location, Building>>,
}

impl Buildings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, location: Location) -> Option<&Building> {
        self.tiles.get(&location)
    }

    pub fn set(&self, location: Location, building: Building) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.tiles).insert(location, building);
        next
    }

    pub fn delete(&self, location: Location) -> Self {
        if !self.tiles.contains_key(&location) {
            return self.clone();
        }
        let mut next = self.clone();
        Arc::make_mut(&mut next.tiles).remove(&location);
        next
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Location, &Building)> + '_ {
        let mut tiles: Vec<(Location, &Building)> = self
            .tiles
            .iter()
            .map(|(location, building)| (*location, building))
            .collect();
        tiles.sort_unstable_by_key(|(location, _)| *location);
        tiles.into_iter()
    }

    pub fn locations(&self) -> impl Iterator<Item = Location> + '_ {
        self.tiles.keys().copied()
    }
}

impl Serialize for Buildings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for Buildings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<(Location, Building)>::deserialize(deserializer)?;
        let mut tiles = HashMap::with_capacity(entries.len());
        for (location, building) in entries {
            if tiles.insert(location, building).is_some() {
                return Err(de::Error::custom(format!(
                    "duplicate building entry at {location}"
                )));
            }
        }
        Ok(Self {
            tiles: Arc::new(tiles),
        })
    }
}
