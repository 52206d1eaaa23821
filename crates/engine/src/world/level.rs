use serde::{Deserialize, Serialize};

use super::buildings::{Building, Buildings};
use super::direction::{Direction, Location};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Floor,
    Ceiling,
    Column,
    Wall(Direction),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    floors: Buildings,
    ceilings: Buildings,
    columns: Buildings,
    walls: [Buildings; 4],
    born_at_ms: u64,
}

impl Level {
    pub fn new(born_at_ms: u64) -> Self {
        Self {
            born_at_ms,
            ..Self::default()
        }
    }

    pub fn layer(&self, layer: Layer) -> &Buildings {
        match layer {
            Layer::Floor => &self.floors,
            Layer::Ceiling => &self.ceilings,
            Layer::Column => &self.columns,
            Layer::Wall(direction) => &self.walls[direction.index()],
        }
    }

    pub fn get(&self, layer: Layer, location: Location) -> Option<&Building> {
        self.layer(layer).get(location)
    }

    pub fn set(&self, layer: Layer, location: Location, building: Building) -> Self {
        let next_layer = self.layer(layer).set(location, building);
        self.with_layer(layer, next_layer)
    }

    pub fn delete(&self, layer: Layer, location: Location) -> Self {
        let next_layer = self.layer(layer).delete(location);
        self.with_layer(layer, next_layer)
    }

    pub fn with_layer(&self, layer: Layer, buildings: Buildings) -> Self {
        let mut next = self.clone();
        match layer {
            Layer::Floor => next.floors = buildings,
            Layer::Ceiling => next.ceilings = buildings,
            Layer::Column => next.columns = buildings,
            Layer::Wall(direction) => next.walls[direction.index()] = buildings,
        }
        next
    }

    /// Whether a creature standing on `location` may leave it towards `direction`.
    /// Only a closed `Wall` on that side of the tile blocks; other buildings
    /// stored on a wall layer are decoration.
    pub fn is_passable(&self, location: Location, direction: Direction) -> bool {
        match self.get(Layer::Wall(direction), location) {
            Some(Building::Wall { passable, .. }) => *passable,
            Some(Building::Base { .. } | Building::Oriented { .. } | Building::Floor { .. })
            | None => true,
        }
    }

    pub fn with_wall_between(
        &self,
        location: Location,
        direction: Direction,
        wall: Building,
    ) -> Self {
        self.set(Layer::Wall(direction), location, wall.clone()).set(
            Layer::Wall(direction.opposite()),
            location.step(direction),
            wall,
        )
    }

    pub fn born_at_ms(&self) -> u64 {
        self.born_at_ms
    }

    pub fn age_seconds(&self, now_ms: u64) -> f32 {
        now_ms.saturating_sub(self.born_at_ms) as f32 / 1000.0
    }

    pub fn bounds(&self) -> Option<(Location, Location)> {
        let mut all = self
            .floors
            .locations()
            .chain(self.ceilings.locations())
            .chain(self.columns.locations())
            .chain(self.walls.iter().flat_map(|walls| walls.locations()));
        let first = all.next()?;
        Some(all.fold((first, first), |(min, max), location| {
            (
                Location::new(min.x.min(location.x), min.y.min(location.y)),
                Location::new(max.x.max(location.x), max.y.max(location.y)),
            )
        }))
    }
}
