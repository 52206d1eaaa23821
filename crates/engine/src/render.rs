use crate::world::{Direction, Layer, Location, World};

/// Read-only consumer of world snapshots.
pub trait LevelRenderer {
    type Output;

    fn render(&mut self, world: &World, now_ms: u64) -> Self::Output;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileView {
    pub has_floor: bool,
    pub has_ceiling: bool,
    pub has_column: bool,
    pub walls: [bool; 4],
    pub creature_facing: Option<Direction>,
    pub is_player: bool,
}

pub fn tile_view(world: &World, location: Location) -> TileView {
    let level = world.level();
    let mut walls = [false; 4];
    for direction in Direction::ALL {
        walls[direction.index()] = !level.is_passable(location, direction);
    }

    let creature = world.creature_at(location);
    let creature_facing =
        creature.and_then(|id| world.creatures().get(id).map(|creature| creature.facing));
    let is_player = match (creature, world.player()) {
        (Some(creature), Some(player)) => world.actor_for_creature(creature) == Some(player),
        _ => false,
    };

    TileView {
        has_floor: level.get(Layer::Floor, location).is_some(),
        has_ceiling: level.get(Layer::Ceiling, location).is_some(),
        has_column: level.get(Layer::Column, location).is_some(),
        walls,
        creature_facing,
        is_player,
    }
}

pub fn world_bounds(world: &World) -> Option<(Location, Location)> {
    let mut bounds = world.level().bounds();
    for (_, location) in world.creature_locations().pairs() {
        bounds = Some(match bounds {
            None => (location, location),
            Some((min, max)) => (
                Location::new(min.x.min(location.x), min.y.min(location.y)),
                Location::new(max.x.max(location.x), max.y.max(location.y)),
            ),
        });
    }
    bounds
}
