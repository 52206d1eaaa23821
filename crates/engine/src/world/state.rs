use serde::{Deserialize, Serialize};

use super::direction::{Direction, Location, Position};
use super::ids::{ActorId, CreatureId};
use super::level::Level;
use super::registry::Registry;
use super::relation::{BiRelation, InvariantViolation, RelationError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorKind {
    Player,
    #[default]
    Idle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub label: String,
    pub kind: ActorKind,
}

impl Actor {
    pub fn new(label: impl Into<String>, kind: ActorKind) -> Self {
        Self {
            label: label.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creature {
    pub facing: Direction,
    pub model: String,
}

impl Creature {
    pub fn new(model: impl Into<String>, facing: Direction) -> Self {
        Self {
            facing,
            model: model.into(),
        }
    }
}

pub type Actors = Registry<ActorId, Actor>;
pub type Creatures = Registry<CreatureId, Creature>;
pub type CreatureActor = BiRelation<CreatureId, ActorId>;
pub type CreatureLocation = BiRelation<CreatureId, Location>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    level: Level,
    actors: Actors,
    creatures: Creatures,
    creature_actors: CreatureActor,
    creature_locations: CreatureLocation,
    player: Option<ActorId>,
}

impl World {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn actors(&self) -> &Actors {
        &self.actors
    }

    pub fn creatures(&self) -> &Creatures {
        &self.creatures
    }

    pub fn creature_actors(&self) -> &CreatureActor {
        &self.creature_actors
    }

    pub fn creature_locations(&self) -> &CreatureLocation {
        &self.creature_locations
    }

    pub fn player(&self) -> Option<ActorId> {
        self.player
    }

    pub fn with_creatures(&self, creatures: Creatures) -> Self {
        Self {
            creatures,
            ..self.clone()
        }
    }

    pub fn with_creature_locations(&self, creature_locations: CreatureLocation) -> Self {
        Self {
            creature_locations,
            ..self.clone()
        }
    }

    pub fn with_player(&self, player: Option<ActorId>) -> Self {
        Self {
            player,
            ..self.clone()
        }
    }

    pub fn add_actor(&self, actor: Actor) -> (Self, ActorId) {
        let (actors, id) = self.actors.add(actor);
        (
            Self {
                actors,
                ..self.clone()
            },
            id,
        )
    }

    pub fn spawn_creature(&self, creature: Creature) -> (Self, CreatureId) {
        let (creatures, id) = self.creatures.add(creature);
        (self.with_creatures(creatures), id)
    }

    pub fn relate_actor(
        &self,
        creature: CreatureId,
        actor: ActorId,
    ) -> Result<Self, RelationError> {
        let creature_actors = self.creature_actors.add(creature, actor)?;
        Ok(Self {
            creature_actors,
            ..self.clone()
        })
    }

    pub fn place_creature(
        &self,
        creature: CreatureId,
        location: Location,
    ) -> Result<Self, RelationError> {
        let creature_locations = self.creature_locations.add(creature, location)?;
        Ok(self.with_creature_locations(creature_locations))
    }

    pub fn spawn_creature_at(
        &self,
        creature: Creature,
        location: Location,
        actor: Option<ActorId>,
    ) -> Result<(Self, CreatureId), RelationError> {
        let (world, id) = self.spawn_creature(creature);
        let world = world.place_creature(id, location)?;
        let world = match actor {
            Some(actor) => world.relate_actor(id, actor)?,
            None => world,
        };
        Ok((world, id))
    }

    pub fn unrelate_actor(&self, creature: CreatureId) -> (Self, bool) {
        let (creature_actors, found) = self.creature_actors.remove_left(creature);
        (
            Self {
                creature_actors,
                ..self.clone()
            },
            found,
        )
    }

    pub fn unplace_creature(&self, creature: CreatureId) -> (Self, bool) {
        let (creature_locations, found) = self.creature_locations.remove_left(creature);
        (self.with_creature_locations(creature_locations), found)
    }

    pub fn creature_for_actor(&self, actor: ActorId) -> Option<CreatureId> {
        self.creature_actors.get_inverse(actor)
    }

    pub fn actor_for_creature(&self, creature: CreatureId) -> Option<ActorId> {
        self.creature_actors.get_forward(creature)
    }

    pub fn location_of(&self, creature: CreatureId) -> Option<Location> {
        self.creature_locations.get_forward(creature)
    }

    pub fn creature_at(&self, location: Location) -> Option<CreatureId> {
        self.creature_locations.get_inverse(location)
    }

    pub fn position_of(&self, creature: CreatureId) -> Option<Position> {
        let location = self.location_of(creature)?;
        let facing = self.creatures.get(creature)?.facing;
        Some(Position { location, facing })
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.creature_actors.check_invariant()?;
        self.creature_locations.check_invariant()?;
        for (creature, actor) in self.creature_actors.pairs() {
            if !self.creatures.contains(creature) {
                return Err(InvariantViolation::new(format!(
                    "{creature} is controlled but not registered"
                )));
            }
            if !self.actors.contains(actor) {
                return Err(InvariantViolation::new(format!(
                    "{actor} controls {creature} but is not registered"
                )));
            }
        }
        for (creature, location) in self.creature_locations.pairs() {
            if !self.creatures.contains(creature) {
                return Err(InvariantViolation::new(format!(
                    "{creature} is placed at {location} but not registered"
                )));
            }
        }
        if let Some(player) = self.player {
            if !self.actors.contains(player) {
                return Err(InvariantViolation::new(format!(
                    "player {player} is not registered"
                )));
            }
        }
        Ok(())
    }
}
