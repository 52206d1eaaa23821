use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::direction::{Direction, Location, RelativeDirection};
use super::ids::{ActorId, CreatureId};
use super::relation::RelationError;
use super::state::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Wait,
    MoveAbsolute {
        actor: ActorId,
        direction: Direction,
        steps: i32,
    },
    MoveRelative {
        actor: ActorId,
        relative: RelativeDirection,
        steps: i32,
    },
    Turn {
        actor: ActorId,
        relative: RelativeDirection,
        steps: i32,
    },
}

impl Action {
    pub fn actor(&self) -> Option<ActorId> {
        match self {
            Self::Wait => None,
            Self::MoveAbsolute { actor, .. }
            | Self::MoveRelative { actor, .. }
            | Self::Turn { actor, .. } => Some(*actor),
        }
    }

    pub fn time_cost(&self) -> u64 {
        match self {
            Self::Wait | Self::Turn { .. } => 1,
            Self::MoveAbsolute { steps, .. } | Self::MoveRelative { steps, .. } => {
                u64::try_from(*steps).unwrap_or(0).max(1)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("{actor} has no creature")]
    NoCreatureForActor { actor: ActorId },
    #[error("{creature} has no location")]
    NoLocationForCreature { creature: CreatureId },
    #[error("{creature} is not registered")]
    UnknownCreature { creature: CreatureId },
    #[error("blocked leaving {location} towards {direction}")]
    Blocked {
        location: Location,
        direction: Direction,
    },
    #[error(transparent)]
    Relation(#[from] RelationError),
}

/// Applies `action` to `world`. On error the caller's world is the current
/// state; no partial effects are ever returned.
pub fn execute(world: &World, action: &Action) -> Result<World, ActionError> {
    match *action {
        Action::Wait => Ok(world.clone()),
        Action::MoveAbsolute {
            actor,
            direction,
            steps,
        } => {
            if steps <= 0 {
                return Ok(world.clone());
            }
            let creature = creature_for(world, actor)?;
            move_creature(world, creature, direction, steps)
        }
        Action::MoveRelative {
            actor,
            relative,
            steps,
        } => {
            if steps <= 0 {
                return Ok(world.clone());
            }
            let creature = creature_for(world, actor)?;
            let facing = world
                .creatures()
                .get(creature)
                .ok_or(ActionError::UnknownCreature { creature })?
                .facing;
            move_creature(world, creature, facing.add(relative), steps)
        }
        Action::Turn {
            actor,
            relative,
            steps,
        } => {
            if steps <= 0 {
                return Ok(world.clone());
            }
            let creature = creature_for(world, actor)?;
            let mut body = world
                .creatures()
                .get(creature)
                .cloned()
                .ok_or(ActionError::UnknownCreature { creature })?;
            body.facing = body.facing.rotate(relative, i64::from(steps));
            let (creatures, _) = world.creatures().set(creature, body);
            Ok(world.with_creatures(creatures))
        }
    }
}

fn creature_for(world: &World, actor: ActorId) -> Result<CreatureId, ActionError> {
    world
        .creature_for_actor(actor)
        .ok_or(ActionError::NoCreatureForActor { actor })
}

fn move_creature(
    world: &World,
    creature: CreatureId,
    direction: Direction,
    steps: i32,
) -> Result<World, ActionError> {
    let start = world
        .location_of(creature)
        .ok_or(ActionError::NoLocationForCreature { creature })?;

    let mut candidate = start;
    for _ in 0..steps {
        if !world.level().is_passable(candidate, direction) {
            return Err(ActionError::Blocked {
                location: candidate,
                direction,
            });
        }
        candidate = candidate.step(direction);
    }

    match world.creature_locations().move_to(creature, candidate) {
        Ok(locations) => Ok(world.with_creature_locations(locations)),
        Err(RelationError::Noop) => Ok(world.clone()),
        Err(error) => Err(error.into()),
    }
}
