mod action;
mod buildings;
mod direction;
mod ids;
mod level;
mod registry;
mod relation;
mod schedule;
mod state;

pub use action::{execute, Action, ActionError};
pub use buildings::{Building, Buildings};
pub use direction::{Direction, Location, Position, RelativeDirection};
pub use ids::{ActorId, CreatureId, RegistryId};
pub use level::{Layer, Level};
pub use registry::Registry;
pub use relation::{BiRelation, InvariantViolation, RelationError, RelationKey};
pub use schedule::{ActorSchedule, ActorTime};
pub use state::{
    Actor, ActorKind, Actors, Creature, CreatureActor, CreatureLocation, Creatures, World,
};
