use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RelationError {
    #[error("key is already related")]
    AlreadyRelated,
    #[error("key is not related")]
    NotFound,
    #[error("key is already related to that value")]
    Noop,
    #[error("value is already related to another key")]
    Occupied,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("relation invariant violated: {message}")]
pub struct InvariantViolation {
    pub message: String,
}

impl InvariantViolation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub trait RelationKey: Copy + Eq + Ord + Hash + Debug {}

impl<K> RelationKey for K where K: Copy + Eq + Ord + Hash + Debug {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiRelation<L, R>
where
    L: RelationKey,
    R: RelationKey,
{
    forward: Arc<HashMap<L, R>>,
    inverse: Arc<HashMap<R, L>>,
}

impl<L: RelationKey, R: RelationKey> Default for BiRelation<L, R> {
    fn default() -> Self {
        Self {
            forward: Arc::new(HashMap::new()),
            inverse: Arc::new(HashMap::new()),
        }
    }
}

impl<L: RelationKey, R: RelationKey> BiRelation<L, R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_forward(&self, left: L) -> Option<R> {
        self.forward.get(&left).copied()
    }

    pub fn get_inverse(&self, right: R) -> Option<L> {
        self.inverse.get(&right).copied()
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn add(&self, left: L, right: R) -> Result<Self, RelationError> {
        if self.forward.contains_key(&left) || self.inverse.contains_key(&right) {
            return Err(RelationError::AlreadyRelated);
        }
        let mut next = self.clone();
        Arc::make_mut(&mut next.forward).insert(left, right);
        Arc::make_mut(&mut next.inverse).insert(right, left);
        next.debug_check();
        Ok(next)
    }

    pub fn remove_left(&self, left: L) -> (Self, bool) {
        let Some(right) = self.get_forward(left) else {
            return (self.clone(), false);
        };
        (self.without_pair(left, right), true)
    }

    pub fn remove_right(&self, right: R) -> (Self, bool) {
        let Some(left) = self.get_inverse(right) else {
            return (self.clone(), false);
        };
        (self.without_pair(left, right), true)
    }

    pub fn move_to(&self, left: L, right: R) -> Result<Self, RelationError> {
        let current = self.get_forward(left).ok_or(RelationError::NotFound)?;
        if current == right {
            return Err(RelationError::Noop);
        }
        if self.inverse.contains_key(&right) {
            return Err(RelationError::Occupied);
        }
        let mut next = self.clone();
        Arc::make_mut(&mut next.forward).insert(left, right);
        let inverse = Arc::make_mut(&mut next.inverse);
        inverse.remove(&current);
        inverse.insert(right, left);
        next.debug_check();
        Ok(next)
    }

    pub fn pairs(&self) -> Vec<(L, R)> {
        let mut pairs: Vec<(L, R)> = self
            .forward
            .iter()
            .map(|(left, right)| (*left, *right))
            .collect();
        pairs.sort_unstable();
        pairs
    }

    pub fn check_invariant(&self) -> Result<(), InvariantViolation> {
        if self.forward.len() != self.inverse.len() {
            return Err(InvariantViolation::new(format!(
                "forward has {} entries but inverse has {}",
                self.forward.len(),
                self.inverse.len()
            )));
        }
        for (left, right) in self.forward.iter() {
            match self.inverse.get(right) {
                Some(back) if back == left => {}
                Some(back) => {
                    return Err(InvariantViolation::new(format!(
                        "{left:?} -> {right:?} but inverse maps {right:?} -> {back:?}"
                    )));
                }
                None => {
                    return Err(InvariantViolation::new(format!(
                        "{left:?} -> {right:?} has no inverse entry"
                    )));
                }
            }
        }
        Ok(())
    }

    fn without_pair(&self, left: L, right: R) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.forward).remove(&left);
        Arc::make_mut(&mut next.inverse).remove(&right);
        next.debug_check();
        next
    }

    fn debug_check(&self) {
        debug_assert!(
            self.check_invariant().is_ok(),
            "{:?}",
            self.check_invariant()
        );
    }
}

impl<L, R> Serialize for BiRelation<L, R>
where
    L: RelationKey + Serialize,
    R: RelationKey + Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.pairs())
    }
}

impl<'de, L, R> Deserialize<'de> for BiRelation<L, R>
where
    L: RelationKey + Deserialize<'de>,
    R: RelationKey + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pairs = Vec::<(L, R)>::deserialize(deserializer)?;
        let mut forward = HashMap::with_capacity(pairs.len());
        let mut inverse = HashMap::with_capacity(pairs.len());
        for (left, right) in pairs {
            if forward.contains_key(&left) || inverse.contains_key(&right) {
                return Err(de::Error::custom(format!(
                    "relation pair {left:?} -> {right:?} collides with an earlier pair"
                )));
            }
            forward.insert(left, right);
            inverse.insert(right, left);
        }
        Ok(Self {
            forward: Arc::new(forward),
            inverse: Arc::new(inverse),
        })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::world::{ActorId, CreatureId, Location};

    type Locations = BiRelation<CreatureId, Location>;
    type Controllers = BiRelation<CreatureId, ActorId>;

    fn located(pairs: &[(u64, i32, i32)]) -> Locations {
        let mut relation = Locations::new();
        for (creature, x, y) in pairs {
            relation = relation
                .add(CreatureId(*creature), Location::new(*x, *y))
                .expect("add");
        }
        relation
    }

    #[test]
    fn add_relates_both_directions() {
        let relation = Controllers::new()
            .add(CreatureId(1), ActorId(7))
            .expect("add");

        assert_eq!(relation.get_forward(CreatureId(1)), Some(ActorId(7)));
        assert_eq!(relation.get_inverse(ActorId(7)), Some(CreatureId(1)));
        assert_eq!(relation.len(), 1);
        relation.check_invariant().expect("invariant");
    }

    #[test]
    fn second_add_for_same_key_fails_and_leaves_index_unchanged() {
        let before = Controllers::new()
            .add(CreatureId(1), ActorId(7))
            .expect("add");

        assert_eq!(
            before.add(CreatureId(1), ActorId(8)),
            Err(RelationError::AlreadyRelated)
        );
        assert_eq!(
            before.add(CreatureId(2), ActorId(7)),
            Err(RelationError::AlreadyRelated)
        );
        assert_eq!(before.len(), 1);
        assert_eq!(before.get_forward(CreatureId(1)), Some(ActorId(7)));
        assert_eq!(before.get_inverse(ActorId(8)), None);
    }

    #[test]
    fn remove_drops_both_directions_or_neither() {
        let relation = located(&[(1, 0, 0), (2, 1, 0)]);

        let (by_left, found) = relation.remove_left(CreatureId(1));
        assert!(found);
        assert_eq!(by_left.get_inverse(Location::new(0, 0)), None);
        assert_eq!(by_left.len(), 1);
        by_left.check_invariant().expect("invariant");

        let (by_right, found) = relation.remove_right(Location::new(1, 0));
        assert!(found);
        assert_eq!(by_right.get_forward(CreatureId(2)), None);
        by_right.check_invariant().expect("invariant");

        let (missing, found) = relation.remove_left(CreatureId(9));
        assert!(!found);
        assert_eq!(missing, relation);
        assert_eq!(relation.len(), 2);
    }

    #[test]
    fn move_to_same_location_is_noop() {
        let relation = located(&[(1, 0, 0)]);
        assert_eq!(
            relation.move_to(CreatureId(1), Location::new(0, 0)),
            Err(RelationError::Noop)
        );
        assert_eq!(relation, located(&[(1, 0, 0)]));
    }

    #[test]
    fn move_to_occupied_location_fails() {
        let relation = located(&[(1, 0, 0), (2, 1, 0)]);
        assert_eq!(
            relation.move_to(CreatureId(1), Location::new(1, 0)),
            Err(RelationError::Occupied)
        );
        assert_eq!(relation.get_forward(CreatureId(1)), Some(Location::new(0, 0)));
    }

    #[test]
    fn move_to_unrelated_key_is_not_found() {
        assert_eq!(
            located(&[]).move_to(CreatureId(1), Location::new(0, 0)),
            Err(RelationError::NotFound)
        );
    }

    #[test]
    fn move_to_repoints_both_directions() {
        let before = located(&[(1, 0, 0)]);
        let after = before
            .move_to(CreatureId(1), Location::new(3, 4))
            .expect("move");

        assert_eq!(after.get_forward(CreatureId(1)), Some(Location::new(3, 4)));
        assert_eq!(after.get_inverse(Location::new(3, 4)), Some(CreatureId(1)));
        assert_eq!(after.get_inverse(Location::new(0, 0)), None);
        assert_eq!(before.get_forward(CreatureId(1)), Some(Location::new(0, 0)));
        after.check_invariant().expect("invariant");
    }

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Add(u64, i32, i32),
        RemoveLeft(u64),
        RemoveRight(i32, i32),
        MoveTo(u64, i32, i32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let creature = 0u64..6;
        let coord = 0i32..3;
        prop_oneof![
            (creature.clone(), coord.clone(), coord.clone())
                .prop_map(|(c, x, y)| Op::Add(c, x, y)),
            creature.clone().prop_map(Op::RemoveLeft),
            (coord.clone(), coord.clone()).prop_map(|(x, y)| Op::RemoveRight(x, y)),
            (creature, coord.clone(), coord).prop_map(|(c, x, y)| Op::MoveTo(c, x, y)),
        ]
    }

    fn op_sequence() -> impl Strategy<Value = Vec<Op>> {
        proptest::collection::vec(op_strategy(), 0..64)
    }

    // Failed ops continue from the untouched receiver.
    fn apply(relation: &Locations, op: Op) -> Locations {
        let before = relation.clone();
        let next = match op {
            Op::Add(c, x, y) => {
                let (left, right) = (CreatureId(c), Location::new(x, y));
                let taken = relation.get_forward(left).is_some()
                    || relation.get_inverse(right).is_some();
                match relation.add(left, right) {
                    Ok(next) => {
                        assert!(!taken);
                        assert_eq!(next.get_forward(left), Some(right));
                        assert_eq!(next.len(), relation.len() + 1);
                        next
                    }
                    Err(err) => {
                        assert!(taken);
                        assert_eq!(err, RelationError::AlreadyRelated);
                        relation.clone()
                    }
                }
            }
            Op::RemoveLeft(c) => {
                let left = CreatureId(c);
                let (next, found) = relation.remove_left(left);
                assert_eq!(found, relation.get_forward(left).is_some());
                if found {
                    assert_eq!(next.len(), relation.len() - 1);
                } else {
                    assert_eq!(next, *relation);
                }
                assert_eq!(next.get_forward(left), None);
                next
            }
            Op::RemoveRight(x, y) => {
                let right = Location::new(x, y);
                let (next, found) = relation.remove_right(right);
                assert_eq!(found, relation.get_inverse(right).is_some());
                if !found {
                    assert_eq!(next, *relation);
                }
                assert_eq!(next.get_inverse(right), None);
                next
            }
            Op::MoveTo(c, x, y) => {
                let (left, right) = (CreatureId(c), Location::new(x, y));
                let expected = match (relation.get_forward(left), relation.get_inverse(right)) {
                    (None, _) => Some(RelationError::NotFound),
                    (Some(current), _) if current == right => Some(RelationError::Noop),
                    (Some(_), Some(_)) => Some(RelationError::Occupied),
                    (Some(_), None) => None,
                };
                match relation.move_to(left, right) {
                    Ok(next) => {
                        assert_eq!(expected, None);
                        assert_eq!(next.get_forward(left), Some(right));
                        assert_eq!(next.len(), relation.len());
                        next
                    }
                    Err(err) => {
                        assert_eq!(Some(err), expected);
                        relation.clone()
                    }
                }
            }
        };
        assert_eq!(*relation, before);
        next
    }

    proptest! {
        #[test]
        fn invariant_holds_after_every_step(ops in op_sequence()) {
            let mut relation = Locations::new();
            for op in ops {
                relation = apply(&relation, op);
                prop_assert!(relation.check_invariant().is_ok());
                prop_assert_eq!(relation.pairs().len(), relation.len());
            }
        }
    }

    #[test]
    fn check_invariant_detects_one_sided_entry() {
        let mut broken = located(&[(1, 0, 0)]);
        Arc::make_mut(&mut broken.inverse).clear();
        assert!(broken.check_invariant().is_err());
    }

    #[test]
    fn deserialize_rejects_colliding_pairs() {
        let raw = r#"[[1,{"x":0,"y":0}],[2,{"x":0,"y":0}]]"#;
        assert!(serde_json::from_str::<Locations>(raw).is_err());

        let ok = r#"[[1,{"x":0,"y":0}],[2,{"x":1,"y":0}]]"#;
        let relation = serde_json::from_str::<Locations>(ok).expect("parse");
        assert_eq!(relation, located(&[(1, 0, 0), (2, 1, 0)]));
    }
}
