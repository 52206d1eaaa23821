use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use super::ids::ActorId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorTime {
    pub actor: ActorId,
    pub time: u64,
    pub order: u64,
}

impl Ord for ActorTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then(self.order.cmp(&other.order))
            .then(self.actor.cmp(&other.actor))
    }
}

impl PartialOrd for ActorTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// `add` appends without sorting, so [`ActorSchedule::next`] answers "first due
/// entry in storage order". Call [`ActorSchedule::sorted`] first when the
/// globally earliest due entry is wanted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActorSchedule {
    entries: Arc<Vec<ActorTime>>,
    next_order: u64,
}

impl ActorSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, actor: ActorId, time: u64) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.entries).push(ActorTime {
            actor,
            time,
            order: self.next_order,
        });
        next.next_order = self.next_order.saturating_add(1);
        next
    }

    pub fn next(&self, current_time: u64) -> Option<ActorTime> {
        self.entries
            .iter()
            .find(|entry| entry.time <= current_time)
            .copied()
    }

    pub fn remove(&self, entry: ActorTime) -> (Self, bool) {
        let Some(index) = self.entries.iter().position(|candidate| *candidate == entry) else {
            return (self.clone(), false);
        };
        let mut next = self.clone();
        Arc::make_mut(&mut next.entries).remove(index);
        (next, true)
    }

    pub fn remove_actor(&self, actor: ActorId) -> (Self, usize) {
        let before = self.entries.len();
        if !self.entries.iter().any(|entry| entry.actor == actor) {
            return (self.clone(), 0);
        }
        let mut next = self.clone();
        Arc::make_mut(&mut next.entries).retain(|entry| entry.actor != actor);
        let removed = before - next.entries.len();
        (next, removed)
    }

    pub fn swap(&self, first: usize, second: usize) -> (Self, bool) {
        let len = self.entries.len();
        if first >= len || second >= len {
            return (self.clone(), false);
        }
        let mut next = self.clone();
        Arc::make_mut(&mut next.entries).swap(first, second);
        (next, true)
    }

    pub fn sorted(&self) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.entries).sort();
        next
    }

    pub fn earliest_time(&self) -> Option<u64> {
        self.entries.iter().map(|entry| entry.time).min()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActorTime> + '_ {
        self.entries.iter()
    }
}

#[derive(Deserialize)]
struct ScheduleRepr {
    entries: Vec<ActorTime>,
    next_order: u64,
}

impl<'de> Deserialize<'de> for ActorSchedule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = ScheduleRepr::deserialize(deserializer)?;
        let mut seen = HashSet::with_capacity(repr.entries.len());
        for entry in &repr.entries {
            if entry.order >= repr.next_order {
                return Err(de::Error::custom(format!(
                    "schedule order {} is not below next_order {}",
                    entry.order, repr.next_order
                )));
            }
            if !seen.insert(entry.order) {
                return Err(de::Error::custom(format!(
                    "duplicate schedule order {}",
                    entry.order
                )));
            }
        }
        Ok(Self {
            entries: Arc::new(repr.entries),
            next_order: repr.next_order,
        })
    }
}
