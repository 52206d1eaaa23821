use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use super::ids::RegistryId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry<I, T> {
    next_id: u64,
    entries: Arc<BTreeMap<I, T>>,
}

impl<I, T> Default for Registry<I, T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Arc::new(BTreeMap::new()),
        }
    }
}

impl<I: RegistryId, T: Clone> Registry<I, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, value: T) -> (Self, I) {
        let id = I::from_raw(self.next_id);
        let mut next = self.clone();
        next.next_id = self.next_id.saturating_add(1);
        Arc::make_mut(&mut next.entries).insert(id, value);
        (next, id)
    }

    pub fn get(&self, id: I) -> Option<&T> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: I) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn set(&self, id: I, value: T) -> (Self, bool) {
        if !self.entries.contains_key(&id) {
            return (self.clone(), false);
        }
        let mut next = self.clone();
        Arc::make_mut(&mut next.entries).insert(id, value);
        (next, true)
    }

    pub fn remove(&self, id: I) -> (Self, Option<T>) {
        if !self.entries.contains_key(&id) {
            return (self.clone(), None);
        }
        let mut next = self.clone();
        let removed = Arc::make_mut(&mut next.entries).remove(&id);
        (next, removed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn next_id(&self) -> I {
        I::from_raw(self.next_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> + '_ {
        self.entries.iter().map(|(id, value)| (*id, value))
    }
}

#[derive(Serialize)]
struct RegistryRef<'a, I, T> {
    next_id: u64,
    entries: Vec<(&'a I, &'a T)>,
}

#[derive(Deserialize)]
struct RegistryRepr<I, T> {
    next_id: u64,
    entries: Vec<(I, T)>,
}

impl<I, T> Serialize for Registry<I, T>
where
    I: RegistryId + Serialize,
    T: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RegistryRef {
            next_id: self.next_id,
            entries: self.entries.iter().collect(),
        }
        .serialize(serializer)
    }
}

impl<'de, I, T> Deserialize<'de> for Registry<I, T>
where
    I: RegistryId + Deserialize<'de>,
    T: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = RegistryRepr::<I, T>::deserialize(deserializer)?;
        let mut entries = BTreeMap::new();
        for (id, value) in repr.entries {
            if id.raw() >= repr.next_id {
                return Err(de::Error::custom(format!(
                    "registry id {} is not below next_id {}",
                    id.raw(),
                    repr.next_id
                )));
            }
            if entries.insert(id, value).is_some() {
                return Err(de::Error::custom(format!(
                    "duplicate registry id {}",
                    id.raw()
                )));
            }
        }
        Ok(Self {
            next_id: repr.next_id,
            entries: Arc::new(entries),
        })
    }
}
