//! In-process entity store with the same contract as the PostgreSQL store.
//!
//! Used for tests and ephemeral setups. Scans take a snapshot of the matching rows at
//! call time.

use super::{Direction, EntityStore, EntityStream, ScanQuery};
use crate::criteria::Criteria;
use crate::entity::{Entity, EntityField, Key};
use crate::error::StoreError;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering as AtomicOrdering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub struct MemoryEntityStore<E: Entity> {
    rows: RwLock<BTreeMap<Key, E>>,
    next_key: AtomicI64,
    unique: Vec<E::Field>,
    available: AtomicBool,
}

impl<E: Entity> MemoryEntityStore<E> {
    pub fn new() -> Self {
        MemoryEntityStore {
            rows: RwLock::new(BTreeMap::new()),
            next_key: AtomicI64::new(1),
            unique: Vec::new(),
            available: AtomicBool::new(true),
        }
    }

    /// Enforce a uniqueness constraint on `fields` (nulls never collide).
    pub fn with_unique(mut self, fields: &[E::Field]) -> Self {
        self.unique = fields.to_vec();
        self
    }

    /// Simulate losing (or regaining) the connection to the store.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, AtomicOrdering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(AtomicOrdering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable(format!("{} store is disconnected", E::NAME)))
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<Key, E>>, StoreError> {
        self.check_available()?;
        self.rows
            .read()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<Key, E>>, StoreError> {
        self.check_available()?;
        self.rows
            .write()
            .map_err(|_| StoreError::Internal("lock poisoned".into()))
    }

    fn check_unique(&self, rows: &BTreeMap<Key, E>, entity: &E, own_key: Option<Key>) -> Result<(), StoreError> {
        for &field in &self.unique {
            let value = entity.value_of(field);
            if value.is_null() {
                continue;
            }
            let taken = rows
                .iter()
                .any(|(k, other)| Some(*k) != own_key && other.value_of(field) == value);
            if taken {
                return Err(StoreError::Conflict(format!(
                    "duplicate value for {}.{}",
                    E::TABLE,
                    field.column()
                )));
            }
        }
        Ok(())
    }
}

impl<E: Entity> Default for MemoryEntityStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn compare<E: Entity>(a: &E, b: &E, query: &ScanQuery<E::Field>) -> Ordering {
    for s in query.effective_sort(E::key_field()) {
        let o = a.value_of(s.field).sort_cmp(&b.value_of(s.field));
        let o = match s.direction {
            Direction::Asc => o,
            Direction::Desc => o.reverse(),
        };
        if o != Ordering::Equal {
            return o;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl<E: Entity> EntityStore<E> for MemoryEntityStore<E> {
    async fn get(&self, key: Key) -> Result<Option<E>, StoreError> {
        Ok(self.read()?.get(&key).cloned())
    }

    async fn exists_by_key(&self, key: Key) -> Result<bool, StoreError> {
        Ok(self.read()?.contains_key(&key))
    }

    async fn save(&self, mut entity: E) -> Result<E, StoreError> {
        let mut rows = self.write()?;
        match entity.key() {
            None => {
                self.check_unique(&rows, &entity, None)?;
                let key = self.next_key.fetch_add(1, AtomicOrdering::SeqCst);
                entity.set_key(Some(key));
                rows.insert(key, entity.clone());
            }
            Some(key) => {
                if !rows.contains_key(&key) {
                    return Err(StoreError::NotFound { entity: E::NAME, key });
                }
                self.check_unique(&rows, &entity, Some(key))?;
                rows.insert(key, entity.clone());
            }
        }
        Ok(entity)
    }

    async fn delete_by_key(&self, key: Key) -> Result<(), StoreError> {
        self.write()?.remove(&key);
        Ok(())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.read()?.len() as u64)
    }

    async fn count_matching(&self, criteria: &Criteria<E::Field>) -> Result<u64, StoreError> {
        Ok(self.read()?.values().filter(|e| criteria.matches(*e)).count() as u64)
    }

    fn scan(&self, query: ScanQuery<E::Field>) -> EntityStream<E> {
        let rows = match self.read() {
            Ok(rows) => rows,
            Err(e) => return stream::once(async move { Err(e) }).boxed(),
        };
        let mut matched: Vec<E> = rows
            .values()
            .filter(|e| query.criteria.matches(*e))
            .cloned()
            .collect();
        drop(rows);
        matched.sort_by(|a, b| compare(a, b, &query));
        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);
        let window: Vec<Result<E, StoreError>> = matched.into_iter().skip(offset).take(limit).map(Ok).collect();
        stream::iter(window).boxed()
    }
}
