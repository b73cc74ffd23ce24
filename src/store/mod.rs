//! Entity Store: non-blocking point operations plus a lazy, forward-only scan.

mod memory;
mod postgres;

pub use memory::MemoryEntityStore;
pub use postgres::PgEntityStore;

use crate::criteria::Criteria;
use crate::entity::{Entity, EntityField, Key};
use crate::error::StoreError;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Finite, forward-only, not restartable sequence of scanned entities.
pub type EntityStream<E> = BoxStream<'static, Result<E, StoreError>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sort<F> {
    pub field: F,
    pub direction: Direction,
}

impl<F> Sort<F> {
    pub fn asc(field: F) -> Self {
        Sort {
            field,
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: F) -> Self {
        Sort {
            field,
            direction: Direction::Desc,
        }
    }
}

/// One scan request. `limit: None` means unbounded.
#[derive(Clone, Debug)]
pub struct ScanQuery<F> {
    pub criteria: Criteria<F>,
    pub sort: Vec<Sort<F>>,
    pub offset: u64,
    pub limit: Option<u64>,
}

impl<F: EntityField> ScanQuery<F> {
    pub fn filtered(criteria: Criteria<F>) -> Self {
        ScanQuery {
            criteria,
            sort: Vec::new(),
            offset: 0,
            limit: None,
        }
    }

    /// Requested order followed by the key ascending, so windows never overlap.
    pub fn effective_sort(&self, key_field: F) -> Vec<Sort<F>> {
        let mut sort = self.sort.clone();
        if !sort.iter().any(|s| s.field == key_field) {
            sort.push(Sort::asc(key_field));
        }
        sort
    }
}

#[async_trait]
pub trait EntityStore<E: Entity>: Send + Sync {
    async fn get(&self, key: Key) -> Result<Option<E>, StoreError>;

    async fn exists_by_key(&self, key: Key) -> Result<bool, StoreError>;

    /// Insert when the key is absent (assigning one), otherwise replace the existing row.
    async fn save(&self, entity: E) -> Result<E, StoreError>;

    /// Deleting an absent key is a successful no-op.
    async fn delete_by_key(&self, key: Key) -> Result<(), StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    async fn count_matching(&self, criteria: &Criteria<E::Field>) -> Result<u64, StoreError>;

    fn scan(&self, query: ScanQuery<E::Field>) -> EntityStream<E>;

    fn find_by_association(&self, field: E::Field, parent: Key) -> EntityStream<E> {
        self.scan(ScanQuery::filtered(Criteria::all().equals(field, parent)))
    }

    fn find_where_association_is_null(&self, field: E::Field) -> EntityStream<E> {
        self.scan(ScanQuery::filtered(Criteria::all().is_null(field)))
    }
}
