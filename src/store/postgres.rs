//! PostgreSQL entity store on a shared `PgPool`.

use super::{EntityStore, EntityStream, ScanQuery};
use crate::criteria::Criteria;
use crate::entity::{Entity, Key};
use crate::error::StoreError;
use crate::sql::{self, QueryBuf};
use async_trait::async_trait;
use futures::StreamExt;
use sqlx::PgPool;
use std::marker::PhantomData;
use tokio::sync::mpsc;

/// Rows buffered between the fetch task and the consumer of a scan.
const SCAN_BUFFER: usize = 64;

pub struct PgEntityStore<E> {
    pool: PgPool,
    schema: String,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> PgEntityStore<E> {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgEntityStore {
            pool,
            schema: schema.into(),
            _entity: PhantomData,
        }
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<E>, StoreError> {
        tracing::debug!(entity = E::NAME, sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_as::<_, E>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        Ok(query.fetch_optional(&self.pool).await?)
    }

    async fn fetch_count(&self, q: &QueryBuf) -> Result<u64, StoreError> {
        tracing::debug!(entity = E::NAME, sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<_, i64>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        let n = query.fetch_one(&self.pool).await?;
        Ok(n.max(0) as u64)
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for PgEntityStore<E> {
    async fn get(&self, key: Key) -> Result<Option<E>, StoreError> {
        let q = sql::select_by_key::<E>(&self.schema, key);
        self.fetch_optional(&q).await
    }

    async fn exists_by_key(&self, key: Key) -> Result<bool, StoreError> {
        let q = sql::exists_by_key::<E>(&self.schema, key);
        tracing::debug!(entity = E::NAME, sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<_, bool>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        Ok(query.fetch_one(&self.pool).await?)
    }

    async fn save(&self, entity: E) -> Result<E, StoreError> {
        match entity.key() {
            None => {
                let q = sql::insert::<E>(&self.schema, &entity);
                self.fetch_optional(&q)
                    .await?
                    .ok_or_else(|| StoreError::Internal(format!("insert into {} returned no row", E::TABLE)))
            }
            Some(key) => {
                let q = sql::update::<E>(&self.schema, key, &entity);
                self.fetch_optional(&q)
                    .await?
                    .ok_or(StoreError::NotFound { entity: E::NAME, key })
            }
        }
    }

    async fn delete_by_key(&self, key: Key) -> Result<(), StoreError> {
        let q = sql::delete::<E>(&self.schema, key);
        tracing::debug!(entity = E::NAME, sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        query.execute(&self.pool).await?;
        Ok(())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let q = sql::count::<E>(&self.schema, &Criteria::all());
        self.fetch_count(&q).await
    }

    async fn count_matching(&self, criteria: &Criteria<E::Field>) -> Result<u64, StoreError> {
        let q = sql::count::<E>(&self.schema, criteria);
        self.fetch_count(&q).await
    }

    /// Rows are fetched by a background task and handed over through a bounded channel,
    /// so the consumer pulls lazily. Dropping the stream stops the task at its next send.
    fn scan(&self, query: ScanQuery<E::Field>) -> EntityStream<E> {
        let q = sql::select_page::<E>(&self.schema, &query);
        let pool = self.pool.clone();
        let (tx, rx) = mpsc::channel::<Result<E, StoreError>>(SCAN_BUFFER);
        tokio::spawn(async move {
            tracing::debug!(entity = E::NAME, sql = %q.sql, params = ?q.params, "scan");
            let mut query = sqlx::query_as::<_, E>(&q.sql);
            for p in &q.params {
                query = query.bind(p.clone());
            }
            let mut rows = query.fetch(&pool);
            while let Some(row) = rows.next().await {
                let item = row.map_err(StoreError::from);
                let failed = item.is_err();
                if tx.send(item).await.is_err() || failed {
                    break;
                }
            }
        });
        futures::stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) }).boxed()
    }
}
