//! Update Orchestrator: create, replace, merge-patch and remove with the existence-check
//! protocol, plus the read side (pages, point reads, association lookups).

use super::pagination::{fetch_page, Page, PageLimits, PageRequest};
use crate::criteria::Criteria;
use crate::entity::{Entity, EntityField, EntityPatch, Key};
use crate::error::{AppError, ValidationKind};
use crate::store::EntityStore;
use futures::TryStreamExt;
use std::sync::Arc;

/// Generic service for one entity type. Holds its store explicitly; no registry.
pub struct EntityService<E: Entity> {
    store: Arc<dyn EntityStore<E>>,
    limits: PageLimits,
}

impl<E: Entity> Clone for EntityService<E> {
    fn clone(&self) -> Self {
        EntityService {
            store: Arc::clone(&self.store),
            limits: self.limits,
        }
    }
}

impl<E: Entity> EntityService<E> {
    pub fn new(store: Arc<dyn EntityStore<E>>, limits: PageLimits) -> Self {
        EntityService { store, limits }
    }

    pub async fn list(
        &self,
        criteria: Criteria<E::Field>,
        request: PageRequest<E::Field>,
    ) -> Result<Page<E>, AppError> {
        tracing::debug!(entity = E::NAME, ?criteria, "request to get a page");
        fetch_page(self.store.as_ref(), criteria, request, &self.limits).await
    }

    pub async fn get_one(&self, key: Key) -> Result<Option<E>, AppError> {
        tracing::debug!(entity = E::NAME, key, "request to get");
        Ok(self.store.get(key).await?)
    }

    pub async fn count_all(&self) -> Result<u64, AppError> {
        Ok(self.store.count().await?)
    }

    /// Persist a transient entity; the store assigns the key.
    pub async fn create(&self, entity: E) -> Result<E, AppError> {
        tracing::debug!(entity = E::NAME, payload = ?entity, "request to save");
        if entity.key().is_some() {
            tracing::warn!(entity = E::NAME, "create rejected: body already carries a key");
            return Err(AppError::field_validation(
                ValidationKind::AlreadyHasKey,
                E::NAME,
                E::key_field().name(),
                format!("a new {} cannot already have an id", E::NAME),
            ));
        }
        Ok(self.store.save(entity).await?)
    }

    /// Full replace of an existing row. Never creates.
    pub async fn replace(&self, key: Key, mut entity: E) -> Result<E, AppError> {
        tracing::debug!(entity = E::NAME, key, payload = ?entity, "request to update");
        check_target::<E>(key, entity.key())?;
        self.ensure_exists(key).await?;
        entity.set_key(Some(key));
        Ok(self.store.save(entity).await?)
    }

    /// Overwrite only the attributes present in `patch`; the merged entity is saved once.
    pub async fn merge_patch(&self, key: Key, patch: E::Patch) -> Result<E, AppError> {
        tracing::debug!(entity = E::NAME, key, payload = ?patch, "request to partially update");
        check_target::<E>(key, patch.key())?;
        self.ensure_exists(key).await?;
        let mut current = self
            .store
            .get(key)
            .await?
            .ok_or(AppError::NotFound { entity: E::NAME, key })?;
        patch.merge_into(&mut current)?;
        current.set_key(Some(key));
        Ok(self.store.save(current).await?)
    }

    /// Absent keys are reported as not found.
    pub async fn remove(&self, key: Key) -> Result<(), AppError> {
        tracing::debug!(entity = E::NAME, key, "request to delete");
        self.ensure_exists(key).await?;
        self.store.delete_by_key(key).await?;
        Ok(())
    }

    pub async fn find_by_association(&self, field: E::Field, parent: Key) -> Result<Vec<E>, AppError> {
        check_association::<E>(field)?;
        Ok(self.store.find_by_association(field, parent).try_collect().await?)
    }

    pub async fn find_where_association_is_null(&self, field: E::Field) -> Result<Vec<E>, AppError> {
        check_association::<E>(field)?;
        Ok(self.store.find_where_association_is_null(field).try_collect().await?)
    }

    async fn ensure_exists(&self, key: Key) -> Result<(), AppError> {
        if self.store.exists_by_key(key).await? {
            Ok(())
        } else {
            tracing::warn!(entity = E::NAME, key, "rejected: entity not found");
            Err(AppError::NotFound { entity: E::NAME, key })
        }
    }
}

/// Body key must be present and equal to the target key. Checked before any store access.
fn check_target<E: Entity>(target: Key, body: Option<Key>) -> Result<(), AppError> {
    let field = E::key_field().name();
    match body {
        None => {
            tracing::warn!(entity = E::NAME, target, "rejected: body has no id");
            Err(AppError::field_validation(
                ValidationKind::MissingKey,
                E::NAME,
                field,
                "invalid id: body has no id",
            ))
        }
        Some(k) if k != target => {
            tracing::warn!(entity = E::NAME, target, body = k, "rejected: id mismatch");
            Err(AppError::field_validation(
                ValidationKind::KeyMismatch,
                E::NAME,
                field,
                format!("invalid id: body id {} does not match {}", k, target),
            ))
        }
        Some(_) => Ok(()),
    }
}

fn check_association<E: Entity>(field: E::Field) -> Result<(), AppError> {
    if field.kind().is_association() {
        Ok(())
    } else {
        Err(AppError::field_validation(
            ValidationKind::NotAnAssociation,
            E::NAME,
            field.name(),
            format!("{} is not an association", field.name()),
        ))
    }
}
