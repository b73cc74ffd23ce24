//! Entity routes: one collection path per entity type, each bound to its own service.

use crate::entity::Entity;
use crate::handlers::entity::{count, create, delete as delete_handler, list, patch, read, replace};
use crate::service::EntityService;
use axum::{routing::get, Router};

/// `/{path}`, `/{path}/count` and `/{path}/:id` for `E`.
pub fn entity_routes<E: Entity>(service: EntityService<E>) -> Router {
    let base = format!("/{}", E::PATH);
    Router::new()
        .route(&base, get(list::<E>).post(create::<E>))
        .route(&format!("{}/count", base), get(count::<E>))
        .route(
            &format!("{}/:id", base),
            get(read::<E>)
                .put(replace::<E>)
                .patch(patch::<E>)
                .delete(delete_handler::<E>),
        )
        .with_state(service)
}
