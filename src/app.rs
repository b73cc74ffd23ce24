//! Explicit assembly: stores, then services, then the router. Nothing is registered globally.

use crate::domain::{A, B, C, D};
use crate::routes::{common_routes, common_routes_with_ready, entity_routes};
use crate::service::{EntityService, PageLimits};
use crate::store::{EntityStore, MemoryEntityStore, PgEntityStore};
use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

/// One store per entity type.
pub struct Stores {
    pub a: Arc<dyn EntityStore<A>>,
    pub b: Arc<dyn EntityStore<B>>,
    pub c: Arc<dyn EntityStore<C>>,
    pub d: Arc<dyn EntityStore<D>>,
}

impl Stores {
    pub fn postgres(pool: &PgPool, schema: &str) -> Self {
        Stores {
            a: Arc::new(PgEntityStore::<A>::new(pool.clone(), schema)),
            b: Arc::new(PgEntityStore::<B>::new(pool.clone(), schema)),
            c: Arc::new(PgEntityStore::<C>::new(pool.clone(), schema)),
            d: Arc::new(PgEntityStore::<D>::new(pool.clone(), schema)),
        }
    }

    pub fn in_memory() -> Self {
        Stores {
            a: Arc::new(MemoryEntityStore::<A>::new()),
            b: Arc::new(MemoryEntityStore::<B>::new()),
            c: Arc::new(MemoryEntityStore::<C>::new()),
            d: Arc::new(MemoryEntityStore::<D>::new()),
        }
    }
}

#[derive(Clone)]
pub struct Services {
    pub a: EntityService<A>,
    pub b: EntityService<B>,
    pub c: EntityService<C>,
    pub d: EntityService<D>,
}

pub fn assemble(stores: Stores, limits: PageLimits) -> Services {
    Services {
        a: EntityService::new(stores.a, limits),
        b: EntityService::new(stores.b, limits),
        c: EntityService::new(stores.c, limits),
        d: EntityService::new(stores.d, limits),
    }
}

/// Entity resources nested under `/api`.
pub fn api_router(services: Services, body_limit_bytes: usize) -> Router {
    let entities = Router::new()
        .merge(entity_routes(services.a))
        .merge(entity_routes(services.b))
        .merge(entity_routes(services.c))
        .merge(entity_routes(services.d));
    Router::new()
        .nest("/api", entities)
        .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(body_limit_bytes)))
}

/// Full application: common routes (with readiness when a pool is given) plus the API.
pub fn router(services: Services, pool: Option<PgPool>, body_limit_bytes: usize) -> Router {
    let common = match pool {
        Some(pool) => common_routes_with_ready(pool),
        None => common_routes(),
    };
    common.merge(api_router(services, body_limit_bytes))
}
