#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Request, Response};
use axum::Router;
use entity_access::domain::{A, B, C, D};
use entity_access::{api_router, assemble, MemoryEntityStore, PageLimits, Services, Stores};
use serde_json::Value;
use std::sync::Arc;

/// Memory stores kept alongside the assembled services so tests can flip availability.
pub struct Harness {
    pub a: Arc<MemoryEntityStore<A>>,
    pub b: Arc<MemoryEntityStore<B>>,
    pub services: Services,
}

pub fn harness_with(limits: PageLimits) -> Harness {
    let a = Arc::new(MemoryEntityStore::<A>::new());
    let b = Arc::new(MemoryEntityStore::<B>::new());
    let stores = Stores {
        a: a.clone(),
        b: b.clone(),
        c: Arc::new(MemoryEntityStore::<C>::new()),
        d: Arc::new(MemoryEntityStore::<D>::new()),
    };
    Harness {
        a,
        b,
        services: assemble(stores, limits),
    }
}

pub fn harness() -> Harness {
    harness_with(PageLimits::default())
}

pub fn app(services: Services) -> Router {
    api_router(services, 64 * 1024)
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(resp: Response<Body>) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
