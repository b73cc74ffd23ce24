//! Operational routes: liveness, readiness against the pool, build version.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use sqlx::PgPool;

#[derive(Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Status {
    Ok,
    Unavailable,
}

#[derive(Serialize)]
struct Readiness {
    status: Status,
    database: Status,
}

async fn live() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": Status::Ok }))
}

async fn ready(State(pool): State<PgPool>) -> (StatusCode, Json<Readiness>) {
    let database = match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&pool).await {
        Ok(_) => Status::Ok,
        Err(e) => {
            tracing::warn!(error = %e, "database did not answer the readiness query");
            Status::Unavailable
        }
    };
    let code = if database == Status::Ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(Readiness { status: database, database }))
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /health and GET /version; no database needed.
pub fn common_routes() -> Router {
    Router::new()
        .route("/health", get(live))
        .route("/version", get(version))
}

/// `common_routes` plus GET /ready backed by `pool`.
pub fn common_routes_with_ready(pool: PgPool) -> Router {
    common_routes().merge(Router::new().route("/ready", get(ready)).with_state(pool))
}
