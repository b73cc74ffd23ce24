//! Entity access layer: non-blocking stores, criteria filters, paginated scans with an
//! accurate total, and merge-patch updates behind an existence check.

pub mod app;
pub mod config;
pub mod criteria;
pub mod domain;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod patch;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod store;

pub use app::{api_router, assemble, router, Services, Stores};
pub use config::Settings;
pub use criteria::{parse_criteria, Criteria, Operator};
pub use entity::{Entity, EntityField, EntityPatch, Key};
pub use error::{AppError, ConfigError, StoreError, ValidationKind};
pub use patch::Patch;
pub use routes::{common_routes, common_routes_with_ready, entity_routes};
pub use service::{EntityService, Page, PageLimits, PageRequest};
pub use store::{Direction, EntityStore, MemoryEntityStore, PgEntityStore, ScanQuery, Sort};
