//! EntityService: generic orchestration over an `EntityStore`.

mod crud;
pub mod pagination;
mod validation;
pub use crud::EntityService;
pub use pagination::{fetch_page, page_links, OversizePolicy, Page, PageLimits, PageLinks, PageRequest, Window};
pub use validation::RequestValidator;
