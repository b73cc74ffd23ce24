//! HTTP handlers for entity resources.

pub mod entity;
pub use entity::*;
