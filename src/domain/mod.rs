//! Concrete entity types served by this crate.

mod a;
mod b;
mod c;
mod d;

pub use a::{AField, APatch, A};
pub use b::{BField, BPatch, B};
pub use c::{CField, CPatch, C};
pub use d::{DField, DPatch, D};

use crate::entity::{FieldDef, FieldKind};

/// Surrogate key column shared by every entity table.
pub(crate) static KEY_FIELD: FieldDef = FieldDef {
    name: "id",
    column: "id",
    kind: FieldKind::Key,
    required: false,
    sortable: true,
};
