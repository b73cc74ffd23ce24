//! Per-entity descriptor: logical fields, their physical columns, key access.
//!
//! One generic store/service implementation serves every entity type; each type only
//! supplies a small static field table and a handful of accessors.

use crate::error::AppError;
use crate::sql::SqlValue;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::postgres::PgRow;
use sqlx::FromRow;
use std::fmt::Debug;

/// Surrogate key assigned by the store on first save.
pub type Key = i64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Key,
    Text,
    /// Nullable single-valued reference to another entity, by key only.
    Association,
}

impl FieldKind {
    /// PostgreSQL type used to cast bound parameters.
    pub fn pg_type(self) -> &'static str {
        match self {
            FieldKind::Key | FieldKind::Association => "bigint",
            FieldKind::Text => "text",
        }
    }

    /// Parse a textual (query-string) value for this kind.
    pub fn parse(self, raw: &str) -> Option<SqlValue> {
        match self {
            FieldKind::Key | FieldKind::Association => raw.trim().parse::<i64>().ok().map(SqlValue::I64),
            FieldKind::Text => Some(SqlValue::Text(raw.to_string())),
        }
    }

    /// Whether a JSON body value has the right shape for this kind (null excluded).
    pub fn accepts_json(self, v: &serde_json::Value) -> bool {
        match self {
            FieldKind::Key | FieldKind::Association => v.is_i64(),
            FieldKind::Text => v.is_string(),
        }
    }

    pub fn is_association(self) -> bool {
        self == FieldKind::Association
    }
}

/// Static description of one logical field.
#[derive(Debug)]
pub struct FieldDef {
    /// Stable logical name used by callers (JSON and query strings).
    pub name: &'static str,
    /// Physical column name.
    pub column: &'static str,
    pub kind: FieldKind,
    /// Must be present and non-null on create/replace; may not be cleared by a patch.
    pub required: bool,
    pub sortable: bool,
}

pub trait EntityField: Copy + Eq + Debug + Send + Sync + 'static {
    fn all() -> &'static [Self];

    fn def(self) -> &'static FieldDef;

    fn parse(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|f| f.def().name == name)
    }

    fn name(self) -> &'static str {
        self.def().name
    }

    fn column(self) -> &'static str {
        self.def().column
    }

    fn kind(self) -> FieldKind {
        self.def().kind
    }
}

pub trait Entity:
    Clone + Debug + Send + Sync + Unpin + Serialize + DeserializeOwned + for<'r> FromRow<'r, PgRow> + 'static
{
    type Field: EntityField;
    type Patch: EntityPatch<Self>;

    /// Singular name used in logs and errors.
    const NAME: &'static str;
    const TABLE: &'static str;
    /// Collection path segment (e.g. "as").
    const PATH: &'static str;

    fn key_field() -> Self::Field;

    fn key(&self) -> Option<Key>;

    fn set_key(&mut self, key: Option<Key>);

    fn value_of(&self, field: Self::Field) -> SqlValue;

    /// Every field except the key, in declaration order.
    fn data_fields() -> Vec<Self::Field> {
        Self::Field::all()
            .iter()
            .copied()
            .filter(|f| f.kind() != FieldKind::Key)
            .collect()
    }
}

/// Partial payload for merge-patch.
pub trait EntityPatch<E>: Debug + Send + DeserializeOwned + 'static {
    fn key(&self) -> Option<Key>;

    /// Overwrite only the attributes present in the payload.
    fn merge_into(self, target: &mut E) -> Result<(), AppError>;
}

/// Key-only identity: two instances are the same entity when both carry the same key.
pub fn same_entity<E: Entity>(a: &E, b: &E) -> bool {
    matches!((a.key(), b.key()), (Some(x), Some(y)) if x == y)
}
