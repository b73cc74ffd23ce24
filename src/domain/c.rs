use super::KEY_FIELD;
use crate::entity::{same_entity, Entity, EntityField, EntityPatch, FieldDef, Key};
use crate::error::AppError;
use crate::sql::SqlValue;
use serde::{Deserialize, Serialize};

/// Entity C: key only.
#[derive(Clone, Debug, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct C {
    #[serde(default)]
    pub id: Option<Key>,
}

impl PartialEq for C {
    fn eq(&self, other: &Self) -> bool {
        same_entity(self, other)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CField {
    Id,
}

impl EntityField for CField {
    fn all() -> &'static [Self] {
        &[CField::Id]
    }

    fn def(self) -> &'static FieldDef {
        &KEY_FIELD
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CPatch {
    #[serde(default)]
    pub id: Option<Key>,
}

impl EntityPatch<C> for CPatch {
    fn key(&self) -> Option<Key> {
        self.id
    }

    fn merge_into(self, _target: &mut C) -> Result<(), AppError> {
        Ok(())
    }
}

impl Entity for C {
    type Field = CField;
    type Patch = CPatch;

    const NAME: &'static str = "c";
    const TABLE: &'static str = "c";
    const PATH: &'static str = "cs";

    fn key_field() -> CField {
        CField::Id
    }

    fn key(&self) -> Option<Key> {
        self.id
    }

    fn set_key(&mut self, key: Option<Key>) {
        self.id = key;
    }

    fn value_of(&self, field: CField) -> SqlValue {
        match field {
            CField::Id => self.id.into(),
        }
    }
}
