use super::KEY_FIELD;
use crate::entity::{same_entity, Entity, EntityField, EntityPatch, FieldDef, Key};
use crate::error::AppError;
use crate::sql::SqlValue;
use serde::{Deserialize, Serialize};

/// Entity D: key only.
#[derive(Clone, Debug, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct D {
    #[serde(default)]
    pub id: Option<Key>,
}

impl PartialEq for D {
    fn eq(&self, other: &Self) -> bool {
        same_entity(self, other)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DField {
    Id,
}

impl EntityField for DField {
    fn all() -> &'static [Self] {
        &[DField::Id]
    }

    fn def(self) -> &'static FieldDef {
        &KEY_FIELD
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DPatch {
    #[serde(default)]
    pub id: Option<Key>,
}

impl EntityPatch<D> for DPatch {
    fn key(&self) -> Option<Key> {
        self.id
    }

    fn merge_into(self, _target: &mut D) -> Result<(), AppError> {
        Ok(())
    }
}

impl Entity for D {
    type Field = DField;
    type Patch = DPatch;

    const NAME: &'static str = "d";
    const TABLE: &'static str = "d";
    const PATH: &'static str = "ds";

    fn key_field() -> DField {
        DField::Id
    }

    fn key(&self) -> Option<Key> {
        self.id
    }

    fn set_key(&mut self, key: Option<Key>) {
        self.id = key;
    }

    fn value_of(&self, field: DField) -> SqlValue {
        match field {
            DField::Id => self.id.into(),
        }
    }
}
