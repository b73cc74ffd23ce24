use super::KEY_FIELD;
use crate::entity::{same_entity, Entity, EntityField, EntityPatch, FieldDef, FieldKind, Key};
use crate::error::AppError;
use crate::patch::Patch;
use crate::sql::SqlValue;
use serde::{Deserialize, Serialize};

/// Entity B: optional association to A, held by key.
#[derive(Clone, Debug, Default, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct B {
    #[serde(default)]
    pub id: Option<Key>,
    #[serde(default)]
    pub a_id: Option<Key>,
}

impl B {
    pub fn new(a_id: Option<Key>) -> Self {
        B { id: None, a_id }
    }
}

impl PartialEq for B {
    fn eq(&self, other: &Self) -> bool {
        same_entity(self, other)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BField {
    Id,
    AId,
}

static A_ID_FIELD: FieldDef = FieldDef {
    name: "aId",
    column: "a_id",
    kind: FieldKind::Association,
    required: false,
    sortable: true,
};

impl EntityField for BField {
    fn all() -> &'static [Self] {
        &[BField::Id, BField::AId]
    }

    fn def(self) -> &'static FieldDef {
        match self {
            BField::Id => &KEY_FIELD,
            BField::AId => &A_ID_FIELD,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BPatch {
    #[serde(default)]
    pub id: Option<Key>,
    #[serde(default)]
    pub a_id: Patch<Key>,
}

impl EntityPatch<B> for BPatch {
    fn key(&self) -> Option<Key> {
        self.id
    }

    fn merge_into(self, target: &mut B) -> Result<(), AppError> {
        self.a_id.merge_optional(&mut target.a_id);
        Ok(())
    }
}

impl Entity for B {
    type Field = BField;
    type Patch = BPatch;

    const NAME: &'static str = "b";
    const TABLE: &'static str = "b";
    const PATH: &'static str = "bs";

    fn key_field() -> BField {
        BField::Id
    }

    fn key(&self) -> Option<Key> {
        self.id
    }

    fn set_key(&mut self, key: Option<Key>) {
        self.id = key;
    }

    fn value_of(&self, field: BField) -> SqlValue {
        match field {
            BField::Id => self.id.into(),
            BField::AId => self.a_id.into(),
        }
    }
}
