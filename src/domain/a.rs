use super::KEY_FIELD;
use crate::entity::{same_entity, Entity, EntityField, EntityPatch, FieldDef, FieldKind, Key};
use crate::error::AppError;
use crate::patch::Patch;
use crate::sql::SqlValue;
use serde::{Deserialize, Serialize};

/// Entity A: one required text attribute.
#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct A {
    #[serde(default)]
    pub id: Option<Key>,
    pub test: String,
}

impl A {
    pub fn new(test: impl Into<String>) -> Self {
        A {
            id: None,
            test: test.into(),
        }
    }
}

impl PartialEq for A {
    fn eq(&self, other: &Self) -> bool {
        same_entity(self, other)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AField {
    Id,
    Test,
}

static TEST_FIELD: FieldDef = FieldDef {
    name: "test",
    column: "test",
    kind: FieldKind::Text,
    required: true,
    sortable: true,
};

impl EntityField for AField {
    fn all() -> &'static [Self] {
        &[AField::Id, AField::Test]
    }

    fn def(self) -> &'static FieldDef {
        match self {
            AField::Id => &KEY_FIELD,
            AField::Test => &TEST_FIELD,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct APatch {
    #[serde(default)]
    pub id: Option<Key>,
    #[serde(default)]
    pub test: Patch<String>,
}

impl EntityPatch<A> for APatch {
    fn key(&self) -> Option<Key> {
        self.id
    }

    fn merge_into(self, target: &mut A) -> Result<(), AppError> {
        self.test.merge_required(&mut target.test, A::NAME, TEST_FIELD.name)
    }
}

impl Entity for A {
    type Field = AField;
    type Patch = APatch;

    const NAME: &'static str = "a";
    const TABLE: &'static str = "a";
    const PATH: &'static str = "as";

    fn key_field() -> AField {
        AField::Id
    }

    fn key(&self) -> Option<Key> {
        self.id
    }

    fn set_key(&mut self, key: Option<Key>) {
        self.id = key;
    }

    fn value_of(&self, field: AField) -> SqlValue {
        match field {
            AField::Id => self.id.into(),
            AField::Test => self.test.as_str().into(),
        }
    }
}
