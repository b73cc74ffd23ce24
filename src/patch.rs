//! Tri-state field value for merge-patch payloads: absent, explicit null, or a new value.

use crate::error::{AppError, ValidationKind};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Declare patch fields with `#[serde(default)]` so a missing key becomes `Absent`.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Patch<T> {
    #[default]
    Absent,
    Null,
    Set(T),
}

impl<T> Patch<T> {
    /// Merge into an optional attribute. Null clears it.
    pub fn merge_optional(self, target: &mut Option<T>) {
        match self {
            Patch::Absent => {}
            Patch::Null => *target = None,
            Patch::Set(v) => *target = Some(v),
        }
    }

    /// Merge into a required attribute. Null is rejected with the field named.
    pub fn merge_required(self, target: &mut T, entity: &'static str, field: &'static str) -> Result<(), AppError> {
        match self {
            Patch::Absent => Ok(()),
            Patch::Null => Err(AppError::field_validation(
                ValidationKind::RequiredField,
                entity,
                field,
                format!("{} must not be null", field),
            )),
            Patch::Set(v) => {
                *target = v;
                Ok(())
            }
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Patch::Set(v),
            None => Patch::Null,
        })
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Patch::Absent | Patch::Null => serializer.serialize_none(),
            Patch::Set(v) => v.serialize(serializer),
        }
    }
}
