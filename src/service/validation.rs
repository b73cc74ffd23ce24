//! Request-body checks against the entity's field table, on the raw JSON before
//! deserialization so the offending field can be named.

use crate::entity::{Entity, EntityField, FieldKind};
use crate::error::{AppError, ValidationKind};
use serde_json::{Map, Value};

pub struct RequestValidator;

impl RequestValidator {
    /// Full representation (create/replace): required fields present and non-null,
    /// known fields only, values of the right shape.
    pub fn validate<E: Entity>(body: &Map<String, Value>) -> Result<(), AppError> {
        reject_unknown::<E>(body)?;
        for &field in E::Field::all() {
            let def = field.def();
            let val = body.get(def.name);
            if def.required && val.map_or(true, Value::is_null) {
                return Err(AppError::field_validation(
                    ValidationKind::RequiredField,
                    E::NAME,
                    def.name,
                    format!("{} is required", def.name),
                ));
            }
            if let Some(v) = val {
                check_shape::<E>(def.name, def.kind, v)?;
            }
        }
        Ok(())
    }

    /// Partial representation (merge-patch): only fields present are checked, and
    /// null may not clear a required field.
    pub fn validate_partial<E: Entity>(body: &Map<String, Value>) -> Result<(), AppError> {
        reject_unknown::<E>(body)?;
        for (name, v) in body {
            let Some(field) = E::Field::parse(name) else {
                continue;
            };
            let def = field.def();
            if def.required && v.is_null() {
                return Err(AppError::field_validation(
                    ValidationKind::RequiredField,
                    E::NAME,
                    def.name,
                    format!("{} must not be null", def.name),
                ));
            }
            check_shape::<E>(def.name, def.kind, v)?;
        }
        Ok(())
    }
}

fn reject_unknown<E: Entity>(body: &Map<String, Value>) -> Result<(), AppError> {
    match body.keys().find(|k| E::Field::parse(k).is_none()) {
        Some(k) => Err(AppError::field_validation(
            ValidationKind::UnknownField,
            E::NAME,
            k.as_str(),
            format!("unknown field '{}'", k),
        )),
        None => Ok(()),
    }
}

fn check_shape<E: Entity>(name: &str, kind: FieldKind, v: &Value) -> Result<(), AppError> {
    if v.is_null() || kind.accepts_json(v) {
        return Ok(());
    }
    Err(AppError::field_validation(
        ValidationKind::InvalidValue,
        E::NAME,
        name,
        format!("{} must be a {}", name, kind.pg_type()),
    ))
}
