//! Filter description: conjunctive (field, operator, value) clauses over logical fields.

use crate::entity::{Entity, EntityField};
use crate::error::{AppError, ValidationKind};
use crate::sql::SqlValue;

/// Query-string keys that are never filters.
pub const RESERVED_PARAMS: &[&str] = &["offset", "limit", "sort"];

#[derive(Clone, Debug, PartialEq)]
pub enum Operator {
    Equals(SqlValue),
    IsNull,
    IsNotNull,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Clause<F> {
    pub field: F,
    pub op: Operator,
}

impl<F: EntityField> Clause<F> {
    fn holds(&self, value: &SqlValue) -> bool {
        match &self.op {
            Operator::Equals(expected) => !value.is_null() && value == expected,
            Operator::IsNull => value.is_null(),
            Operator::IsNotNull => !value.is_null(),
        }
    }
}

/// Immutable once built; clauses combine with AND. Empty criteria match everything.
#[derive(Clone, Debug, PartialEq)]
pub struct Criteria<F> {
    clauses: Vec<Clause<F>>,
}

impl<F> Default for Criteria<F> {
    fn default() -> Self {
        Criteria { clauses: Vec::new() }
    }
}

impl<F: EntityField> Criteria<F> {
    pub fn all() -> Self {
        Self::default()
    }

    /// Equality clause. A null value becomes an is-null clause.
    pub fn equals(mut self, field: F, value: impl Into<SqlValue>) -> Self {
        let value = value.into();
        let op = if value.is_null() {
            Operator::IsNull
        } else {
            Operator::Equals(value)
        };
        self.clauses.push(Clause { field, op });
        self
    }

    pub fn is_null(mut self, field: F) -> Self {
        self.clauses.push(Clause {
            field,
            op: Operator::IsNull,
        });
        self
    }

    pub fn is_not_null(mut self, field: F) -> Self {
        self.clauses.push(Clause {
            field,
            op: Operator::IsNotNull,
        });
        self
    }

    pub fn clauses(&self) -> &[Clause<F>] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluate against an in-memory instance.
    pub fn matches<E: Entity<Field = F>>(&self, entity: &E) -> bool {
        self.clauses
            .iter()
            .all(|c| c.holds(&entity.value_of(c.field)))
    }
}

/// Parse `field=v`, `field.equals=v` and `field.specified=true|false` pairs.
/// Reserved keys are skipped; unknown fields and malformed values are rejected.
pub fn parse_criteria<'a, E, I>(params: I) -> Result<Criteria<E::Field>, AppError>
where
    E: Entity,
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut criteria = Criteria::all();
    for (key, raw) in params {
        if RESERVED_PARAMS.contains(&key) {
            continue;
        }
        let (name, op) = match key.split_once('.') {
            Some((name, op)) => (name, op),
            None => (key, "equals"),
        };
        let field = E::Field::parse(name).ok_or_else(|| {
            AppError::field_validation(
                ValidationKind::UnknownField,
                E::NAME,
                name,
                format!("unknown filter field '{}'", name),
            )
        })?;
        criteria = match op {
            "equals" => {
                let value = field.kind().parse(raw).ok_or_else(|| invalid::<E>(name, raw))?;
                criteria.equals(field, value)
            }
            "specified" => match raw {
                "true" => criteria.is_not_null(field),
                "false" => criteria.is_null(field),
                _ => return Err(invalid::<E>(name, raw)),
            },
            other => {
                return Err(AppError::field_validation(
                    ValidationKind::UnknownField,
                    E::NAME,
                    key,
                    format!("unknown filter operator '{}'", other),
                ))
            }
        };
    }
    Ok(criteria)
}

fn invalid<E: Entity>(field: &str, raw: &str) -> AppError {
    AppError::field_validation(
        ValidationKind::InvalidValue,
        E::NAME,
        field,
        format!("invalid value '{}' for {}", raw, field),
    )
}
