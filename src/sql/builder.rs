//! Builds parameterized SELECT, COUNT, INSERT, UPDATE, DELETE from entity descriptors.
//! Identifiers come from static field tables only; every value is a bound parameter.

use crate::criteria::{Criteria, Operator};
use crate::entity::{Entity, EntityField, FieldKind, Key};
use crate::sql::SqlValue;
use crate::store::{Direction, ScanQuery};

/// Quote identifier for PostgreSQL.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Push a parameter and return its typed placeholder (e.g. `$2::bigint`).
    fn push_param(&mut self, v: SqlValue, kind: FieldKind) -> String {
        self.params.push(v);
        format!("${}::{}", self.params.len(), kind.pg_type())
    }
}

fn select_column_list<E: Entity>() -> String {
    E::Field::all()
        .iter()
        .map(|f| quoted(f.column()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render criteria as a ` WHERE ...` fragment (empty for no clauses), binding values into `q`.
pub fn where_clause<F: EntityField>(q: &mut QueryBuf, criteria: &Criteria<F>) -> String {
    if criteria.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = criteria
        .clauses()
        .iter()
        .map(|c| {
            let col = quoted(c.field.column());
            match &c.op {
                Operator::Equals(v) => {
                    let ph = q.push_param(v.clone(), c.field.kind());
                    format!("{} = {}", col, ph)
                }
                Operator::IsNull => format!("{} IS NULL", col),
                Operator::IsNotNull => format!("{} IS NOT NULL", col),
            }
        })
        .collect();
    format!(" WHERE {}", parts.join(" AND "))
}

pub fn select_by_key<E: Entity>(schema: &str, key: Key) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, E::TABLE);
    let pk = E::key_field();
    let ph = q.push_param(SqlValue::I64(key), pk.kind());
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        select_column_list::<E>(),
        table,
        quoted(pk.column()),
        ph
    );
    q
}

pub fn exists_by_key<E: Entity>(schema: &str, key: Key) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, E::TABLE);
    let pk = E::key_field();
    let ph = q.push_param(SqlValue::I64(key), pk.kind());
    q.sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = {})",
        table,
        quoted(pk.column()),
        ph
    );
    q
}

pub fn count<E: Entity>(schema: &str, criteria: &Criteria<E::Field>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, E::TABLE);
    let where_sql = where_clause(&mut q, criteria);
    q.sql = format!("SELECT COUNT(*) FROM {}{}", table, where_sql);
    q
}

/// SELECT with criteria, ORDER BY (key as final tiebreaker), optional LIMIT and OFFSET.
pub fn select_page<E: Entity>(schema: &str, query: &ScanQuery<E::Field>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, E::TABLE);
    let where_sql = where_clause(&mut q, &query.criteria);
    let order = query
        .effective_sort(E::key_field())
        .iter()
        .map(|s| match s.direction {
            Direction::Asc => format!("{} ASC NULLS LAST", quoted(s.field.column())),
            Direction::Desc => format!("{} DESC NULLS FIRST", quoted(s.field.column())),
        })
        .collect::<Vec<_>>()
        .join(", ");
    let limit_clause = query.limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    let offset_clause = if query.offset > 0 {
        format!(" OFFSET {}", query.offset)
    } else {
        String::new()
    };
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {}{}{}",
        select_column_list::<E>(),
        table,
        where_sql,
        order,
        limit_clause,
        offset_clause
    );
    q
}

/// INSERT every non-key column; the store generates the key.
pub fn insert<E: Entity>(schema: &str, entity: &E) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, E::TABLE);
    let fields = E::data_fields();
    let returning = select_column_list::<E>();
    if fields.is_empty() {
        q.sql = format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, returning);
        return q;
    }
    let mut cols = Vec::with_capacity(fields.len());
    let mut placeholders = Vec::with_capacity(fields.len());
    for f in fields {
        cols.push(quoted(f.column()));
        placeholders.push(q.push_param(entity.value_of(f), f.kind()));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        table,
        cols.join(", "),
        placeholders.join(", "),
        returning
    );
    q
}

/// UPDATE by key: every non-key column is overwritten from `entity`.
/// With no non-key columns there is nothing to set, so the row is re-read instead.
pub fn update<E: Entity>(schema: &str, key: Key, entity: &E) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, E::TABLE);
    let pk = E::key_field();
    let fields = E::data_fields();
    let returning = select_column_list::<E>();
    if fields.is_empty() {
        return select_by_key::<E>(schema, key);
    }
    let sets: Vec<String> = fields
        .into_iter()
        .map(|f| {
            let ph = q.push_param(entity.value_of(f), f.kind());
            format!("{} = {}", quoted(f.column()), ph)
        })
        .collect();
    let key_ph = q.push_param(SqlValue::I64(key), pk.kind());
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        table,
        sets.join(", "),
        quoted(pk.column()),
        key_ph,
        returning
    );
    q
}

pub fn delete<E: Entity>(schema: &str, key: Key) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, E::TABLE);
    let pk = E::key_field();
    let ph = q.push_param(SqlValue::I64(key), pk.kind());
    q.sql = format!("DELETE FROM {} WHERE {} = {}", table, quoted(pk.column()), ph);
    q
}
