//! Turns caller-supplied key/value pairs into `WHERE` predicates and `SET`
//! assignments. Column names only ever come from the allow-list; values are
//! always pushed as bind parameters.

use sqlx::{Postgres, QueryBuilder};

use crate::models::user::{NewUser, UserField};

/// A single `field = $n` unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub field: UserField,
    pub value: String,
}

/// One fragment per allow-listed field whose looked-up value is non-empty,
/// in allow-list order. Keys outside the allow-list are never consulted.
pub fn collect_fragments<'a, F>(allow_list: &[UserField], lookup: F) -> Vec<Fragment>
where
    F: Fn(&str) -> Option<&'a str>,
{
    allow_list
        .iter()
        .filter_map(|field| match lookup(field.as_str()) {
            Some(value) if !value.is_empty() => Some(Fragment {
                field: *field,
                value: value.to_string(),
            }),
            _ => None,
        })
        .collect()
}

/// Appends ` WHERE a = $1 AND b = $2`. Nothing is appended for an empty slice.
pub fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, fragments: &[Fragment]) {
    if fragments.is_empty() {
        return;
    }
    builder.push(" WHERE ");
    let mut separated = builder.separated(" AND ");
    for fragment in fragments {
        separated.push(fragment.field.as_str());
        separated.push_unseparated(" = ");
        separated.push_bind_unseparated(fragment.value.clone());
    }
}

/// Appends ` SET a = $1, b = $2` followed by `, updated_at = now()`.
/// Callers must reject an empty slice before building the statement.
pub fn push_assignments(builder: &mut QueryBuilder<'_, Postgres>, fragments: &[Fragment]) {
    builder.push(" SET ");
    let mut separated = builder.separated(", ");
    for fragment in fragments {
        separated.push(fragment.field.as_str());
        separated.push_unseparated(" = ");
        separated.push_bind_unseparated(fragment.value.clone());
    }
    separated.push("updated_at = now()");
}

/// Appends ` (first_name, ..., country) VALUES ($1, ..., $6)` covering every
/// allow-listed column.
pub fn push_insert(builder: &mut QueryBuilder<'_, Postgres>, user: &NewUser) {
    builder.push(" (");
    {
        let mut columns = builder.separated(", ");
        for field in UserField::ALL {
            columns.push(field.as_str());
        }
    }
    builder.push(") VALUES (");
    {
        let mut values = builder.separated(", ");
        for field in UserField::ALL {
            values.push_bind(user.get(field).to_string());
        }
    }
    builder.push(")");
}

/// Appends ` WHERE id = CAST($n AS BIGINT)`. The id stays text until Postgres
/// casts it, so a malformed id fails as a storage error.
pub fn push_id_match(builder: &mut QueryBuilder<'_, Postgres>, id: &str) {
    builder
        .push(" WHERE id = CAST(")
        .push_bind(id.to_string())
        .push(" AS BIGINT)");
}
