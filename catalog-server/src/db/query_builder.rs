use sqlx::Sqlite;
use sqlx::query::{QueryAs, QueryScalar};

type SqliteArgs<'q> = <Sqlite as sqlx::Database>::Arguments<'q>;

/// Dynamic WHERE clause with positional bindings
#[derive(Debug, Default)]
pub struct QueryBuilder {
    conditions: Vec<String>,
    bindings: Vec<QueryValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition; its `?` placeholders are bound by the following bind calls
    pub fn add_condition(&mut self, condition: impl Into<String>) -> &mut Self {
        self.conditions.push(condition.into());
        self
    }

    pub fn bind(&mut self, value: QueryValue) -> &mut Self {
        self.bindings.push(value);
        self
    }

    pub fn bind_i64(&mut self, value: i64) -> &mut Self {
        self.bind(QueryValue::Integer(value))
    }

    /// Build WHERE clause (empty if no conditions)
    pub fn build_where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub fn bindings(&self) -> &[QueryValue] {
        &self.bindings
    }

    pub fn apply_bindings<'q, O>(
        &self,
        mut query: QueryAs<'q, Sqlite, O, SqliteArgs<'q>>,
    ) -> QueryAs<'q, Sqlite, O, SqliteArgs<'q>> {
        for binding in &self.bindings {
            query = match binding {
                QueryValue::Text(s) => query.bind(s.clone()),
                QueryValue::Integer(i) => query.bind(*i),
                QueryValue::Float(f) => query.bind(*f),
            };
        }
        query
    }

    pub fn apply_bindings_scalar<'q, O>(
        &self,
        mut query: QueryScalar<'q, Sqlite, O, SqliteArgs<'q>>,
    ) -> QueryScalar<'q, Sqlite, O, SqliteArgs<'q>> {
        for binding in &self.bindings {
            query = match binding {
                QueryValue::Text(s) => query.bind(s.clone()),
                QueryValue::Integer(i) => query.bind(*i),
                QueryValue::Float(f) => query.bind(*f),
            };
        }
        query
    }
}

/// Escape `%`, `_` and `\` and wrap in `%...%` for `LIKE ? ESCAPE '\'`
pub fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
