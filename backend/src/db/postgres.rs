//! # PostgreSQL Document Store
//!
//! Each collection is a table of `(seq, key, doc JSONB)` rows created by
//! the startup migration. Filters compile to parameterised SQL over the
//! JSONB fields; field names and values are both bound as parameters.
//!
//! ## Query Shapes
//!
//! | Operation | SQL |
//! |-----------|-----|
//! | insert | `INSERT INTO <c> (key, doc) VALUES ($1, $2)` |
//! | replace | `UPDATE <c> SET doc = $2 WHERE key = $1` |
//! | delete | `DELETE FROM <c> WHERE key = $1` |
//! | find | `SELECT doc FROM <c> WHERE <filter> ORDER BY seq` |

use async_trait::async_trait;
use deadpool_postgres::Client;
use serde_json::Value;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tracing::{debug, error};

use super::store::{DocumentStore, Filter, FilterValue};
use super::{Database, StoreError};

type SqlParam = Box<dyn ToSql + Sync + Send>;

/// Document store backed by the shared connection pool.
#[derive(Clone)]
pub struct PostgresStore {
    db: Database,
}

impl PostgresStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn client(&self) -> Result<Client, StoreError> {
        self.db
            .pool()
            .get()
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn insert(&self, collection: &str, key: &str, doc: Value) -> Result<(), StoreError> {
        let table = table_name(collection)?;
        debug!("Inserting {}/{}", table, key);

        let client = self.client().await?;
        let sql = format!("INSERT INTO {} (key, doc) VALUES ($1, $2)", table);

        client
            .execute(sql.as_str(), &[&key, &doc])
            .await
            .map_err(|e| unique_violation_or(e, || format!("{}/{}", table, key)))?;

        Ok(())
    }

    async fn replace(&self, collection: &str, key: &str, doc: Value) -> Result<(), StoreError> {
        let table = table_name(collection)?;
        debug!("Replacing {}/{}", table, key);

        let client = self.client().await?;
        let sql = format!("UPDATE {} SET doc = $2 WHERE key = $1", table);

        let rows_affected = client
            .execute(sql.as_str(), &[&key, &doc])
            .await
            .map_err(|e| unique_violation_or(e, || format!("{}/{}", table, key)))?;

        if rows_affected == 0 {
            return Err(StoreError::NotFound(format!("{}/{}", table, key)));
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        let table = table_name(collection)?;
        debug!("Deleting {}/{}", table, key);

        let client = self.client().await?;
        let sql = format!("DELETE FROM {} WHERE key = $1", table);

        let rows_affected = client.execute(sql.as_str(), &[&key]).await?;

        if rows_affected == 0 {
            return Err(StoreError::NotFound(format!("{}/{}", table, key)));
        }
        Ok(())
    }

    async fn find_by_key(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let table = table_name(collection)?;
        let client = self.client().await?;
        let sql = format!("SELECT doc FROM {} WHERE key = $1", table);

        let rows = client.query(sql.as_str(), &[&key]).await?;
        Ok(rows.first().map(|row| row.get::<_, Value>("doc")))
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        let table = table_name(collection)?;
        let (clause, params) = compile_filter(filter);
        let sql = format!("SELECT doc FROM {} WHERE {} ORDER BY seq", table, clause);
        debug!("Querying {}: {}", table, clause);

        let client = self.client().await?;
        let refs: Vec<&(dyn ToSql + Sync)> = params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect();

        let rows = client.query(sql.as_str(), &refs).await.map_err(|e| {
            error!("Filtered query on {} failed: {}", table, e);
            StoreError::from(e)
        })?;

        Ok(rows.iter().map(|row| row.get::<_, Value>("doc")).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let client = self.client().await?;
        client.query("SELECT 1", &[]).await?;
        Ok(())
    }
}

/// Collection names are interpolated into SQL, so only plain identifiers pass.
fn table_name(collection: &str) -> Result<&str, StoreError> {
    let valid = !collection.is_empty()
        && collection
            .chars()
            .all(|c| c.is_ascii_lowercase() || c == '_');

    if valid {
        Ok(collection)
    } else {
        Err(StoreError::ConfigError(format!(
            "Invalid collection name: {:?}",
            collection
        )))
    }
}

fn unique_violation_or(e: tokio_postgres::Error, what: impl FnOnce() -> String) -> StoreError {
    if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        StoreError::DuplicateKey(what())
    } else {
        StoreError::QueryError(e)
    }
}

/// Compile a filter into a WHERE clause plus its bind parameters.
fn compile_filter(filter: &Filter) -> (String, Vec<SqlParam>) {
    let mut params = Vec::new();
    let clause = compile(filter, &mut params);
    (clause, params)
}

fn compile(filter: &Filter, params: &mut Vec<SqlParam>) -> String {
    match filter {
        Filter::All => "TRUE".to_string(),
        Filter::Eq(field, value) => comparison(field, "=", value, params),
        // A missing field yields NULL; COALESCE keeps NOT from swallowing the row.
        Filter::Ne(field, value) => {
            format!("NOT COALESCE({}, FALSE)", comparison(field, "=", value, params))
        }
        Filter::Lt(field, value) => comparison(field, "<", value, params),
        Filter::Gt(field, value) => comparison(field, ">", value, params),
        Filter::In(field, values) => {
            params.push(Box::new(field.to_string()));
            let field_param = params.len();
            params.push(Box::new(values.clone()));
            format!("(doc ->> ${}) = ANY(${})", field_param, params.len())
        }
        Filter::And(filters) => join(filters, " AND ", "TRUE", params),
        Filter::Or(filters) => join(filters, " OR ", "FALSE", params),
    }
}

fn comparison(field: &str, op: &str, value: &FilterValue, params: &mut Vec<SqlParam>) -> String {
    params.push(Box::new(field.to_string()));
    let field_param = params.len();

    let cast = match value {
        FilterValue::Text(text) => {
            params.push(Box::new(text.clone()));
            ""
        }
        FilterValue::Number(number) => {
            params.push(Box::new(*number));
            "::float8"
        }
        FilterValue::Timestamp(ts) => {
            params.push(Box::new(*ts));
            "::timestamptz"
        }
        FilterValue::Bool(flag) => {
            params.push(Box::new(*flag));
            "::boolean"
        }
    };

    format!("(doc ->> ${}){} {} ${}", field_param, cast, op, params.len())
}

fn join(filters: &[Filter], separator: &str, empty: &str, params: &mut Vec<SqlParam>) -> String {
    if filters.is_empty() {
        return empty.to_string();
    }
    let parts: Vec<String> = filters
        .iter()
        .map(|f| format!("({})", compile(f, params)))
        .collect();
    parts.join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_compile_conflict_query() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap();
        let filter = Filter::And(vec![
            Filter::is_in("spot_id", &["s1".to_string()]),
            Filter::lt("start_time", end),
            Filter::gt("end_time", start),
        ]);

        let (clause, params) = compile_filter(&filter);
        assert_eq!(
            clause,
            "((doc ->> $1) = ANY($2)) AND ((doc ->> $3)::timestamptz < $4) AND ((doc ->> $5)::timestamptz > $6)"
        );
        assert_eq!(params.len(), 6);
    }

    #[test]
    fn test_compile_ne_and_empty_groups() {
        let (clause, params) = compile_filter(&Filter::ne("reservation_id", "r1"));
        assert_eq!(clause, "NOT COALESCE((doc ->> $1) = $2, FALSE)");
        assert_eq!(params.len(), 2);

        assert_eq!(compile_filter(&Filter::All).0, "TRUE");
        assert_eq!(compile_filter(&Filter::Or(vec![])).0, "FALSE");
    }

    #[test]
    fn test_table_name_rejects_injection() {
        assert!(table_name("reservations").is_ok());
        assert!(table_name("users; DROP TABLE users").is_err());
        assert!(table_name("").is_err());
    }
}
