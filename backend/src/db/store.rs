//! # Document Store
//!
//! The generic persistence contract shared by every service:
//! insert, replace-by-key, delete-by-key, find-by-key, find-all and
//! find-by-filter against a named collection of JSON documents.
//!
//! Services never talk to a `DocumentStore` directly. They hold a typed
//! [`Collection<T>`], which serializes documents and puts a deadline on
//! every call.

use std::cmp::Ordering;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::StoreError;

/// A value a document field is compared against.
///
/// The variant decides how the stored field is interpreted, so timestamps
/// compare chronologically rather than as strings.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Number(f64),
    Timestamp(DateTime<Utc>),
    Bool(bool),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Predicate over the top-level fields of a document.
///
/// Field names are static so that backends can trust them; values are
/// always passed as bind parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document.
    All,
    Eq(&'static str, FilterValue),
    /// Also matches documents that lack the field.
    Ne(&'static str, FilterValue),
    Lt(&'static str, FilterValue),
    Gt(&'static str, FilterValue),
    /// Text field equal to any of the given values.
    In(&'static str, Vec<String>),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: &'static str, value: impl Into<FilterValue>) -> Self {
        Self::Eq(field, value.into())
    }

    pub fn ne(field: &'static str, value: impl Into<FilterValue>) -> Self {
        Self::Ne(field, value.into())
    }

    pub fn lt(field: &'static str, value: impl Into<FilterValue>) -> Self {
        Self::Lt(field, value.into())
    }

    pub fn gt(field: &'static str, value: impl Into<FilterValue>) -> Self {
        Self::Gt(field, value.into())
    }

    pub fn is_in(field: &'static str, values: &[String]) -> Self {
        Self::In(field, values.to_vec())
    }

    /// Evaluate the filter against a JSON document.
    ///
    /// This is the reference semantics; the SQL compiled by the Postgres
    /// store must agree with it.
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, value) => compare(doc.get(*field), value) == Some(Ordering::Equal),
            Filter::Ne(field, value) => compare(doc.get(*field), value) != Some(Ordering::Equal),
            Filter::Lt(field, value) => compare(doc.get(*field), value) == Some(Ordering::Less),
            Filter::Gt(field, value) => compare(doc.get(*field), value) == Some(Ordering::Greater),
            Filter::In(field, values) => doc
                .get(*field)
                .and_then(Value::as_str)
                .is_some_and(|stored| values.iter().any(|v| v == stored)),
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(doc)),
        }
    }
}

/// Order a stored field relative to a filter value.
///
/// `None` when the field is missing or has an incompatible type.
fn compare(stored: Option<&Value>, value: &FilterValue) -> Option<Ordering> {
    let stored = stored?;
    match value {
        FilterValue::Text(expected) => stored.as_str().map(|s| s.cmp(expected.as_str())),
        FilterValue::Number(expected) => stored.as_f64()?.partial_cmp(expected),
        FilterValue::Timestamp(expected) => {
            let parsed = DateTime::parse_from_rfc3339(stored.as_str()?).ok()?;
            Some(parsed.with_timezone(&Utc).cmp(expected))
        }
        FilterValue::Bool(expected) => stored.as_bool().map(|b| b.cmp(expected)),
    }
}

/// Raw document storage, one backend per deployment.
///
/// Implementations must be safe to share across request handlers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store a new document. Fails with `DuplicateKey` if the key is taken.
    async fn insert(&self, collection: &str, key: &str, doc: Value) -> Result<(), StoreError>;

    /// Overwrite the document stored under `key`. Fails with `NotFound` if absent.
    async fn replace(&self, collection: &str, key: &str, doc: Value) -> Result<(), StoreError>;

    /// Remove the document stored under `key`. Fails with `NotFound` if absent.
    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError>;

    async fn find_by_key(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError>;

    /// Every document matching `filter`, in insertion order.
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StoreError>;

    /// Cheap reachability check used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// An entity that is persisted as one document in its own collection.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    /// Name of the collection (and table) holding this entity.
    const COLLECTION: &'static str;

    /// The server-generated identifier the document is stored under.
    fn key(&self) -> &str;
}

/// Typed handle on one collection.
///
/// Every call is bounded by `timeout`; an expired call fails with
/// [`StoreError::Timeout`] instead of waiting on the backend.
pub struct Collection<T> {
    store: Arc<dyn DocumentStore>,
    timeout: Duration,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            timeout: self.timeout,
            _marker: PhantomData,
        }
    }
}

impl<T: Document> Collection<T> {
    pub fn new(store: Arc<dyn DocumentStore>, timeout: Duration) -> Self {
        Self {
            store,
            timeout,
            _marker: PhantomData,
        }
    }

    pub async fn insert(&self, doc: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(doc)?;
        self.bounded(self.store.insert(T::COLLECTION, doc.key(), value))
            .await
    }

    pub async fn replace(&self, doc: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(doc)?;
        self.bounded(self.store.replace(T::COLLECTION, doc.key(), value))
            .await
    }

    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.bounded(self.store.delete(T::COLLECTION, key)).await
    }

    pub async fn find_by_key(&self, key: &str) -> Result<Option<T>, StoreError> {
        let found = self
            .bounded(self.store.find_by_key(T::COLLECTION, key))
            .await?;
        found
            .map(serde_json::from_value)
            .transpose()
            .map_err(StoreError::from)
    }

    pub async fn find_all(&self) -> Result<Vec<T>, StoreError> {
        self.find(&Filter::All).await
    }

    pub async fn find(&self, filter: &Filter) -> Result<Vec<T>, StoreError> {
        let docs = self.bounded(self.store.find(T::COLLECTION, filter)).await?;
        docs.into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
            .collect()
    }

    async fn bounded<F, R>(&self, operation: F) -> Result<R, StoreError>
    where
        F: Future<Output = Result<R, StoreError>>,
    {
        tokio::time::timeout(self.timeout, operation)
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_timestamps_compare_chronologically() {
        // Lexically "10:00:00.500Z" < "10:00:00Z", chronologically it is later.
        let doc = json!({ "start_time": "2024-05-01T10:00:00.500Z" });
        let ten = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();

        assert!(Filter::gt("start_time", ten).matches(&doc));
        assert!(!Filter::lt("start_time", ten).matches(&doc));
    }

    #[test]
    fn test_in_and_combinators() {
        let doc = json!({ "spot_id": "s2", "status": "valid", "price": 4.5 });
        let ids = vec!["s1".to_string(), "s2".to_string()];

        assert!(Filter::is_in("spot_id", &ids).matches(&doc));
        assert!(Filter::And(vec![
            Filter::is_in("spot_id", &ids),
            Filter::eq("status", "valid"),
            Filter::lt("price", 5.0),
        ])
        .matches(&doc));
        assert!(!Filter::Or(vec![]).matches(&doc));
        assert!(Filter::And(vec![]).matches(&doc));
    }

    #[test]
    fn test_ne_matches_missing_field() {
        let doc = json!({ "spot_id": "s1" });
        assert!(Filter::ne("reservation_id", "r1").matches(&doc));
        assert!(!Filter::eq("reservation_id", "r1").matches(&doc));
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Sample {
        id: String,
    }

    impl Document for Sample {
        const COLLECTION: &'static str = "samples";

        fn key(&self) -> &str {
            &self.id
        }
    }

    /// Store whose every call outlives any reasonable deadline.
    struct StalledStore;

    #[async_trait]
    impl DocumentStore for StalledStore {
        async fn insert(&self, _: &str, _: &str, _: Value) -> Result<(), StoreError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }

        async fn replace(&self, _: &str, _: &str, _: Value) -> Result<(), StoreError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }

        async fn delete(&self, _: &str, _: &str) -> Result<(), StoreError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }

        async fn find_by_key(&self, _: &str, _: &str) -> Result<Option<Value>, StoreError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(None)
        }

        async fn find(&self, _: &str, _: &Filter) -> Result<Vec<Value>, StoreError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Vec::new())
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_collection_calls_time_out() {
        let samples: Collection<Sample> =
            Collection::new(Arc::new(StalledStore), Duration::from_millis(20));

        let result = samples.insert(&Sample { id: "p1".into() }).await;
        assert!(matches!(result, Err(StoreError::Timeout(_))));

        let result = samples.find_all().await;
        assert!(matches!(result, Err(StoreError::Timeout(_))));
    }
}
