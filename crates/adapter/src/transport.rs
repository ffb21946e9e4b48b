use std::fmt::{self, Debug};

use futures::future::BoxFuture;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use soql_orm::{Describe, ExternalRecord, Id};

use crate::options::ConnectOptions;

/// Boxed future returned by every [`Transport`] method.
pub type FutureResult<T> = BoxFuture<'static, anyhow::Result<T>>;

/// Remote API session providers implement the [`Transport`] trait to allow
/// the adapter to authenticate, introspect object types, run queries and
/// submit record batches.
pub trait Transport: Debug + Send + Sync + 'static {
    /// Authenticate a session. The OAuth2 flow applies when
    /// [`ConnectOptions::uses_oauth2`] is true.
    fn login(&self, options: ConnectOptions) -> FutureResult<()>;

    /// End the session.
    fn logout(&self) -> FutureResult<()>;

    /// Introspect an external object type.
    fn describe(&self, object: String) -> FutureResult<Describe>;

    /// Execute a query, streaming at most `max_fetch` rows.
    fn query(&self, soql: String, max_fetch: usize) -> FutureResult<QueryResponse>;

    /// Create records in one batch.
    fn create(
        &self, object: String, records: Vec<ExternalRecord>, options: BatchOptions,
    ) -> FutureResult<Vec<SaveResult>>;

    /// Update records in one batch. Each record carries its `Id`.
    fn update(
        &self, object: String, records: Vec<ExternalRecord>, options: BatchOptions,
    ) -> FutureResult<Vec<SaveResult>>;

    /// Delete records by identifier in one batch.
    fn delete(&self, object: String, ids: Vec<Id>) -> FutureResult<Vec<SaveResult>>;
}

/// Rows returned by a query.
pub struct QueryResponse {
    /// Number of matching rows reported by the server, independent of how
    /// many rows are fetched.
    pub total_size: u64,
    /// Row stream.
    pub records: BoxStream<'static, anyhow::Result<ExternalRecord>>,
}

impl Debug for QueryResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryResponse").field("total_size", &self.total_size).finish_non_exhaustive()
    }
}

/// Batch submission options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOptions {
    /// Roll back the whole batch when any record fails.
    pub all_or_none: bool,
}

/// Per-record outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResult {
    /// Identifier of the saved record.
    #[serde(default)]
    pub id: Option<Id>,
    /// Whether the record was saved.
    pub success: bool,
    /// Reasons the record was not saved.
    #[serde(default)]
    pub errors: Vec<SaveError>,
}

impl SaveResult {
    /// A successful outcome.
    #[must_use]
    pub const fn ok(id: Id) -> Self {
        Self {
            id: Some(id),
            success: true,
            errors: Vec::new(),
        }
    }

    /// A failed outcome.
    #[must_use]
    pub fn failed(error: SaveError) -> Self {
        Self {
            id: None,
            success: false,
            errors: vec![error],
        }
    }
}

/// Reason a record was not saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveError {
    /// Status code, e.g. `REQUIRED_FIELD_MISSING`.
    #[serde(default)]
    pub status_code: Option<String>,
    /// Error code, reported by some endpoints instead of a status code.
    #[serde(default)]
    pub error_code: Option<String>,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Fields the error refers to.
    #[serde(default)]
    pub fields: Vec<String>,
}

impl SaveError {
    /// Creates an error with a status code.
    #[must_use]
    pub fn new(status_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status_code: Some(status_code.into()),
            message: message.into(),
            ..Self::default()
        }
    }

    /// Names the field the error refers to.
    #[must_use]
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }
}
