use anyhow::Context;
use futures::{StreamExt, TryStreamExt};
use soql_orm::{ExternalRecord, FindOptions, Id, Record, RecordMapper, SelectBuilder};

use crate::connect::Adapter;
use crate::error::{Error, Result};
use crate::transport::QueryResponse;

/// Records returned by [`Adapter::find`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindResult {
    /// Matching records, at most the fetch cap.
    pub records: Vec<Record>,
    /// Total number of matching records reported by the server.
    pub count: u64,
}

impl Adapter {
    /// Find records of a type, optionally restricted to the given ids.
    ///
    /// An empty id list is a no-op: nothing is queried and the result is
    /// empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadRequest`] if the options cannot be compiled and
    /// [`Error::Transport`] if the query or the row stream fails. A value
    /// that cannot be read as its declared kind is returned as it is.
    pub async fn find(
        &self, type_name: &str, ids: Option<&[Id]>, options: &FindOptions,
    ) -> Result<FindResult> {
        if ids.is_some_and(<[Id]>::is_empty) {
            return Ok(FindResult::default());
        }

        let mut builder = SelectBuilder::new(&self.schema, type_name).options(options);
        if let Some(ids) = ids {
            builder = builder.ids(ids.iter().cloned());
        }
        let query = builder.build().map_err(Error::BadRequest)?;
        let mapper = RecordMapper::new(&self.schema, type_name).map_err(Error::BadRequest)?;

        let QueryResponse { total_size, records } =
            self.transport.query(query.soql, query.max_fetch).await.context("issue running query")?;
        let rows: Vec<ExternalRecord> =
            records.take(query.max_fetch).try_collect().await.context("issue reading query results")?;

        let records = rows.iter().map(|row| mapper.outbound(row)).collect();

        Ok(FindResult {
            records,
            count: total_size,
        })
    }
}
