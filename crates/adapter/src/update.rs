use anyhow::Context;
use soql_orm::{Id, PRIMARY_KEY, Record, RecordMapper, Value};

use crate::batch::settle;
use crate::connect::Adapter;
use crate::error::{Error, INVALID_CROSS_REFERENCE_KEY, Result};
use crate::transport::BatchOptions;

/// Replacement values for one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    /// Record to update.
    pub id: Id,
    /// Fields to replace. `Null` unsets a field.
    pub replace: Record,
}

impl Update {
    /// Creates an update for the record with no replacements yet.
    #[must_use]
    pub fn new(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            replace: Record::new(),
        }
    }

    /// Replaces a field value.
    #[must_use]
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.replace = self.replace.set(field, value);
        self
    }
}

impl Adapter {
    /// Update records, returning the number updated.
    ///
    /// Records are submitted in one batch that is not all-or-none. A batch in
    /// which every record referenced a missing record updates nothing and is
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadRequest`] if a replacement cannot be mapped and
    /// [`Error::Unprocessable`] with the first failure when no record was
    /// updated for any other reason.
    pub async fn update(&self, type_name: &str, updates: &[Update]) -> Result<usize> {
        if updates.is_empty() {
            return Ok(0);
        }

        let mapper = RecordMapper::new(&self.schema, type_name).map_err(Error::BadRequest)?;
        let payload = updates
            .iter()
            .map(|update| {
                let mut raw = mapper.inbound(&update.replace)?;
                raw.insert(PRIMARY_KEY.to_string(), update.id.to_json());
                Ok(raw)
            })
            .collect::<anyhow::Result<Vec<_>>>()
            .map_err(Error::BadRequest)?;

        let object = self.schema.dialect.object_name(type_name).to_string();
        tracing::debug!(object = %object, records = payload.len(), "updating records");

        let options = BatchOptions { all_or_none: false };
        let results = self
            .transport
            .update(object.clone(), payload, options)
            .await
            .context("issue updating records")?;

        match settle(&object, results) {
            Ok(updated) => Ok(updated.len()),
            Err(err) if err.title == INVALID_CROSS_REFERENCE_KEY => Ok(0),
            Err(err) => Err(err.into()),
        }
    }
}
