use std::collections::HashMap;

use anyhow::Context;
use soql_orm::{FindOptions, Id, PRIMARY_KEY, Record, RecordMapper, Value};

use crate::batch::settle;
use crate::connect::Adapter;
use crate::error::{Error, Result};
use crate::transport::BatchOptions;

impl Adapter {
    /// Create records, returning them as stored, in creation order.
    ///
    /// The batch is all-or-none. Records may not carry an id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] before any network call if a record has an
    /// id, [`Error::BadRequest`] if a record cannot be mapped, and
    /// [`Error::Unprocessable`] with the first failure when no record was
    /// created.
    pub async fn create(&self, type_name: &str, records: &[Record]) -> Result<Vec<Record>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        if records.iter().any(has_id) {
            return Err(Error::Conflict("record can not be created with an id".to_string()));
        }

        let mapper = RecordMapper::new(&self.schema, type_name).map_err(Error::BadRequest)?;
        let payload = records
            .iter()
            .map(|record| mapper.inbound(record))
            .collect::<anyhow::Result<Vec<_>>>()
            .map_err(Error::BadRequest)?;

        let object = self.schema.dialect.object_name(type_name).to_string();
        tracing::debug!(object = %object, records = payload.len(), "creating records");

        let options = BatchOptions { all_or_none: true };
        let results = self
            .transport
            .create(object.clone(), payload, options)
            .await
            .context("issue creating records")?;
        let ids: Vec<Id> = settle(&object, results)?.into_iter().filter_map(|result| result.id).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found = self.find(type_name, Some(&ids), &FindOptions::default()).await?;
        let mut by_id: HashMap<Id, Record> = found
            .records
            .into_iter()
            .filter_map(|record| record.id.clone().map(|id| (id, record)))
            .collect();

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }
}

fn has_id(record: &Record) -> bool {
    record.id.is_some()
        || [PRIMARY_KEY, "id"]
            .iter()
            .any(|key| record.get(key).is_some_and(|value| *value != Value::Null))
}
