use anyhow::Context;
use futures::TryStreamExt;
use soql_orm::{FindOptions, Id, PRIMARY_KEY, SelectBuilder};

use crate::batch::settle;
use crate::connect::Adapter;
use crate::error::{Error, Result};

impl Adapter {
    /// Delete records, returning the number deleted.
    ///
    /// With no ids, every record of the type is deleted. An empty id list is
    /// a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the records to delete cannot be
    /// resolved and [`Error::Unprocessable`] with the first failure when no
    /// record was deleted.
    pub async fn delete(&self, type_name: &str, ids: Option<&[Id]>) -> Result<usize> {
        let ids = match ids {
            Some([]) => return Ok(0),
            Some(ids) => ids.to_vec(),
            None => self.all_ids(type_name).await?,
        };
        if ids.is_empty() {
            return Ok(0);
        }

        let object = self.schema.dialect.object_name(type_name).to_string();
        tracing::debug!(object = %object, records = ids.len(), "deleting records");

        let results =
            self.transport.delete(object.clone(), ids).await.context("issue deleting records")?;
        Ok(settle(&object, results)?.len())
    }

    async fn all_ids(&self, type_name: &str) -> Result<Vec<Id>> {
        let options = FindOptions::new().field(PRIMARY_KEY, true);
        let query = SelectBuilder::new(&self.schema, type_name)
            .options(&options)
            .build()
            .map_err(Error::BadRequest)?;

        let response =
            self.transport.query(query.soql, usize::MAX).await.context("issue listing records")?;
        let rows: Vec<_> = response.records.try_collect().await.context("issue listing records")?;

        Ok(rows.iter().filter_map(|row| row.get(PRIMARY_KEY)).filter_map(Id::from_json).collect())
    }
}
