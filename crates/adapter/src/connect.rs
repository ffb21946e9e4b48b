use std::sync::Arc;

use anyhow::Context;
use futures::future::try_join_all;
use soql_orm::{Dialect, ForeignKeyMap, Registry, Schema};
use tracing::instrument;

use crate::error::Result;
use crate::options::ConnectOptions;
use crate::transport::Transport;

/// Record adapter over a remote API session.
///
/// The schema (record types, relationship columns and dialect) is built once
/// by [`AdapterBuilder::connect`] and is read-only afterwards.
#[derive(Debug, Clone)]
pub struct Adapter {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) schema: Arc<Schema>,
}

impl Adapter {
    /// Starts configuring an adapter for the registered record types.
    #[must_use]
    pub fn builder(transport: Arc<dyn Transport>, registry: Registry) -> AdapterBuilder {
        AdapterBuilder {
            transport,
            registry,
            dialect: Dialect::default(),
        }
    }

    /// The compilation context built during connect.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Ends the remote session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`](crate::Error::Transport) if logout fails.
    pub async fn disconnect(&self) -> Result<()> {
        self.transport.logout().await.context("issue logging out")?;
        tracing::info!("disconnected");
        Ok(())
    }
}

/// Builder for an [`Adapter`].
#[derive(Debug)]
pub struct AdapterBuilder {
    transport: Arc<dyn Transport>,
    registry: Registry,
    dialect: Dialect,
}

impl AdapterBuilder {
    /// Maps a record type to a differently named external object.
    #[must_use]
    pub fn type_map(mut self, type_name: impl Into<String>, object: impl Into<String>) -> Self {
        self.dialect.type_map.insert(type_name.into(), object.into());
        self
    }

    /// Sets the delimiter separating a relationship from a nested field in
    /// option keys. Defaults to `:`.
    #[must_use]
    pub const fn relationship_delimiter(mut self, delimiter: char) -> Self {
        self.dialect.relationship_delimiter = delimiter;
        self
    }

    /// Sets the upper bound for rows fetched by a single find. Defaults to 200.
    #[must_use]
    pub const fn max_limit(mut self, max_limit: usize) -> Self {
        self.dialect.max_limit = max_limit;
        self
    }

    /// Connect using options loaded from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`](crate::Error::Configuration) if the
    /// environment cannot be read or required options are missing, otherwise
    /// as [`AdapterBuilder::connect_with`].
    pub async fn connect(self) -> Result<Adapter> {
        let options = ConnectOptions::load()
            .map_err(|err| crate::Error::Configuration(format!("{err:#}")))?;
        self.connect_with(options).await
    }

    /// Log in and introspect every registered record type.
    ///
    /// Relationship storage columns are discovered concurrently, one
    /// introspection per type; any failure aborts the connect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`](crate::Error::Configuration) before any
    /// network call if required options are missing, and
    /// [`Error::Transport`](crate::Error::Transport) if login or introspection
    /// fails.
    #[instrument(
        skip(self, options),
        fields(login_url = %options.login_url, oauth2 = options.uses_oauth2())
    )]
    pub async fn connect_with(self, options: ConnectOptions) -> Result<Adapter> {
        options.validate()?;

        let Self {
            transport,
            registry,
            dialect,
        } = self;

        transport.login(options).await.context("issue logging in")?;

        let types: Vec<String> = registry.type_names().map(ToString::to_string).collect();
        let describes = types
            .iter()
            .map(|type_name| transport.describe(dialect.object_name(type_name).to_string()));
        let describes = try_join_all(describes).await.context("issue describing record types")?;

        let mut foreign_keys = ForeignKeyMap::new();
        for (type_name, describe) in types.iter().zip(describes) {
            let columns = describe.relationship_columns();
            tracing::debug!(
                record_type = %type_name,
                relationships = columns.len(),
                "described record type"
            );
            foreign_keys.insert(type_name.clone(), columns);
        }

        tracing::info!(record_types = types.len(), "connected");

        Ok(Adapter {
            transport,
            schema: Arc::new(Schema::new(registry, foreign_keys, dialect)),
        })
    }
}
