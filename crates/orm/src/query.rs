use std::collections::HashMap;

use crate::keys::ForeignKeyMap;
use crate::schema::Registry;
use crate::value::Id;

/// Primary key column of every external object.
pub const PRIMARY_KEY: &str = "Id";

/// Path separator used by the query language to reach related fields.
pub const PATH_SEPARATOR: char = '.';

/// A compiled query, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Query-language text.
    pub soql: String,
    /// Identifiers substituted into the query, in order.
    pub params: Vec<Id>,
    /// Maximum number of rows to fetch.
    pub max_fetch: usize,
}

/// Settings that shape the compiled query text.
#[derive(Debug, Clone)]
pub struct Dialect {
    /// Separates a relationship name from a nested field in option keys.
    pub relationship_delimiter: char,
    /// Upper bound for the number of rows a single query fetches.
    pub max_limit: usize,
    /// Internal record type name to external object name.
    pub type_map: HashMap<String, String>,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            relationship_delimiter: ':',
            max_limit: 200,
            type_map: HashMap::new(),
        }
    }
}

impl Dialect {
    /// External object name for a record type.
    #[must_use]
    pub fn object_name<'a>(&'a self, type_name: &'a str) -> &'a str {
        self.type_map.get(type_name).map_or(type_name, String::as_str)
    }

    /// Fetch cap for a requested limit. A missing or zero limit means "as
    /// many as allowed".
    #[must_use]
    pub fn max_fetch(&self, limit: Option<usize>) -> usize {
        limit.filter(|limit| *limit > 0).map_or(self.max_limit, |limit| limit.min(self.max_limit))
    }

    /// Splits an option key into its base field and the nested remainder.
    #[must_use]
    pub fn split<'a>(&self, key: &'a str) -> (&'a str, Option<&'a str>) {
        key.split_once(self.relationship_delimiter)
            .map_or((key, None), |(base, rest)| (base, Some(rest)))
    }

    /// Rewrites relationship delimiters into the query language's path
    /// separator.
    #[must_use]
    pub fn to_path(&self, key: &str) -> String {
        key.replace(self.relationship_delimiter, &PATH_SEPARATOR.to_string())
    }
}

/// Immutable compilation context: record types, relationship columns and
/// dialect settings.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Declared record types.
    pub registry: Registry,
    /// Relationship storage columns discovered by introspection.
    pub foreign_keys: ForeignKeyMap,
    /// Query text settings.
    pub dialect: Dialect,
}

impl Schema {
    /// Creates a schema from its parts.
    #[must_use]
    pub const fn new(registry: Registry, foreign_keys: ForeignKeyMap, dialect: Dialect) -> Self {
        Self {
            registry,
            foreign_keys,
            dialect,
        }
    }
}
