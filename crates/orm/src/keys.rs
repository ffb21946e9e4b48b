use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Schema introspection result for one external object type.
///
/// Only the parts needed to resolve relationship storage columns are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Describe {
    /// Relationships from other objects pointing at this one.
    #[serde(default)]
    pub child_relationships: Vec<ChildRelationship>,
    /// Fields of this object.
    #[serde(default)]
    pub fields: Vec<DescribeField>,
}

/// A relationship from a child object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildRelationship {
    /// Relationship name, as used in sub-selects.
    pub relationship_name: Option<String>,
    /// Field on the child object holding the reference.
    pub field: String,
}

/// A field of an external object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeField {
    /// Storage column name.
    pub name: String,
    /// Field type, `reference` for lookups.
    #[serde(rename = "type")]
    pub field_type: String,
    /// Relationship name for reference fields.
    pub relationship_name: Option<String>,
}

/// Relationship field name to storage column, per record type.
#[derive(Debug, Clone, Default)]
pub struct ForeignKeyMap {
    types: HashMap<String, HashMap<String, String>>,
}

impl ForeignKeyMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the relationship columns for a record type, replacing any
    /// previous entry.
    pub fn insert(&mut self, type_name: impl Into<String>, columns: HashMap<String, String>) {
        self.types.insert(type_name.into(), columns);
    }

    /// Builder form of [`ForeignKeyMap::insert`].
    #[must_use]
    pub fn with(mut self, type_name: impl Into<String>, columns: HashMap<String, String>) -> Self {
        self.insert(type_name, columns);
        self
    }

    /// Storage column holding the identifier for a relationship field.
    #[must_use]
    pub fn resolve(&self, type_name: &str, field: &str) -> Option<&str> {
        self.types.get(type_name)?.get(field).map(String::as_str)
    }

    /// Storage column for a relationship field, or the field name itself when
    /// the relationship was not reported by introspection.
    #[must_use]
    pub fn column<'a>(&'a self, type_name: &str, field: &'a str) -> &'a str {
        self.resolve(type_name, field).unwrap_or(field)
    }
}

impl Describe {
    /// Relationship name to storage column, from child relationships and
    /// reference fields. Reference fields win when both report a name.
    #[must_use]
    pub fn relationship_columns(&self) -> HashMap<String, String> {
        let children = self.child_relationships.iter().filter_map(|child| {
            child.relationship_name.as_ref().map(|name| (name.clone(), child.field.clone()))
        });

        let references = self.fields.iter().filter(|field| field.field_type == "reference").filter_map(
            |field| field.relationship_name.as_ref().map(|name| (name.clone(), field.name.clone())),
        );

        children.chain(references).collect()
    }
}
