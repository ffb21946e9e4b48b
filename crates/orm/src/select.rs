use anyhow::{Result, bail};

use crate::filter::{Filter, Predicates, check_path};
use crate::options::FindOptions;
use crate::query::{PRIMARY_KEY, Query, Schema};
use crate::schema::{FieldDefinition, Relation, TypeDescriptor};
use crate::value::Id;

/// Builder for SELECT queries against one record type.
pub struct SelectBuilder<'a> {
    schema: &'a Schema,
    type_name: &'a str,
    ids: Option<Vec<Id>>,
    options: Option<&'a FindOptions>,
}

impl<'a> SelectBuilder<'a> {
    /// Creates a new SELECT query builder for the record type.
    #[must_use]
    pub const fn new(schema: &'a Schema, type_name: &'a str) -> Self {
        Self {
            schema,
            type_name,
            ids: None,
            options: None,
        }
    }

    /// Restricts the query to the given identifiers.
    #[must_use]
    pub fn ids(mut self, ids: impl IntoIterator<Item = Id>) -> Self {
        self.ids = Some(ids.into_iter().collect());
        self
    }

    /// Applies filters, sorting, projection and pagination.
    #[must_use]
    pub const fn options(mut self, options: &'a FindOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Build the SELECT query.
    ///
    /// # Errors
    ///
    /// Returns an error if the record type is not registered, the id list is
    /// empty, or an option resolves to an unsafe path or an invalid literal.
    pub fn build(self) -> Result<Query> {
        let schema = self.schema;
        let descriptor = schema.registry.require(self.type_name)?;
        let defaults = FindOptions::default();
        let options = self.options.unwrap_or(&defaults);

        let columns = self.columns(descriptor, options)?;

        let mut filters = Vec::new();
        if let Some(ids) = &self.ids {
            if ids.is_empty() {
                bail!("no identifiers to select for '{}'", self.type_name);
            }
            filters.push(Filter::ids(ids));
        }
        filters.extend(Predicates::new(schema, descriptor, self.type_name).compile(options)?);

        let order = self.order(descriptor, options)?;

        let object = schema.dialect.object_name(self.type_name);
        check_path(object)?;

        let mut soql = format!("SELECT {} FROM {object}", columns.join(", "));
        let filter = Filter::And(filters);
        if !filter.is_empty() {
            soql.push_str(&format!(" WHERE {filter}"));
        }
        if !order.is_empty() {
            soql.push_str(&format!(" ORDER BY {}", order.join(", ")));
        }
        if let Some(offset) = options.offset {
            soql.push_str(&format!(" OFFSET {offset}"));
        }

        let params = self.ids.unwrap_or_default();
        let max_fetch = schema.dialect.max_fetch(options.limit);
        if let Some(hook) = &options.query {
            soql = hook(soql, &params);
        }

        tracing::debug!(
            record_type = self.type_name,
            soql = %soql,
            param_count = params.len(),
            max_fetch,
            "SelectBuilder generated SOQL"
        );

        Ok(Query {
            soql,
            params,
            max_fetch,
        })
    }

    /// Field names to fetch, primary key first.
    fn projection<'o>(&self, descriptor: &'o TypeDescriptor, options: &'o FindOptions) -> Vec<&'o str> {
        let mut fields = vec![PRIMARY_KEY];

        if let Some(selected) = options.selected_fields() {
            for name in selected {
                push_unique(&mut fields, name);
            }
        } else {
            if let Some(requested) = options.meta.fields.get(self.type_name) {
                for name in requested {
                    push_unique(&mut fields, name);
                }
            }
            if fields.len() == 1 {
                for (name, definition) in descriptor.fields() {
                    if !definition.is_relationship() {
                        push_unique(&mut fields, name);
                    }
                }
            }
        }

        for (name, definition) in descriptor.fields() {
            if definition.is_relationship() && options.meta.includes(name) {
                push_unique(&mut fields, name);
            }
        }

        fields
    }

    fn columns(&self, descriptor: &TypeDescriptor, options: &FindOptions) -> Result<Vec<String>> {
        let mut columns = Vec::new();

        for name in self.projection(descriptor, options) {
            let column = match descriptor.get(name).map(FieldDefinition::relation) {
                Some(Relation::ToMany(link)) => {
                    check_path(name)?;
                    // predicates only reach the sub-select of an included relation
                    let filter = if options.meta.includes(name) {
                        Filter::And(Predicates::new(self.schema, descriptor, link).compile(options)?)
                    } else {
                        Filter::And(Vec::new())
                    };
                    if filter.is_empty() {
                        format!("(SELECT {PRIMARY_KEY} FROM {name})")
                    } else {
                        format!("(SELECT {PRIMARY_KEY} FROM {name} WHERE {filter})")
                    }
                }
                Some(Relation::ToOne(_)) => {
                    self.schema.foreign_keys.column(descriptor.name(), name).to_string()
                }
                Some(Relation::Scalar(_)) | None => name.to_string(),
            };
            if !column.starts_with('(') {
                check_path(&column)?;
            }
            columns.push(column);
        }

        Ok(columns)
    }

    fn order(&self, descriptor: &TypeDescriptor, options: &FindOptions) -> Result<Vec<String>> {
        let dialect = &self.schema.dialect;
        let mut order = Vec::new();

        for (key, ascending) in &options.sort {
            let (base, rest) = dialect.split(key);
            let path = match (descriptor.get(base).map(FieldDefinition::relation), rest) {
                (None | Some(Relation::ToMany(_)), _) => continue,
                (Some(Relation::ToOne(_)), None) => {
                    self.schema.foreign_keys.column(descriptor.name(), base).to_string()
                }
                (Some(Relation::ToOne(_) | Relation::Scalar(_)), _) => dialect.to_path(key),
            };
            check_path(&path)?;
            order.push(format!("{path} {}", if *ascending { "ASC" } else { "DESC" }));
        }

        Ok(order)
    }
}

fn push_unique<'o>(fields: &mut Vec<&'o str>, name: &'o str) {
    if !fields.contains(&name) {
        fields.push(name);
    }
}
