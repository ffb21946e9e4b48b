use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::value::{Id, Value};

/// Post-processor applied to the assembled query text and its identifier
/// parameters.
pub type QueryHook = Arc<dyn Fn(String, &[Id]) -> String + Send + Sync>;

/// Equality operand for a `match` option.
#[derive(Debug, Clone, PartialEq)]
pub enum Match {
    /// `field = value`
    One(Value),
    /// `field IN (values)`
    Any(Vec<Value>),
}

/// Inclusive range bounds. A missing bound is not compared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Range {
    /// Lower bound (`>=`).
    pub low: Option<Value>,
    /// Upper bound (`<=`).
    pub high: Option<Value>,
}

/// Request metadata surrounding a find: relationships to include and
/// per-type field selections.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    /// Relationship fields to include in the projection.
    pub include: Vec<String>,
    /// Selected fields, by record type.
    pub fields: HashMap<String, Vec<String>>,
}

impl RequestMeta {
    /// Creates empty request metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Includes a relationship field.
    #[must_use]
    pub fn include(mut self, relationship: impl Into<String>) -> Self {
        let relationship = relationship.into();
        if !self.include.contains(&relationship) {
            self.include.push(relationship);
        }
        self
    }

    /// Selects fields for a record type.
    #[must_use]
    pub fn fields_for(
        mut self, type_name: impl Into<String>, fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.fields.insert(type_name.into(), fields.into_iter().map(Into::into).collect());
        self
    }

    /// Whether the relationship was explicitly included.
    #[must_use]
    pub fn includes(&self, relationship: &str) -> bool {
        self.include.iter().any(|included| included == relationship)
    }
}

/// Options for a find: filters, sorting, projection and pagination.
///
/// Keys are field names, optionally reaching into a relationship with the
/// dialect's delimiter (`Parent:Name`). Entries keep the order they were
/// added in; setting a key twice replaces the earlier value in place.
#[derive(Clone, Default)]
pub struct FindOptions {
    pub(crate) matches: Vec<(String, Match)>,
    pub(crate) exists: Vec<(String, bool)>,
    pub(crate) ranges: Vec<(String, Range)>,
    pub(crate) fuzzy: Vec<(String, String)>,
    pub(crate) sort: Vec<(String, bool)>,
    pub(crate) fields: Option<Vec<(String, bool)>>,
    pub(crate) offset: Option<u64>,
    pub(crate) limit: Option<usize>,
    pub(crate) meta: RequestMeta,
    pub(crate) query: Option<QueryHook>,
}

impl FindOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality filter.
    #[must_use]
    pub fn r#match(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        upsert(&mut self.matches, key.into(), Match::One(value.into()));
        self
    }

    /// Adds a set-membership filter.
    #[must_use]
    pub fn match_any(
        mut self, key: impl Into<String>, values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        upsert(&mut self.matches, key.into(), Match::Any(values));
        self
    }

    /// Adds a presence filter.
    #[must_use]
    pub fn exists(mut self, key: impl Into<String>, present: bool) -> Self {
        upsert(&mut self.exists, key.into(), present);
        self
    }

    /// Adds an inclusive range filter with both bounds.
    #[must_use]
    pub fn range(
        self, key: impl Into<String>, low: impl Into<Value>, high: impl Into<Value>,
    ) -> Self {
        self.range_bounds(
            key,
            Range {
                low: Some(low.into()),
                high: Some(high.into()),
            },
        )
    }

    /// Adds a range filter with only a lower bound.
    #[must_use]
    pub fn range_from(self, key: impl Into<String>, low: impl Into<Value>) -> Self {
        self.range_bounds(
            key,
            Range {
                low: Some(low.into()),
                high: None,
            },
        )
    }

    /// Adds a range filter with only an upper bound.
    #[must_use]
    pub fn range_to(self, key: impl Into<String>, high: impl Into<Value>) -> Self {
        self.range_bounds(
            key,
            Range {
                low: None,
                high: Some(high.into()),
            },
        )
    }

    /// Adds a range filter from explicit bounds.
    #[must_use]
    pub fn range_bounds(mut self, key: impl Into<String>, range: Range) -> Self {
        upsert(&mut self.ranges, key.into(), range);
        self
    }

    /// Adds a prefix-match filter.
    #[must_use]
    pub fn fuzzy_match(mut self, key: impl Into<String>, prefix: impl Into<String>) -> Self {
        upsert(&mut self.fuzzy, key.into(), prefix.into());
        self
    }

    /// Adds a sort key, ascending when `ascending` is `true`.
    #[must_use]
    pub fn sort(mut self, key: impl Into<String>, ascending: bool) -> Self {
        upsert(&mut self.sort, key.into(), ascending);
        self
    }

    /// Selects (or deselects) a field. Once any field is named, only the
    /// selected fields are fetched.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, selected: bool) -> Self {
        upsert(self.fields.get_or_insert_with(Vec::new), name.into(), selected);
        self
    }

    /// Selects several fields.
    #[must_use]
    pub fn fields(self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        names.into_iter().fold(self, |options, name| options.field(name, true))
    }

    /// Sets the number of rows to skip.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Sets the maximum number of rows to return.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the surrounding request metadata.
    #[must_use]
    pub fn meta(mut self, meta: RequestMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Sets a post-processor for the assembled query text.
    #[must_use]
    pub fn query(mut self, hook: impl Fn(String, &[Id]) -> String + Send + Sync + 'static) -> Self {
        self.query = Some(Arc::new(hook));
        self
    }

    /// Fields explicitly selected, in order.
    pub(crate) fn selected_fields(&self) -> Option<Vec<&str>> {
        self.fields.as_ref().map(|fields| {
            fields.iter().filter(|(_, selected)| *selected).map(|(name, _)| name.as_str()).collect()
        })
    }
}

impl Debug for FindOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FindOptions")
            .field("matches", &self.matches)
            .field("exists", &self.exists)
            .field("ranges", &self.ranges)
            .field("fuzzy", &self.fuzzy)
            .field("sort", &self.sort)
            .field("fields", &self.fields)
            .field("offset", &self.offset)
            .field("limit", &self.limit)
            .field("meta", &self.meta)
            .field("query", &self.query.is_some())
            .finish()
    }
}

fn upsert<V>(entries: &mut Vec<(String, V)>, key: String, value: V) {
    if let Some(slot) = entries.iter_mut().find(|(existing, _)| *existing == key) {
        slot.1 = value;
    } else {
        entries.push((key, value));
    }
}
