use std::collections::HashMap;

use anyhow::{Result, anyhow};

/// Scalar kind of a declared field.
///
/// Selects the literal formatting used by the query compiler and the coercion
/// applied by the record mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// Free text.
    String,
    /// Integer or decimal number.
    Number,
    /// `true` / `false`.
    Boolean,
    /// Exact point in time (date and time of day).
    Instant,
    /// Calendar date without a time of day.
    CalendarDate,
    /// Anything else; values pass through untouched.
    Opaque,
}

/// Field metadata for one field of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    /// Scalar kind of the field (ignored for relationships).
    pub kind: ScalarKind,
    /// Whether the field holds a collection of values.
    pub is_collection: bool,
    /// Linked record type for relationship fields.
    pub link: Option<String>,
    /// Name of the inverse relationship field on the linked type, if any.
    pub inverse: Option<String>,
}

/// The shape of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation<'a> {
    /// Plain scalar field.
    Scalar(ScalarKind),
    /// Single reference to a record of the linked type.
    ToOne(&'a str),
    /// Ordered collection of references to records of the linked type.
    ToMany(&'a str),
}

impl FieldDefinition {
    /// Creates a plain scalar field.
    #[must_use]
    pub const fn scalar(kind: ScalarKind) -> Self {
        Self {
            kind,
            is_collection: false,
            link: None,
            inverse: None,
        }
    }

    /// Creates a to-one relationship field.
    #[must_use]
    pub fn to_one(link: impl Into<String>) -> Self {
        Self {
            kind: ScalarKind::Opaque,
            is_collection: false,
            link: Some(link.into()),
            inverse: None,
        }
    }

    /// Creates a to-many relationship field.
    #[must_use]
    pub fn to_many(link: impl Into<String>) -> Self {
        Self {
            kind: ScalarKind::Opaque,
            is_collection: true,
            link: Some(link.into()),
            inverse: None,
        }
    }

    /// Sets the inverse relationship field.
    #[must_use]
    pub fn inverse(mut self, inverse: impl Into<String>) -> Self {
        self.inverse = Some(inverse.into());
        self
    }

    /// Classifies the field as scalar, to-one or to-many.
    #[must_use]
    pub fn relation(&self) -> Relation<'_> {
        match (&self.link, self.is_collection) {
            (Some(link), true) => Relation::ToMany(link),
            (Some(link), false) => Relation::ToOne(link),
            (None, _) => Relation::Scalar(self.kind),
        }
    }

    /// Returns `true` for to-one and to-many relationship fields.
    #[must_use]
    pub const fn is_relationship(&self) -> bool {
        self.link.is_some()
    }
}

/// Field metadata for a record type, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    name: String,
    fields: Vec<(String, FieldDefinition)>,
}

impl TypeDescriptor {
    /// Creates an empty descriptor for the named type.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Declares a field. Redeclaring a field replaces its definition in place.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, definition: FieldDefinition) -> Self {
        let name = name.into();
        if let Some(slot) = self.fields.iter_mut().find(|(field, _)| *field == name) {
            slot.1 = definition;
        } else {
            self.fields.push((name, definition));
        }
        self
    }

    /// The record type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a declared field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|(name, _)| name == field).map(|(_, definition)| definition)
    }

    /// Iterates declared fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldDefinition)> {
        self.fields.iter().map(|(name, definition)| (name.as_str(), definition))
    }
}

/// Registry of all record types known to the adapter.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    types: HashMap<String, TypeDescriptor>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a record type.
    #[must_use]
    pub fn with(mut self, descriptor: TypeDescriptor) -> Self {
        self.types.insert(descriptor.name.clone(), descriptor);
        self
    }

    /// Looks up a record type.
    #[must_use]
    pub fn get(&self, type_name: &str) -> Option<&TypeDescriptor> {
        self.types.get(type_name)
    }

    /// Looks up a record type, failing when it is not registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the type has not been registered.
    pub fn require(&self, type_name: &str) -> Result<&TypeDescriptor> {
        self.get(type_name).ok_or_else(|| anyhow!("unknown record type '{type_name}'"))
    }

    /// Names of all registered types.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}
