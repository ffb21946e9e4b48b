use std::fmt::{self, Display};

use anyhow::{Result, bail};

use crate::options::{FindOptions, Match};
use crate::query::{PRIMARY_KEY, Schema};
use crate::schema::{Relation, ScalarKind, TypeDescriptor};
use crate::value::{Id, Value, escape_like};

/// A compiled predicate over a resolved field path.
///
/// Literals are rendered (quoted and escaped) when the filter is built, so a
/// filter always renders to well-formed query text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// path = literal
    Eq(String, String),
    /// path IN (literals)
    In(String, Vec<String>),
    /// path != null
    NotNull(String),
    /// path = null
    Null(String),
    /// path >= literal
    Gte(String, String),
    /// path <= literal
    Lte(String, String),
    /// path LIKE 'prefix%'
    StartsWith(String, String),
    /// Logical AND of multiple filters
    And(Vec<Self>),
}

impl Filter {
    /// Creates the primary-key membership filter (`Id IN (...)`).
    #[must_use]
    pub fn ids(ids: &[Id]) -> Self {
        Self::In(PRIMARY_KEY.to_string(), ids.iter().map(Id::to_literal).collect())
    }

    /// Whether the filter renders to nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::And(filters) if filters.iter().all(Self::is_empty))
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq(path, literal) => write!(f, "{path} = {literal}"),
            Self::In(path, literals) => write!(f, "{path} IN ({})", literals.join(", ")),
            Self::NotNull(path) => write!(f, "{path} != null"),
            Self::Null(path) => write!(f, "{path} = null"),
            Self::Gte(path, literal) => write!(f, "{path} >= {literal}"),
            Self::Lte(path, literal) => write!(f, "{path} <= {literal}"),
            Self::StartsWith(path, prefix) => write!(f, "{path} LIKE '{}%'", escape_like(prefix)),
            Self::And(filters) => {
                let rendered: Vec<String> = filters
                    .iter()
                    .filter(|filter| !filter.is_empty())
                    .map(ToString::to_string)
                    .collect();
                f.write_str(&rendered.join(" AND "))
            }
        }
    }
}

/// A field path resolved against the declared fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Query-language path (`Name`, `Parent.Name`, `ParentId`).
    pub path: String,
    /// Declared kind of the addressed field, when known.
    pub kind: Option<ScalarKind>,
}

impl Target {
    fn literal(&self, value: &Value) -> Result<String> {
        self.kind.map_or_else(|| value.to_literal(), |kind| value.to_literal_as(kind))
    }
}

/// Compiles `match`, `exists`, `range` and `fuzzy_match` options into
/// filters.
///
/// `compiling` is the record type the predicates are compiled for: the
/// requested type for the main query, the linked type when re-run for a
/// to-many sub-select. Undeclared keys and to-many keys whose link target
/// differs from `compiling` are skipped; every other key applies.
pub struct Predicates<'a> {
    schema: &'a Schema,
    descriptor: &'a TypeDescriptor,
    compiling: &'a str,
}

impl<'a> Predicates<'a> {
    /// Creates a compiler for keys declared on `descriptor`.
    #[must_use]
    pub const fn new(schema: &'a Schema, descriptor: &'a TypeDescriptor, compiling: &'a str) -> Self {
        Self {
            schema,
            descriptor,
            compiling,
        }
    }

    /// Compiles all predicate options, in the order match, exists, range,
    /// fuzzy match.
    ///
    /// # Errors
    ///
    /// Returns an error if a key resolves to an unsafe path or a value has
    /// no literal form for its field.
    pub fn compile(&self, options: &FindOptions) -> Result<Vec<Filter>> {
        let mut filters = Vec::new();

        for (key, operand) in &options.matches {
            let Some(target) = self.resolve(key)? else { continue };
            let filter = match operand {
                Match::One(value) => Filter::Eq(target.path.clone(), target.literal(value)?),
                Match::Any(values) => {
                    if values.is_empty() {
                        bail!("match on '{key}' has an empty set of values");
                    }
                    let literals =
                        values.iter().map(|value| target.literal(value)).collect::<Result<_>>()?;
                    Filter::In(target.path, literals)
                }
            };
            filters.push(filter);
        }

        for (key, present) in &options.exists {
            let Some(target) = self.resolve(key)? else { continue };
            filters.push(if *present { Filter::NotNull(target.path) } else { Filter::Null(target.path) });
        }

        for (key, range) in &options.ranges {
            let Some(target) = self.resolve(key)? else { continue };
            if let Some(low) = range.low.as_ref().filter(|low| **low != Value::Null) {
                filters.push(Filter::Gte(target.path.clone(), target.literal(low)?));
            }
            if let Some(high) = range.high.as_ref().filter(|high| **high != Value::Null) {
                filters.push(Filter::Lte(target.path.clone(), target.literal(high)?));
            }
        }

        for (key, prefix) in &options.fuzzy {
            let Some(target) = self.resolve(key)? else { continue };
            filters.push(Filter::StartsWith(target.path, prefix.clone()));
        }

        Ok(filters)
    }

    /// Resolves an option key to a query path, or `None` when the key is
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the resolved path contains characters that are not
    /// valid in an identifier path.
    pub fn resolve(&self, key: &str) -> Result<Option<Target>> {
        let dialect = &self.schema.dialect;
        let (base, rest) = dialect.split(key);
        let Some(definition) = self.descriptor.get(base) else {
            return Ok(None);
        };

        let target = match definition.relation() {
            Relation::ToMany(link) => {
                let Some(rest) = rest.filter(|_| link == self.compiling) else {
                    return Ok(None);
                };
                Target {
                    path: dialect.to_path(rest),
                    kind: self.linked_kind(link, rest),
                }
            }
            Relation::ToOne(link) => match rest {
                Some(rest) => Target {
                    path: dialect.to_path(key),
                    kind: self.linked_kind(link, rest),
                },
                None => Target {
                    path: self.schema.foreign_keys.column(self.descriptor.name(), base).to_string(),
                    kind: None,
                },
            },
            Relation::Scalar(kind) => Target {
                path: dialect.to_path(key),
                kind: Some(kind),
            },
        };

        check_path(&target.path)?;
        Ok(Some(target))
    }

    fn linked_kind(&self, link: &str, field: &str) -> Option<ScalarKind> {
        let definition = self.schema.registry.get(link)?.get(field)?;
        match definition.relation() {
            Relation::Scalar(kind) => Some(kind),
            Relation::ToOne(_) | Relation::ToMany(_) => None,
        }
    }
}

/// Rejects anything but identifier characters and path separators.
///
/// # Errors
///
/// Returns an error naming the offending path.
pub fn check_path(path: &str) -> Result<()> {
    let valid = !path.is_empty()
        && !path.starts_with('.')
        && !path.ends_with('.')
        && path.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '.');
    if !valid {
        bail!("invalid field path '{path}'");
    }
    Ok(())
}
