use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};

use crate::query::{PRIMARY_KEY, Schema};
use crate::schema::{Relation, ScalarKind, TypeDescriptor};
use crate::value::{Id, Value, format_date, format_instant, parse_date, parse_instant};

/// A record as returned by, or sent to, the remote API.
pub type ExternalRecord = serde_json::Map<String, serde_json::Value>;

/// Canonical record: an optional identifier and typed field values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// Identifier assigned by the remote API.
    pub id: Option<Id>,
    /// Field values by field name.
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    /// Creates an empty record without an identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the record identifier.
    #[must_use]
    pub fn id(mut self, id: impl Into<Id>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets a field value.
    #[must_use]
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Returns a field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// Converts records of one type between their canonical and external shapes.
pub struct RecordMapper<'a> {
    schema: &'a Schema,
    descriptor: &'a TypeDescriptor,
}

impl<'a> RecordMapper<'a> {
    /// Creates a mapper for a registered record type.
    ///
    /// # Errors
    ///
    /// Returns an error if the record type is not registered.
    pub fn new(schema: &'a Schema, type_name: &str) -> Result<Self> {
        let descriptor = schema.registry.require(type_name)?;
        Ok(Self { schema, descriptor })
    }

    /// Maps a canonical record to the external shape written by create and
    /// update.
    ///
    /// To-many relationships are not writable and are left out, to-one
    /// relationships are written to their storage column, and temporal fields
    /// are formatted for the remote API. Undeclared fields are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if a temporal field holds a value that cannot be read
    /// as its kind.
    pub fn inbound(&self, record: &Record) -> Result<ExternalRecord> {
        let mut external = ExternalRecord::new();
        if let Some(id) = &record.id {
            external.insert(PRIMARY_KEY.to_string(), id.to_json());
        }

        for (name, definition) in self.descriptor.fields() {
            let Some(value) = record.fields.get(name) else {
                continue;
            };

            match definition.relation() {
                Relation::ToMany(_) => {}
                Relation::ToOne(_) => {
                    let column = self.schema.foreign_keys.column(self.descriptor.name(), name);
                    external.insert(column.to_string(), value.to_json());
                }
                Relation::Scalar(kind) => {
                    let raw = to_external(kind, value).with_context(|| format!("field '{name}'"))?;
                    external.insert(name.to_string(), raw);
                }
            }
        }

        Ok(external)
    }

    /// Maps an external record to its canonical shape.
    ///
    /// A value that cannot be read as its declared kind is copied through as
    /// it is and logged, so one bad cell never drops the record.
    #[must_use]
    pub fn outbound(&self, raw: &ExternalRecord) -> Record {
        let id = raw
            .get("id")
            .and_then(Id::from_json)
            .or_else(|| raw.get(PRIMARY_KEY).and_then(Id::from_json));
        let mut fields = BTreeMap::new();

        for (name, definition) in self.descriptor.fields() {
            let value = match definition.relation() {
                Relation::ToMany(_) => Some(Value::Links(linked_ids(raw.get(name)))),
                Relation::ToOne(_) => self
                    .schema
                    .foreign_keys
                    .resolve(self.descriptor.name(), name)
                    .and_then(|column| raw.get(column))
                    .and_then(Id::from_json)
                    .map(Value::Link),
                Relation::Scalar(kind) => raw.get(name).map(|field| {
                    from_external(kind, field).unwrap_or_else(|err| {
                        tracing::warn!(
                            record_type = self.descriptor.name(),
                            field = name,
                            error = %err,
                            "copying uncoercible value"
                        );
                        plain(field)
                    })
                }),
            };

            if let Some(value) = value {
                fields.insert(name.to_string(), value);
            }
        }

        Record { id, fields }
    }
}

fn to_external(kind: ScalarKind, value: &Value) -> Result<serde_json::Value> {
    if *value == Value::Null {
        return Ok(serde_json::Value::Null);
    }

    let raw = match kind {
        ScalarKind::Instant => serde_json::Value::String(format_instant(&value.as_instant()?)),
        ScalarKind::CalendarDate => serde_json::Value::String(format_date(value.as_date()?)),
        ScalarKind::String | ScalarKind::Number | ScalarKind::Boolean | ScalarKind::Opaque => {
            value.to_json()
        }
    };
    Ok(raw)
}

fn from_external(kind: ScalarKind, raw: &serde_json::Value) -> Result<Value> {
    let value = match kind {
        ScalarKind::Instant if truthy(raw) => Value::Instant(as_instant(raw)?),
        ScalarKind::Boolean if !raw.is_null() => Value::Bool(as_bool(raw)),
        ScalarKind::Number if truthy(raw) => Value::Number(as_f64(raw)?),
        ScalarKind::CalendarDate => match raw.as_str().map(parse_date) {
            Some(Ok(date)) => Value::Date(date),
            _ => plain(raw),
        },
        ScalarKind::Opaque => Value::Opaque(raw.clone()),
        ScalarKind::Instant | ScalarKind::Boolean | ScalarKind::Number | ScalarKind::String => plain(raw),
    };
    Ok(value)
}

fn linked_ids(raw: Option<&serde_json::Value>) -> Vec<Id> {
    let Some(related) = raw else {
        return Vec::new();
    };
    if !related.get("totalSize").is_some_and(truthy) {
        return Vec::new();
    }

    related
        .get("records")
        .and_then(serde_json::Value::as_array)
        .map(|records| {
            records
                .iter()
                .filter_map(|record| record.get(PRIMARY_KEY).or_else(|| record.get("id")))
                .filter_map(Id::from_json)
                .collect()
        })
        .unwrap_or_default()
}

/// Copies a raw value into the closest canonical variant.
fn plain(raw: &serde_json::Value) -> Value {
    match raw {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => n.as_f64().map_or_else(|| Value::Opaque(raw.clone()), Value::Number),
        serde_json::Value::String(s) => Value::Text(s.clone()),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => Value::Opaque(raw.clone()),
    }
}

fn truthy(raw: &serde_json::Value) -> bool {
    match raw {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n.abs() > 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

fn as_instant(raw: &serde_json::Value) -> Result<DateTime<Utc>> {
    match raw {
        serde_json::Value::String(text) => parse_instant(text),
        serde_json::Value::Number(millis) => millis
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(|| anyhow!("epoch milliseconds out of range: {millis}")),
        _ => bail!("expected timestamp text or epoch milliseconds"),
    }
}

fn as_bool(raw: &serde_json::Value) -> bool {
    match raw {
        serde_json::Value::String(text) => match text.to_ascii_lowercase().as_str() {
            "true" => true,
            "false" => false,
            _ => !text.is_empty(),
        },
        _ => truthy(raw),
    }
}

fn as_f64(raw: &serde_json::Value) -> Result<f64> {
    match raw {
        serde_json::Value::Number(n) => n.as_f64().ok_or_else(|| anyhow!("number out of range: {n}")),
        serde_json::Value::String(text) => {
            text.trim().parse().with_context(|| format!("expected numeric text, found '{text}'"))
        }
        serde_json::Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        _ => bail!("expected number"),
    }
}
