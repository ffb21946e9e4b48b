use std::fmt::{self, Display};

use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::ScalarKind;

/// Record identifier, as assigned by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// Numeric identifier.
    Number(i64),
    /// Textual identifier (the usual case).
    Text(String),
}

impl Id {
    /// Reads an identifier from a raw JSON value.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(id) => Some(Self::Text(id.clone())),
            serde_json::Value::Number(id) => id.as_i64().map(Self::Number),
            _ => None,
        }
    }

    /// Raw JSON representation of the identifier.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Number(id) => serde_json::Value::from(*id),
            Self::Text(id) => serde_json::Value::from(id.as_str()),
        }
    }

    /// Quoted query literal for the identifier.
    #[must_use]
    pub fn to_literal(&self) -> String {
        quote(&self.to_string())
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<&str> for Id {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

impl From<String> for Id {
    fn from(id: String) -> Self {
        Self::Text(id)
    }
}

impl From<i64> for Id {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

/// Canonical field value.
///
/// Query option values and canonical record fields both use this type, so
/// literal formatting and record coercion share one closed set of variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Number.
    Number(f64),
    /// Text.
    Text(String),
    /// Exact point in time.
    Instant(DateTime<Utc>),
    /// Calendar date without a time of day.
    Date(NaiveDate),
    /// Reference to a single linked record.
    Link(Id),
    /// Ordered references to linked records.
    Links(Vec<Id>),
    /// Uninterpreted JSON.
    Opaque(serde_json::Value),
}

impl Value {
    /// Raw JSON representation, as sent to the remote API.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => number_to_json(*n),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Instant(dt) => serde_json::Value::String(format_instant(dt)),
            Self::Date(date) => serde_json::Value::String(format_date(*date)),
            Self::Link(id) => id.to_json(),
            Self::Links(ids) => serde_json::Value::Array(ids.iter().map(Id::to_json).collect()),
            Self::Opaque(raw) => raw.clone(),
        }
    }

    /// Query-language literal for the value, formatted by its own variant.
    ///
    /// # Errors
    ///
    /// Returns an error for values with no scalar literal form (collections,
    /// non-finite numbers, structured JSON).
    pub fn to_literal(&self) -> Result<String> {
        let literal = match self {
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n)?,
            Self::Text(s) => quote(s),
            Self::Instant(dt) => format_instant(dt),
            Self::Date(date) => format_date(*date),
            Self::Link(id) => id.to_literal(),
            Self::Links(_) => bail!("a collection of links has no literal form"),
            Self::Opaque(raw) => match raw {
                serde_json::Value::Null => "null".to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::String(s) => quote(s),
                _ => bail!("structured values have no literal form"),
            },
        };
        Ok(literal)
    }

    /// Query-language literal for the value, formatted for a field of the
    /// given kind. Temporal kinds reformat whatever temporal value they are
    /// given; other kinds defer to [`Value::to_literal`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be read as the field's kind.
    pub fn to_literal_as(&self, kind: ScalarKind) -> Result<String> {
        match kind {
            ScalarKind::Instant => Ok(format_instant(&self.as_instant()?)),
            ScalarKind::CalendarDate => Ok(format_date(self.as_date()?)),
            ScalarKind::String
            | ScalarKind::Number
            | ScalarKind::Boolean
            | ScalarKind::Opaque => self.to_literal(),
        }
    }

    /// Reads the value as an instant.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not temporal or temporal text.
    pub fn as_instant(&self) -> Result<DateTime<Utc>> {
        match self {
            Self::Instant(dt) => Ok(*dt),
            Self::Date(date) => Ok(date.and_time(chrono::NaiveTime::MIN).and_utc()),
            Self::Text(raw) => parse_instant(raw),
            Self::Opaque(serde_json::Value::String(raw)) => parse_instant(raw),
            _ => bail!("expected instant value"),
        }
    }

    /// Reads the value as a calendar date. Instants keep their UTC date.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not temporal or temporal text.
    pub fn as_date(&self) -> Result<NaiveDate> {
        match self {
            Self::Date(date) => Ok(*date),
            Self::Instant(dt) => Ok(dt.date_naive()),
            Self::Text(raw) => parse_date(raw),
            Self::Opaque(serde_json::Value::String(raw)) => parse_date(raw),
            _ => bail!("expected calendar date value"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Instant(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<Id> for Value {
    fn from(value: Id) -> Self {
        Self::Link(value)
    }
}

impl From<Vec<Id>> for Value {
    fn from(value: Vec<Id>) -> Self {
        Self::Links(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Formats a calendar date as zero-padded `YYYY-MM-DD`.
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Formats an instant as an ISO-8601 timestamp with millisecond precision.
#[must_use]
pub fn format_instant(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses the timestamp shapes the remote API emits or accepts.
///
/// # Errors
///
/// Returns an error if the text is not a recognised timestamp.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    // `2024-03-07T10:00:00.000+0000`
    if let Ok(parsed) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(parsed.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }

    bail!("unsupported timestamp: {raw}; expected RFC3339 or \"%Y-%m-%dT%H:%M:%S%.f%z\" format")
}

/// Parses a calendar date, accepting full timestamps by taking their UTC date.
///
/// # Errors
///
/// Returns an error if the text is neither a date nor a timestamp.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_e| parse_instant(raw).map(|dt| dt.date_naive()))
        .map_err(|_e| anyhow!("unsupported date: {raw}; expected \"%Y-%m-%d\" format"))
}

/// Escapes text for use inside a single-quoted literal.
#[must_use]
pub fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '\u{8}' => escaped.push_str("\\b"),
            '\u{c}' => escaped.push_str("\\f"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Escapes text for use inside a `LIKE` pattern, so wildcards match literally.
#[must_use]
pub fn escape_like(raw: &str) -> String {
    escape(raw).replace('%', "\\%").replace('_', "\\_")
}

fn quote(raw: &str) -> String {
    format!("'{}'", escape(raw))
}

fn format_number(n: f64) -> Result<String> {
    if !n.is_finite() {
        bail!("non-finite number {n} has no literal form");
    }
    Ok(n.to_string())
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
}
