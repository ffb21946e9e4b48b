//! Errors

use std::fmt::{self, Display};

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transport::SaveError;

/// Error title the remote API reports when a referenced record does not exist.
pub const INVALID_CROSS_REFERENCE_KEY: &str = "INVALID_CROSS_REFERENCE_KEY";

/// Result type used across the crate.
pub type Result<T> = anyhow::Result<T, Error>;

/// Domain level error type returned by the adapter.
#[derive(Error, Debug)]
pub enum Error {
    // --- Client errors ---
    /// Connection parameters are missing. Raised before any network call.
    #[error("configuration: {0}")]
    Configuration(String),

    /// A record to create already carries an identifier.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The remote API rejected a record.
    #[error("{0}")]
    Unprocessable(Unprocessable),

    /// Query options or record values cannot be compiled or mapped.
    #[error("bad request: {0:#}")]
    BadRequest(anyhow::Error),

    // --- Server errors ---
    /// The transport failed: login, introspection, query or batch exchange.
    #[error("transport: {0:#}")]
    Transport(anyhow::Error),
}

impl Error {
    /// Returns the HTTP status code associated with the variant.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        // an adapter error wrapped in context keeps its variant
        match err.downcast::<Self>() {
            Ok(inner) => inner,
            Err(err) => Self::Transport(err),
        }
    }
}

impl From<Unprocessable> for Error {
    fn from(err: Unprocessable) -> Self {
        Self::Unprocessable(err)
    }
}

/// A record the remote API refused to save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unprocessable {
    /// Remote status or error code, e.g. `REQUIRED_FIELD_MISSING`.
    pub title: String,
    /// Remote error message.
    pub message: String,
    /// Always 422.
    pub status: u16,
    /// Offending attribute, when the remote API names one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
}

/// Points at the attribute an error refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// `/data/attributes/<field>`
    pub pointer: String,
}

impl Display for Unprocessable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

impl From<&SaveError> for Unprocessable {
    fn from(err: &SaveError) -> Self {
        let title = err
            .status_code
            .as_deref()
            .or(err.error_code.as_deref())
            .unwrap_or("UNKNOWN_ERROR")
            .to_string();

        Self {
            title,
            message: err.message.clone(),
            status: StatusCode::UNPROCESSABLE_ENTITY.as_u16(),
            source: err.fields.first().map(|field| Source {
                pointer: format!("/data/attributes/{field}"),
            }),
        }
    }
}
