//! Error types.
//!
//! Two failure domains are kept apart. [`ConfigError`] happens while resources
//! are being declared and is meant to stop the process before it serves a
//! single request. [`DispatchError`] happens inside one request and is always
//! turned into a `500` response; it only reaches the process as
//! [`Error::Escalated`] when the operation opted in with `catch_fire`.

use crate::coerce::ParamKind;
use crate::media::MediaType;

/// The error type returned by restive's fallible top-level operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    /// A `catch_fire` operation failed. The client already got its 500.
    #[error("escalated from {operation}: {source}")]
    Escalated {
        operation: String,
        #[source]
        source: DispatchError,
    },
}

/// A resource declaration that cannot be served.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("the media type used does not exist: `{value}` on {operation}")]
    UnknownMediaType { operation: String, value: String },

    #[error("malformed path template `{template}`: {reason}")]
    MalformedTemplate { template: String, reason: String },

    #[error("{operation}: {reason}")]
    ParamMismatch { operation: String, reason: String },

    #[error("route `{pattern}` of resource `{resource}`: {source}")]
    RouteConflict {
        pattern: String,
        resource: String,
        #[source]
        source: matchit::InsertError,
    },
}

impl ConfigError {
    pub(crate) fn template(template: &str, reason: impl Into<String>) -> Self {
        Self::MalformedTemplate { template: template.to_owned(), reason: reason.into() }
    }
}

/// A raw wire value that cannot be read as its declared parameter kind.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("cannot convert `{value}` to {kind}: {reason}")]
pub struct ConversionError {
    pub value: String,
    pub kind: ParamKind,
    pub reason: String,
}

/// Boxed error a handler may fail with.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A failure inside one request, after an operation was selected.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("expected {expected} arguments, the request provided {found}")]
    ArgumentCount { expected: usize, found: usize },

    #[error("response is not {} document", display_media(.produces))]
    Serialization { produces: Option<MediaType> },

    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Handler(BoxError),
}

fn display_media(m: &Option<MediaType>) -> &'static str {
    m.map_or("None", MediaType::as_str)
}
