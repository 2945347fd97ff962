//! Handler return values and their serialization.
//!
//! A handler returns anything implementing [`IntoReply`]. The dispatcher then
//! encodes the [`Reply`] according to the operation's `produces` type: JSON
//! objects and arrays as JSON text, XML documents as XML text. Every other
//! pairing is a server error.

use serde::Serialize;

use crate::error::{BoxError, DispatchError};
use crate::media::MediaType;
use crate::xml::XmlDocument;

/// What a handler produced.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    /// No value. The request ends with an empty `200`.
    Empty,
    /// A JSON value. `null`, `false`, zero, and empty strings, arrays, or
    /// objects count as no value.
    Json(serde_json::Value),
    Xml(XmlDocument),
}

impl Reply {
    /// Serializes `value` into a JSON reply.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self::Json)
    }

    pub(crate) fn is_empty(&self) -> bool {
        use serde_json::Value;

        match self {
            Self::Empty => true,
            Self::Json(Value::Null | Value::Bool(false)) => true,
            Self::Json(Value::Number(n)) => n.as_f64() == Some(0.0),
            Self::Json(Value::String(s)) => s.is_empty(),
            Self::Json(Value::Array(a)) => a.is_empty(),
            Self::Json(Value::Object(o)) => o.is_empty(),
            Self::Json(Value::Bool(true)) | Self::Xml(_) => false,
        }
    }

    /// Encodes the reply as the `produces` type, returning that type with
    /// the body.
    pub(crate) fn encode(
        self,
        produces: Option<MediaType>,
    ) -> Result<(MediaType, Vec<u8>), DispatchError> {
        use serde_json::Value;

        match (produces, self) {
            (Some(MediaType::Json), Self::Json(v @ (Value::Object(_) | Value::Array(_)))) => {
                Ok((MediaType::Json, serde_json::to_vec(&v)?))
            }
            (Some(media), Self::Xml(doc)) if media.is_xml() => {
                Ok((media, doc.to_xml().into_bytes()))
            }
            (produces, _) => Err(DispatchError::Serialization { produces }),
        }
    }
}

/// Conversion of a handler's return value into a [`Reply`].
///
/// `Err` values become a `500` carrying the error's message.
pub trait IntoReply {
    fn into_reply(self) -> Result<Reply, BoxError>;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Result<Reply, BoxError> { Ok(self) }
}

impl IntoReply for () {
    fn into_reply(self) -> Result<Reply, BoxError> { Ok(Reply::Empty) }
}

impl IntoReply for serde_json::Value {
    fn into_reply(self) -> Result<Reply, BoxError> { Ok(Reply::Json(self)) }
}

impl IntoReply for XmlDocument {
    fn into_reply(self) -> Result<Reply, BoxError> { Ok(Reply::Xml(self)) }
}

impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> Result<Reply, BoxError> {
        self.map_or(Ok(Reply::Empty), IntoReply::into_reply)
    }
}

impl<T, E> IntoReply for Result<T, E>
where
    T: IntoReply,
    E: Into<BoxError>,
{
    fn into_reply(self) -> Result<Reply, BoxError> {
        self.map_err(Into::<BoxError>::into)?.into_reply()
    }
}
