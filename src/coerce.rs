//! Wire-string to typed-argument conversion.
//!
//! Every path segment and query argument arrives as text. Each operation
//! declares a [`ParamKind`] per handler parameter and [`convert`] turns the
//! text into a [`Value`] of that kind. Absent arguments never reach
//! [`convert`]; the dispatcher passes [`Value::Null`] straight through.

use std::fmt;

use serde::Serialize;

use crate::error::ConversionError;

/// Declared kind of a handler parameter.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ParamKind {
    #[default]
    Text,
    Integer,
    /// Same range as [`ParamKind::Integer`]; kept so declarations can say what
    /// they mean.
    Long,
    Float,
    Boolean,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text    => "text",
            Self::Integer => "integer",
            Self::Long    => "long integer",
            Self::Float   => "float",
            Self::Boolean => "boolean",
        })
    }
}

/// A coerced handler argument.
///
/// Serializes untagged, so it drops straight into `serde_json::json!`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Integer(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Float(n) => Some(n),
            Self::Integer(n) => Some(n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Boolean(b) => Some(b),
            _ => None,
        }
    }

    /// Brings a value to `kind`.
    ///
    /// A value that already has the kind comes back untouched, text goes
    /// through [`convert`], and null stays null.
    pub fn coerce(self, kind: ParamKind) -> Result<Value, ConversionError> {
        match (self, kind) {
            (Self::Null, _) => Ok(Self::Null),
            (Self::Text(raw), kind) => convert(&raw, kind),
            (v @ Self::Integer(_), ParamKind::Integer | ParamKind::Long) => Ok(v),
            (v @ Self::Float(_), ParamKind::Float) => Ok(v),
            (v @ Self::Boolean(_), ParamKind::Boolean) => Ok(v),
            (other, kind) => Err(ConversionError {
                value: format!("{other:?}"),
                kind,
                reason: "value already has another type".into(),
            }),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Converts one raw wire value to `kind`.
///
/// Text is returned unchanged, boolean literals included. Booleans accept
/// exactly `true` / `false` in any letter case; anything else is an error.
pub fn convert(raw: &str, kind: ParamKind) -> Result<Value, ConversionError> {
    let fail = |reason: String| ConversionError { value: raw.to_owned(), kind, reason };

    match kind {
        ParamKind::Text => Ok(Value::Text(raw.to_owned())),
        ParamKind::Integer | ParamKind::Long => raw
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|e| fail(e.to_string())),
        ParamKind::Float => raw
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| fail(e.to_string())),
        ParamKind::Boolean => match raw.to_ascii_uppercase().as_str() {
            "TRUE" => Ok(Value::Boolean(true)),
            "FALSE" => Ok(Value::Boolean(false)),
            _ => Err(fail("expected `true` or `false`".into())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_returned_unchanged() {
        assert_eq!(convert("Main St", ParamKind::Text), Ok(Value::from("Main St")));
        assert_eq!(convert("TRUE", ParamKind::Text), Ok(Value::from("TRUE")));
        assert_eq!(convert("", ParamKind::Text), Ok(Value::from("")));
    }

    #[test]
    fn integers_parse_base_ten() {
        assert_eq!(convert("42", ParamKind::Integer), Ok(Value::Integer(42)));
        assert_eq!(convert("-7", ParamKind::Long), Ok(Value::Integer(-7)));

        let err = convert("4x2", ParamKind::Integer).unwrap_err();
        assert_eq!(err.value, "4x2");
        assert_eq!(err.kind, ParamKind::Integer);
        assert!(convert("0x10", ParamKind::Long).is_err());
    }

    #[test]
    fn floats_parse_ieee() {
        assert_eq!(convert("2.5", ParamKind::Float), Ok(Value::Float(2.5)));
        assert_eq!(convert("3", ParamKind::Float), Ok(Value::Float(3.0)));
        assert!(convert("two", ParamKind::Float).is_err());
    }

    #[test]
    fn booleans_accept_literals_in_any_case() {
        assert_eq!(convert("TRUE", ParamKind::Boolean), Ok(Value::Boolean(true)));
        assert_eq!(convert("true", ParamKind::Boolean), Ok(Value::Boolean(true)));
        assert_eq!(convert("False", ParamKind::Boolean), Ok(Value::Boolean(false)));
    }

    #[test]
    fn booleans_reject_anything_else() {
        for raw in ["7", "1", "yes", "", " true"] {
            let err = convert(raw, ParamKind::Boolean).unwrap_err();
            assert_eq!(err.kind, ParamKind::Boolean, "{raw}");
        }
    }

    #[test]
    fn coercing_a_native_value_is_a_no_op() {
        assert_eq!(Value::Integer(9).coerce(ParamKind::Integer), Ok(Value::Integer(9)));
        assert_eq!(Value::Integer(9).coerce(ParamKind::Long), Ok(Value::Integer(9)));
        assert_eq!(Value::Float(1.5).coerce(ParamKind::Float), Ok(Value::Float(1.5)));
        assert_eq!(Value::Boolean(false).coerce(ParamKind::Boolean), Ok(Value::Boolean(false)));
        assert_eq!(Value::from("x").coerce(ParamKind::Text), Ok(Value::from("x")));
        assert_eq!(Value::Null.coerce(ParamKind::Float), Ok(Value::Null));
    }

    #[test]
    fn coercing_text_converts() {
        assert_eq!(Value::from("12").coerce(ParamKind::Integer), Ok(Value::Integer(12)));
        assert!(Value::Boolean(true).coerce(ParamKind::Integer).is_err());
    }

    #[test]
    fn values_serialize_untagged() {
        let json = serde_json::to_string(&[
            Value::Null,
            Value::from("a"),
            Value::Integer(1),
            Value::Boolean(true),
        ])
        .unwrap();
        assert_eq!(json, r#"[null,"a",1,true]"#);
    }
}
