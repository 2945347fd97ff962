//! Content types an operation can declare for `produces` / `consumes`.

use std::fmt;
use std::str::FromStr;

/// A recognized REST content type.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MediaType {
    Json,    // application/json
    Xml,     // application/xml
    TextXml, // text/xml
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json    => "application/json",
            Self::Xml     => "application/xml",
            Self::TextXml => "text/xml",
        }
    }

    pub fn is_xml(self) -> bool {
        matches!(self, Self::Xml | Self::TextXml)
    }

    /// True when a request `Content-Type` header names this type.
    ///
    /// Parameters after `;` (charset, boundary) are ignored, and the
    /// comparison is ASCII case-insensitive.
    pub fn accepts(self, header: &str) -> bool {
        let essence = header.split(';').next().unwrap_or_default().trim();
        essence.eq_ignore_ascii_case(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "application/json" => Ok(Self::Json),
            "application/xml"  => Ok(Self::Xml),
            "text/xml"         => Ok(Self::TextXml),
            _                  => Err(()),
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
