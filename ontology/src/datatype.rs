//! Literal datatypes and their lexical validators.
//!
//! Numbers must be written in canonical form. Timestamps must be UTC with
//! second precision. Versions must be SemVer 2.0.0 without a `v` prefix.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::iris;

/// `sh:pattern` used by the SPDX model for semantic versions.
pub const SEMVER_PATTERN: &str = r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-((?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*)(?:\.(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*))*))?(?:\+([0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?$";

/// `sh:pattern` used by the SPDX model for media types.
pub const MEDIA_TYPE_PATTERN: &str = r"^[^\/]+\/[^\/]+$";

/// `sh:pattern` used by the SPDX model for UTC timestamps.
pub const DATE_TIME_STAMP_PATTERN: &str = r"^\d\d\d\d-\d\d-\d\dT\d\d:\d\d:\d\dZ$";

/// The datatype of a literal class property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiteralType {
    /// `xsd:anyURI`.
    #[serde(rename = "anyURI")]
    AnyUri,
    /// `xsd:boolean`.
    #[serde(rename = "boolean")]
    Boolean,
    /// `xsd:dateTimeStamp`.
    #[serde(rename = "dateTimeStamp")]
    DateTimeStamp,
    /// `xsd:decimal`.
    #[serde(rename = "decimal")]
    Decimal,
    /// `xsd:nonNegativeInteger`.
    #[serde(rename = "nonNegativeInteger")]
    NonNegativeInteger,
    /// `xsd:positiveInteger`.
    #[serde(rename = "positiveInteger")]
    PositiveInteger,
    /// `xsd:string`.
    #[serde(rename = "string")]
    String,
    /// A string constrained by the SemVer pattern.
    SemVer,
    /// A string constrained by the media type pattern.
    MediaType,
}

impl LiteralType {
    /// All datatypes, in declaration order.
    pub const ALL: [LiteralType; 9] = [
        LiteralType::AnyUri,
        LiteralType::Boolean,
        LiteralType::DateTimeStamp,
        LiteralType::Decimal,
        LiteralType::NonNegativeInteger,
        LiteralType::PositiveInteger,
        LiteralType::String,
        LiteralType::SemVer,
        LiteralType::MediaType,
    ];

    /// Parses a datatype from its local name (the part after `#`).
    pub fn from_local_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// The local name of this datatype.
    pub fn as_str(self) -> &'static str {
        match self {
            LiteralType::AnyUri => "anyURI",
            LiteralType::Boolean => "boolean",
            LiteralType::DateTimeStamp => "dateTimeStamp",
            LiteralType::Decimal => "decimal",
            LiteralType::NonNegativeInteger => "nonNegativeInteger",
            LiteralType::PositiveInteger => "positiveInteger",
            LiteralType::String => "string",
            LiteralType::SemVer => "SemVer",
            LiteralType::MediaType => "MediaType",
        }
    }

    /// The XSD datatype IRI literals of this type are written with.
    pub fn xsd_iri(self) -> &'static str {
        match self {
            LiteralType::AnyUri => iris::XSD_ANY_URI,
            LiteralType::Boolean => iris::XSD_BOOLEAN,
            LiteralType::DateTimeStamp => iris::XSD_DATE_TIME_STAMP,
            LiteralType::Decimal => iris::XSD_DECIMAL,
            LiteralType::NonNegativeInteger => iris::XSD_NON_NEGATIVE_INTEGER,
            LiteralType::PositiveInteger => iris::XSD_POSITIVE_INTEGER,
            LiteralType::String | LiteralType::SemVer | LiteralType::MediaType => {
                iris::XSD_STRING
            }
        }
    }

    /// The value a freshly created property of this type starts with.
    pub fn default_value(self) -> Option<PropertyValue> {
        match self {
            LiteralType::Boolean => Some(PropertyValue::Bool(false)),
            _ => None,
        }
    }

    /// Converts an RDF lexical form into a property value of this type.
    ///
    /// Booleans and canonical numbers become typed values; anything else is
    /// kept as text so it can be validated (and corrected) in place.
    pub fn value_from_lexical(self, lexical: &str) -> PropertyValue {
        match self {
            LiteralType::Boolean => match lexical {
                "true" | "1" => PropertyValue::Bool(true),
                "false" | "0" => PropertyValue::Bool(false),
                _ => PropertyValue::Text(lexical.to_owned()),
            },
            LiteralType::Decimal
            | LiteralType::NonNegativeInteger
            | LiteralType::PositiveInteger => match canonical_number(lexical) {
                Some(n) => PropertyValue::Number(n),
                None => PropertyValue::Text(lexical.to_owned()),
            },
            _ => PropertyValue::Text(lexical.to_owned()),
        }
    }

    /// Returns true if `value` is a valid value of this datatype.
    ///
    /// A missing value is never valid.
    pub fn validate(self, value: Option<&PropertyValue>) -> bool {
        let Some(value) = value else {
            return false;
        };
        match (self, value) {
            (LiteralType::Boolean, PropertyValue::Bool(_)) => true,
            (LiteralType::Boolean, _) | (_, PropertyValue::Bool(_)) => false,
            (ty, v) => ty.validate_lexical(&v.lexical()),
        }
    }

    /// Applies the lexical rule of this datatype to a string.
    pub fn validate_lexical(self, v: &str) -> bool {
        match self {
            LiteralType::AnyUri => !v.is_empty() && sophia_iri::Iri::new(v).is_ok(),
            LiteralType::Boolean => v == "true" || v == "false",
            LiteralType::DateTimeStamp => is_date_time_stamp(v),
            LiteralType::Decimal => canonical_number(v).is_some(),
            LiteralType::NonNegativeInteger => {
                canonical_number(v).is_some_and(|n| n.fract() == 0.0 && n >= 0.0)
            }
            LiteralType::PositiveInteger => {
                canonical_number(v).is_some_and(|n| n.fract() == 0.0 && n > 0.0)
            }
            LiteralType::String => !v.is_empty(),
            LiteralType::SemVer => matches(semver_regex(), v),
            LiteralType::MediaType => matches(media_type_regex(), v),
        }
    }
}

impl fmt::Display for LiteralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value held by a node property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(f64),
    /// Free text, IRIs and enumeration members.
    Text(String),
}

impl PropertyValue {
    /// The string form used for validation and RDF output.
    pub fn lexical(&self) -> String {
        match self {
            PropertyValue::Bool(b) => b.to_string(),
            PropertyValue::Number(n) => n.to_string(),
            PropertyValue::Text(s) => s.clone(),
        }
    }

    /// Returns the text if this value is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lexical())
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Number(value)
    }
}

/// Parses `v` as a finite number whose shortest rendering is `v` itself
/// (after trimming). Rejects exponents, leading zeros and trailing zeros.
fn canonical_number(v: &str) -> Option<f64> {
    let trimmed = v.trim();
    let n: f64 = trimmed.parse().ok()?;
    (n.is_finite() && n.to_string() == trimmed).then_some(n)
}

fn is_date_time_stamp(v: &str) -> bool {
    matches(date_time_stamp_regex(), v)
        && chrono::NaiveDateTime::parse_from_str(v, "%Y-%m-%dT%H:%M:%SZ").is_ok()
}

fn matches(re: Option<&Regex>, v: &str) -> bool {
    re.is_some_and(|re| re.is_match(v))
}

fn semver_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(SEMVER_PATTERN).ok()).as_ref()
}

fn media_type_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(MEDIA_TYPE_PATTERN).ok()).as_ref()
}

fn date_time_stamp_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DATE_TIME_STAMP_PATTERN).ok())
        .as_ref()
}
