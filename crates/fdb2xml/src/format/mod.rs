//! Cell value formatting for XML text content.
//!
//! Formatting rules:
//! - NULLs: no text at all; the caller marks the element with `null="true"`
//! - Timestamps: `YYYY-MM-DD HH:MM:SS`, seconds precision, no timezone
//! - Dates / times: `YYYY-MM-DD` / `HH:MM:SS`
//! - Decimals: exact, with the stored scale
//! - Text: trailing whitespace (including the `\x1c`-`\x1f` separators) trimmed
//! - Binary: UTF-8 text when the bytes decode, base64 otherwise

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::core::SqlValue;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Transfer encoding applied to a formatted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Base64,
}

impl Encoding {
    /// Value of the `enc` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Base64 => "base64",
        }
    }
}

/// Textual form of a cell value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formatted {
    /// SQL NULL, represented structurally rather than as text.
    Null,

    /// Text content, with an optional transfer encoding.
    Text {
        text: String,
        encoding: Option<Encoding>,
    },
}

impl Formatted {
    fn plain(text: impl Into<String>) -> Self {
        Formatted::Text {
            text: text.into(),
            encoding: None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Formatted::Null)
    }

    /// Text content; empty for NULL.
    pub fn text(&self) -> &str {
        match self {
            Formatted::Null => "",
            Formatted::Text { text, .. } => text,
        }
    }

    pub fn encoding(&self) -> Option<Encoding> {
        match self {
            Formatted::Null => None,
            Formatted::Text { encoding, .. } => *encoding,
        }
    }
}

/// Format a cell value. Never fails.
pub fn format_value(value: &SqlValue) -> Formatted {
    match value {
        SqlValue::Null => Formatted::Null,
        SqlValue::Integer(v) => Formatted::plain(v.to_string()),
        SqlValue::Float(v) => Formatted::plain(format_float(*v)),
        SqlValue::Decimal(v) => Formatted::plain(v.to_string()),
        SqlValue::Date(v) => Formatted::plain(v.format(DATE_FORMAT).to_string()),
        SqlValue::Time(v) => Formatted::plain(v.format(TIME_FORMAT).to_string()),
        SqlValue::Timestamp(v) => Formatted::plain(v.format(TIMESTAMP_FORMAT).to_string()),
        SqlValue::Text(v) => Formatted::plain(trim_trailing(v)),
        SqlValue::Binary(bytes) => format_binary(bytes),
    }
}

/// Blobs holding valid UTF-8 are emitted as text; anything else as base64.
///
/// Only UTF-8 validity decides. Valid text containing control characters
/// XML 1.0 forbids (`\x00`-`\x08`, `\x0b`, `\x0c`, `\x0e`-`\x1f`) is still
/// emitted as plain text, so such a document is not well-formed XML.
pub fn format_binary(bytes: &[u8]) -> Formatted {
    match std::str::from_utf8(bytes) {
        Ok(text) => Formatted::plain(trim_trailing(text)),
        Err(_) => Formatted::Text {
            text: STANDARD.encode(bytes),
            encoding: Some(Encoding::Base64),
        },
    }
}

/// Strip trailing whitespace, counting the ASCII information separators
/// `\x1c`-`\x1f` as whitespace too.
pub fn trim_trailing(text: &str) -> &str {
    text.trim_end_matches(|c: char| c.is_whitespace() || ('\x1c'..='\x1f').contains(&c))
}

/// Shortest round-trip form; integral values keep a trailing `.0`.
fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    format!("{:?}", v)
}
