//! Stream-to-string capture
//!
//! Drains a byte stream to end-of-data and decodes it with a named text
//! encoding. Nothing is returned until the stream has ended.

use crate::error::{RelayError, RelayResult};
use std::fmt;
use std::io::Read;
use std::str::FromStr;

/// Text encodings understood by [`capture`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// UTF-8; invalid sequences become U+FFFD
    #[default]
    Utf8,
    /// ISO-8859-1, one byte per character
    Latin1,
}

impl FromStr for TextEncoding {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "latin1" | "iso-8859-1" | "binary" => Ok(Self::Latin1),
            _ => Err(RelayError::UnsupportedEncoding(s.to_string())),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8 => f.write_str("utf-8"),
            Self::Latin1 => f.write_str("latin1"),
        }
    }
}

/// Read `input` to the end and decode it as a single string.
///
/// Bytes are buffered before decoding so multi-byte characters split across
/// reads are decoded intact. A read error at any point fails the whole
/// capture; nothing is retried.
pub fn capture<R: Read>(mut input: R, encoding: TextEncoding) -> RelayResult<String> {
    let mut buffer = Vec::new();
    input
        .read_to_end(&mut buffer)
        .map_err(|source| RelayError::Stream { source })?;

    let text = match encoding {
        TextEncoding::Utf8 => match String::from_utf8(buffer) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        },
        TextEncoding::Latin1 => buffer.iter().map(|&b| char::from(b)).collect(),
    };

    Ok(text)
}
