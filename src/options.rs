//! Build configuration
//!
//! Everything that is fixed for the lifetime of one conversion: the comment
//! embedded in the trailer and the text encoding used for labels.

use crate::error::{GeoDatError, Result};
use std::fmt;
use std::str::FromStr;

/// Text encoding for region, city, postal code and ASN labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// UTF-8 (no conversion)
    #[default]
    Utf8,
    /// ISO-8859-1; characters above U+00FF become `?`
    Latin1,
}

impl TextEncoding {
    /// Encode `text`, replacing unrepresentable characters with `?`
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
            TextEncoding::Latin1 => {
                let mut replaced = false;
                let bytes = text
                    .chars()
                    .map(|c| match u8::try_from(u32::from(c)) {
                        Ok(b) => b,
                        Err(_) => {
                            replaced = true;
                            b'?'
                        }
                    })
                    .collect();
                if replaced {
                    tracing::warn!(text, encoding = %self, "cannot encode text, replacing characters");
                }
                bytes
            }
        }
    }
}

impl FromStr for TextEncoding {
    type Err = GeoDatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" => Ok(TextEncoding::Latin1),
            _ => Err(GeoDatError::UnsupportedEncoding(s.to_string())),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::Utf8 => f.write_str("utf-8"),
            TextEncoding::Latin1 => f.write_str("latin-1"),
        }
    }
}

/// Options shared by the record encoders and the serializer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Free text written to the trailer (ASCII only)
    pub comment: String,
    /// Encoding of text fields in records
    pub encoding: TextEncoding,
}

impl BuildOptions {
    /// Create options with an empty comment and UTF-8 text
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the trailer comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Set the text encoding
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Check the options before any record is built
    pub fn validate(&self) -> Result<()> {
        if !self.comment.is_ascii() {
            return Err(GeoDatError::InvalidComment(self.comment.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_encoding() {
        assert_eq!("UTF-8".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8);
        assert_eq!("iso_8859_1".parse::<TextEncoding>().unwrap(), TextEncoding::Latin1);
        assert!("ebcdic".parse::<TextEncoding>().is_err());
    }

    #[test]
    fn test_latin1_encoding() {
        assert_eq!(TextEncoding::Latin1.encode("Zürich"), b"Z\xfcrich".to_vec());
        assert_eq!(TextEncoding::Latin1.encode("東京"), b"??".to_vec());
        assert_eq!(TextEncoding::Utf8.encode("Zürich"), "Zürich".as_bytes().to_vec());
    }

    #[test]
    fn test_comment_must_be_ascii() {
        assert!(BuildOptions::new().with_comment("plain").validate().is_ok());
        assert!(BuildOptions::new().with_comment("café").validate().is_err());
    }
}
