//! Character set handling for delimited-text templates and exports.
//!
//! Templates saved by spreadsheet programs arrive in whatever code page the
//! saving machine used, and exported text must open correctly (CJK included)
//! in the same programs, which expect a UTF-8 byte order mark.

use encoding_rs::Encoding;
use encoding_rs::UTF_8;
use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// UTF-8 byte order mark
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Windows code page of UTF-8
pub const CODE_PAGE_UTF8: u16 = 65001;

#[derive(Error, Debug)]
pub enum TextError {
    #[error("Unknown code page '{0}'")]
    CodePageError(u16),

    #[error("Invalid text encoding '{0}', expected 'utf-8-bom', 'utf-8' or a code page like 'cp932'")]
    TextEncodingNameError(String),

    #[error("Malformed {0} byte sequence")]
    MalformedTextError(&'static str),

    #[error("Character '{character}' cannot be represented in {encoding}")]
    UnmappableCharacterError { encoding: &'static str, character: char },

    #[error("{0} cannot be used as an output encoding")]
    OutputEncodingError(&'static str),
}

/// Resolves a Windows code page number to an encoding.
pub fn encoding_for_code_page(code_page: u16) -> Result<&'static Encoding, TextError> {
    codepage::to_encoding(code_page).ok_or(TextError::CodePageError(code_page))
}

/// Decodes template bytes into text.
///
/// A byte order mark (UTF-8, UTF-16LE or UTF-16BE) wins over `fallback` and is stripped.
/// Malformed sequences are an error rather than replacement characters,
/// since a silently garbled template would be copied into every document.
pub fn decode(bytes: &[u8], fallback: &'static Encoding) -> Result<String, TextError> {
    let (encoding, bom_length) = Encoding::for_bom(bytes).unwrap_or((fallback, 0));
    encoding
        .decode_without_bom_handling_and_without_replacement(&bytes[bom_length..])
        .map(|text| text.into_owned())
        .ok_or(TextError::MalformedTextError(encoding.name()))
}

/// Output encoding for delimited-text exports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TextEncoding {
    /// UTF-8 prefixed with a byte order mark
    #[default]
    Utf8Bom,
    /// UTF-8 without byte order mark
    Utf8,
    /// Legacy Windows code page (e.g. 932 for Shift_JIS)
    CodePage(u16),
}

impl TextEncoding {
    /// Encodes `text` into bytes of this encoding.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, TextError> {
        match self {
            Self::Utf8Bom => {
                let mut bytes = Vec::with_capacity(UTF8_BOM.len() + text.len());
                bytes.extend_from_slice(UTF8_BOM);
                bytes.extend_from_slice(text.as_bytes());
                Ok(bytes)
            }
            Self::Utf8 => Ok(text.as_bytes().to_vec()),
            Self::CodePage(code_page) => {
                let encoding = encoding_for_code_page(*code_page)?;
                if encoding == UTF_8 {
                    return Ok(text.as_bytes().to_vec());
                }
                // encoding_rs substitutes UTF-8 for encoders it does not have (UTF-16, replacement)
                if encoding.output_encoding() != encoding {
                    Err(TextError::OutputEncodingError(encoding.name()))?
                }
                let (bytes, _, had_errors) = encoding.encode(text);
                if had_errors {
                    let character = first_unmappable(text, encoding).unwrap_or('\u{FFFD}');
                    Err(TextError::UnmappableCharacterError { encoding: encoding.name(), character })?
                }
                Ok(bytes.into_owned())
            }
        }
    }
}

fn first_unmappable(text: &str, encoding: &'static Encoding) -> Option<char> {
    let mut buffer = [0u8; 4];
    text.chars()
        .find(|character| encoding.encode(character.encode_utf8(&mut buffer)).2)
}

impl FromStr for TextEncoding {
    type Err = TextError;

    /// Parses "utf-8-bom" (alias "utf-8-sig"), "utf-8", "cp932" or a bare code page number.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "utf-8-bom" | "utf-8-sig" | "utf8-bom" => Ok(Self::Utf8Bom),
            "utf-8" | "utf8" => Ok(Self::Utf8),
            _ => {
                let digits = normalized.strip_prefix("cp").unwrap_or(&normalized);
                let code_page = digits
                    .parse::<u16>()
                    .map_err(|_| TextError::TextEncodingNameError(name.to_owned()))?;
                encoding_for_code_page(code_page)?;
                Ok(Self::CodePage(code_page))
            }
        }
    }
}

impl TryFrom<String> for TextEncoding {
    type Error = TextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TextEncoding> for String {
    fn from(value: TextEncoding) -> Self {
        value.to_string()
    }
}

impl Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Utf8Bom => write!(f, "utf-8-bom"),
            Self::Utf8 => write!(f, "utf-8"),
            Self::CodePage(code_page) => write!(f, "cp{code_page}"),
        }
    }
}
