//! Game-record format codecs
//!
//! Every decoder produces an [`Instance`] and finishes with a
//! reconciliation pass, so the returned game carries resolved seats, both
//! notations, captured pieces and tree statistics regardless of which of
//! those the source format stored.

use rxiangqi_core::{CoreError, Instance};

pub mod bin;
pub mod cc;
pub mod json;
pub mod text;
pub mod xqf;

mod bytes;

/// The supported serialization formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// Legacy encrypted binary (decode only)
    Xqf,
    /// Plain binary
    Bin,
    /// Nested JSON tree
    Json,
    /// Headers + movetext with coordinate moves
    TextCoord,
    /// Headers + movetext with ideographic moves
    TextZh,
    /// Tabular grid, one row per ply and one column per variation
    TextCc,
}

impl RecordFormat {
    /// Guess a format from a file extension (lowercase, without the dot)
    pub fn from_extension(ext: &str) -> Option<RecordFormat> {
        match ext {
            "xqf" => Some(RecordFormat::Xqf),
            "bin" => Some(RecordFormat::Bin),
            "json" => Some(RecordFormat::Json),
            "pgn" => Some(RecordFormat::TextZh),
            "cc" => Some(RecordFormat::TextCc),
            _ => None,
        }
    }
}

/// Errors raised while reading or writing a game record
#[derive(thiserror::Error, Debug)]
pub enum RecordError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("unexpected end of input at byte {0}")]
    UnexpectedEof(usize),

    #[error("stream does not start with the {0} magic")]
    BadMagic(&'static str),

    #[error("unsupported {0} container version {1}")]
    BadVersion(&'static str, u8),

    #[error("seat index {0} out of range")]
    BadSeat(u8),

    #[error("malformed record text: {0}")]
    Text(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("encoding {0:?} records is not supported")]
    UnsupportedEncode(RecordFormat),
}

/// Parse one game record
pub fn decode(data: &[u8], format: RecordFormat) -> Result<Instance, RecordError> {
    match format {
        RecordFormat::Xqf => xqf::decode(data),
        RecordFormat::Bin => bin::decode(data),
        RecordFormat::Json => json::decode(as_text(data)?),
        RecordFormat::TextCoord => text::decode(as_text(data)?, text::Notation::Coord),
        RecordFormat::TextZh => text::decode(as_text(data)?, text::Notation::Zh),
        RecordFormat::TextCc => cc::decode(as_text(data)?),
    }
}

/// Serialize one game record. The instance is reconciled first, so its
/// cursor ends up back at the root.
pub fn encode(instance: &mut Instance, format: RecordFormat) -> Result<Vec<u8>, RecordError> {
    instance.reconcile()?;
    match format {
        RecordFormat::Xqf => Err(RecordError::UnsupportedEncode(RecordFormat::Xqf)),
        RecordFormat::Bin => bin::encode(instance),
        RecordFormat::Json => json::encode(instance).map(String::into_bytes),
        RecordFormat::TextCoord => {
            text::encode(instance, text::Notation::Coord).map(String::into_bytes)
        }
        RecordFormat::TextZh => {
            text::encode(instance, text::Notation::Zh).map(String::into_bytes)
        }
        RecordFormat::TextCc => cc::encode(instance).map(String::into_bytes),
    }
}

fn as_text(data: &[u8]) -> Result<&str, RecordError> {
    std::str::from_utf8(data).map_err(|e| RecordError::Text(e.to_string()))
}

/// How a decoded record attaches to the tree under construction
#[derive(Debug, Clone, Copy)]
pub(crate) enum Link {
    Next,
    Other,
}
