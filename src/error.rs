use thiserror::Error;

/// Errors raised while decoding archives, levels and pictures.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("bad {format} signature: {found:?}")]
    BadMagic { format: &'static str, found: [u8; 4] },

    #[error("unexpected end of data at offset {offset} (needed {needed} more bytes)")]
    Truncated { offset: usize, needed: usize },

    #[error("could not decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },

    #[error("moving wall starting at ({start_x},{start_y}) leaves the map at ({x},{y})")]
    UnboundedPath { start_x: usize, start_y: usize, x: i32, y: i32 },

    #[error("texture name {0:?} is longer than 16 bytes")]
    InvalidName(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Png(#[from] png::EncodingError),
}

impl ConvertError {
    pub fn decode(what: &'static str, reason: impl Into<String>) -> Self {
        ConvertError::Decode { what, reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
