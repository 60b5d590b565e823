use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use thiserror::Error;

use super::document::TileDataEncoding;

/// Adjusted id of a cell with no tile. The source format stores 1-based ids
/// with 0 meaning "empty", so after the −1 adjustment empty cells land here.
pub const EMPTY_TILE: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileDataError {
    #[error("invalid base64 tile payload: {message}")]
    Base64 { message: String },
    #[error("base64 tile payload is {byte_len} bytes; expected a multiple of 4")]
    TruncatedWordStream { byte_len: usize },
    #[error("invalid tile token '{token}'; expected a non-negative integer")]
    InvalidToken { token: String },
    #[error("stored tile id {value} is outside the supported id range")]
    IdOutOfRange { value: u32 },
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Decoded tile identifiers for a whole map, one per cell. Ids are zero-based
/// atlas slice indices; [`EMPTY_TILE`] marks cells without a tile. Index `i`
/// addresses cell `(i % columns, i / columns)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
    ids: Vec<i32>,
}

impl TileGrid {
    pub fn new(columns: u32, rows: u32, ids: Vec<i32>) -> Result<Self, TileDataError> {
        let expected = columns as usize * rows as usize;
        let actual = ids.len();
        if expected != actual {
            return Err(TileDataError::LengthMismatch { expected, actual });
        }
        Ok(Self { columns, rows, ids })
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn ids(&self) -> &[i32] {
        &self.ids
    }

    pub fn id_at(&self, x: u32, y: u32) -> Option<i32> {
        if x >= self.columns || y >= self.rows {
            return None;
        }
        let index = y as usize * self.columns as usize + x as usize;
        self.ids.get(index).copied()
    }
}

pub fn decode_tile_data(
    raw: &str,
    encoding: TileDataEncoding,
    columns: u32,
    rows: u32,
) -> Result<TileGrid, TileDataError> {
    let ids = match encoding {
        TileDataEncoding::Base64 => decode_base64_ids(raw)?,
        TileDataEncoding::Csv => decode_csv_ids(raw)?,
    };
    TileGrid::new(columns, rows, ids)
}

fn decode_base64_ids(raw: &str) -> Result<Vec<i32>, TileDataError> {
    // The editor may wrap the payload in whitespace; the alphabet itself
    // never contains any.
    let compact = raw
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace())
        .collect::<String>();
    let bytes = BASE64_STANDARD
        .decode(compact.as_bytes())
        .map_err(|error| TileDataError::Base64 {
            message: error.to_string(),
        })?;
    if bytes.len() % 4 != 0 {
        return Err(TileDataError::TruncatedWordStream {
            byte_len: bytes.len(),
        });
    }

    let mut ids = Vec::with_capacity(bytes.len() / 4);
    for word in bytes.chunks_exact(4) {
        let stored = u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
        ids.push(adjust_stored_id(stored)?);
    }
    Ok(ids)
}

fn decode_csv_ids(raw: &str) -> Result<Vec<i32>, TileDataError> {
    let mut ids = Vec::new();
    for run in raw.split_ascii_whitespace() {
        for token in run.split(',') {
            let token = token.trim();
            if token.is_empty() {
                // Trailing separators produce empty tokens, not zeros.
                continue;
            }
            let stored = token
                .parse::<u32>()
                .map_err(|_| TileDataError::InvalidToken {
                    token: token.to_string(),
                })?;
            ids.push(adjust_stored_id(stored)?);
        }
    }
    Ok(ids)
}

fn adjust_stored_id(stored: u32) -> Result<i32, TileDataError> {
    if stored == 0 {
        return Ok(EMPTY_TILE);
    }
    i32::try_from(stored - 1).map_err(|_| TileDataError::IdOutOfRange { value: stored })
}
