// src/repository/decode.rs

//! Turning a downloaded index payload into text
//!
//! Gzip is the only compression handled. The `Packages.bz2` candidate is
//! still probed, but its payload is recognised by magic bytes and reported
//! as [`DecodeError::Unsupported`] so the fetcher can move on.

use super::transport::Response;
use flate2::read::GzDecoder;
use std::io::Read;
use thiserror::Error;
use tracing::debug;

const BZIP2_MAGIC: &[u8] = b"BZh";

/// How a payload is turned into text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    Plain,
    Gzip,
}

impl DecodeMode {
    /// Gzip when the candidate path ends in `.gz` or the server says so
    pub fn select(candidate_path: &str, response: &Response) -> Self {
        if candidate_path.ends_with(".gz") || response.is_gzip_encoded() {
            DecodeMode::Gzip
        } else {
            DecodeMode::Plain
        }
    }
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to decompress gzip payload: {0}")]
    Gzip(#[from] std::io::Error),

    #[error("Unsupported compression: {0}")]
    Unsupported(&'static str),
}

/// Decompress gzip bytes into text
///
/// Invalid UTF-8 sequences in the decompressed data are replaced rather
/// than rejected.
pub fn gunzip(bytes: &[u8]) -> Result<String, DecodeError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;

    debug!(
        "Decompressed {} bytes into {} bytes",
        bytes.len(),
        decompressed.len()
    );
    Ok(String::from_utf8_lossy(&decompressed).into_owned())
}

/// Decode a payload with the given mode
pub fn decode(mode: DecodeMode, body: &[u8]) -> Result<String, DecodeError> {
    match mode {
        DecodeMode::Gzip => gunzip(body),
        DecodeMode::Plain => {
            if body.starts_with(BZIP2_MAGIC) {
                return Err(DecodeError::Unsupported("bzip2"));
            }
            Ok(String::from_utf8_lossy(body).into_owned())
        }
    }
}
