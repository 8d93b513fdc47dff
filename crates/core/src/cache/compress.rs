//! Gzip codec for stored page payloads.

use crate::Error;
use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use std::io::{Read, Write};

/// Gzip the UTF-8 bytes of a string.
pub fn compress(text: &str) -> Result<Vec<u8>, Error> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(text.as_bytes())
        .map_err(|e| Error::CacheIo(format!("compress: {e}")))?;
    encoder.finish().map_err(|e| Error::CacheIo(format!("compress: {e}")))
}

/// Inverse of [`compress`]. Fails on corrupt gzip data or non-UTF-8 content.
pub fn decompress(bytes: &[u8]) -> Result<String, Error> {
    let mut decoder = GzDecoder::new(bytes);
    let mut text = String::new();
    decoder
        .read_to_string(&mut text)
        .map_err(|e| Error::CacheIo(format!("decompress: {e}")))?;
    Ok(text)
}
