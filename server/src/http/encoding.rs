use std::io::Write;

use flate2::{write::GzEncoder, Compression};

use crate::error::CompressionError;

pub const GZIP: &str = "gzip";

/// Whether a comma separated `Accept-Encoding` value lists gzip.
///
/// Quality parameters are not interpreted, `gzip;q=0.5` does not count.
pub fn accepts_gzip(accept_encoding: &str) -> bool {
    accept_encoding
        .split(',')
        .map(str::trim)
        .any(|encoding| encoding == GZIP)
}

pub fn gzip(content: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(content.len() / 2), Compression::default());
    encoder.write_all(content)?;

    Ok(encoder.finish()?)
}
