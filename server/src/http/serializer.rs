use bytes::{BufMut, Bytes, BytesMut};

use crate::error::CompressionError;

use super::{
    encoding,
    response::{CONTENT_ENCODING, CONTENT_LENGTH},
    Response, HTTP_VERSION, LINE_DELIMITER,
};

type Compressor = fn(&[u8]) -> Result<Vec<u8>, CompressionError>;

#[cfg(test)]
pub fn serialize(response: Response) -> Bytes {
    let mut dst = BytesMut::new();
    write_response(response, &mut dst);

    dst.freeze()
}

/// Writes the wire form of `response` into `dst`.
///
/// A body marked with `Content-Encoding: gzip` is compressed first and its
/// `Content-Length` replaced with the compressed size. When compression fails
/// the marker is dropped and the body goes out as is.
pub fn write_response(response: Response, dst: &mut BytesMut) {
    write_response_with(response, dst, encoding::gzip)
}

fn write_response_with(response: Response, dst: &mut BytesMut, compress: Compressor) {
    let (status, mut headers, mut body) = response.into_parts();

    if headers.get(CONTENT_ENCODING) == Some(encoding::GZIP) {
        match compress(&body) {
            Ok(compressed) => {
                headers.insert(CONTENT_LENGTH, compressed.len().to_string());
                body = Bytes::from(compressed);
            }
            Err(err) => {
                tracing::warn!(%err, "sending uncompressed body");
                headers.remove(CONTENT_ENCODING);
            }
        }
    }

    let status_code = status.as_u16().to_string();
    dst.reserve(HTTP_VERSION.len() + status.reason().len() + body.len() + 64);

    // status line = "HTTP/1.1 CODE REASON\r\n"
    dst.put_slice(HTTP_VERSION.as_bytes());
    dst.put_u8(b' ');
    dst.put_slice(status_code.as_bytes());
    dst.put_u8(b' ');
    dst.put_slice(status.reason().as_bytes());
    dst.put_slice(LINE_DELIMITER);

    for (name, value) in headers.iter() {
        dst.put_slice(name.as_bytes());
        dst.put_slice(b": ");
        dst.put_slice(value.as_bytes());
        dst.put_slice(LINE_DELIMITER);
    }

    dst.put_slice(LINE_DELIMITER);
    dst.put_slice(&body);
}
