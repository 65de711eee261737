use bytes::{Buf, BytesMut};
use memchr::memmem;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{RequestError, ResponseError};

use super::{
    parser::{self, parse_head},
    response::CONTENT_LENGTH,
    serializer::write_response,
    Request, Response, REQUEST_DELIMITER,
};

pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Frames one request per connection.
///
/// The head ends at the first blank line. A `Content-Length` header makes the
/// decoder wait for that many body bytes; without one, whatever follows the
/// blank line in the buffer is the body.
pub struct ConnectionCodec {
    req: Option<(Request, usize)>,
    max_body_bytes: usize,
}

impl Default for ConnectionCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BODY_BYTES)
    }
}

impl ConnectionCodec {
    pub fn new(max_body_bytes: usize) -> Self {
        Self {
            req: None,
            max_body_bytes,
        }
    }

    /// Treats the buffered bytes as the whole message, for when the peer
    /// stopped sending without completing a frame.
    pub fn finish(&mut self, src: &mut BytesMut) -> Result<Option<Request>, RequestError> {
        if let Some((req, len)) = self.req.take() {
            tracing::debug!(expected = len, received = src.len(), "body ended early");
            return Ok(Some(req.with_body(src.split().freeze())));
        }

        if src.is_empty() {
            return Ok(None);
        }

        let req = parser::parse(&src.split())?;
        Ok(Some(req))
    }
}

impl Decoder for ConnectionCodec {
    type Item = Request;

    type Error = RequestError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let (req, len) = match self.req.take() {
            Some(req) => req,
            None => {
                let Some(position) = memmem::find(&src[..], REQUEST_DELIMITER) else {
                    return Ok(None);
                };

                let head = src.split_to(position);
                src.advance(REQUEST_DELIMITER.len());
                let req = parse_head(&head, Default::default())?;

                let Some(content_length) = req.headers().get_ignore_case(CONTENT_LENGTH) else {
                    return Ok(Some(req.with_body(src.split().freeze())));
                };

                let content_length = content_length.trim().parse::<usize>()?;
                if content_length > self.max_body_bytes {
                    return Err(RequestError::BodyTooLarge {
                        length: content_length,
                        limit: self.max_body_bytes,
                    });
                }

                (req, content_length)
            }
        };

        if src.len() < len {
            src.reserve(len - src.len());
            self.req = Some((req, len));
            return Ok(None);
        }

        let body = src.split_to(len).freeze();
        if !src.is_empty() {
            tracing::debug!(extra = src.len(), "discarding bytes past content-length");
            src.clear();
        }

        Ok(Some(req.with_body(body)))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(req) => Ok(Some(req)),
            None => self.finish(src),
        }
    }
}

impl Encoder<Response> for ConnectionCodec {
    type Error = ResponseError;

    fn encode(&mut self, response: Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        write_response(response, dst);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use http::Method;

    use super::*;
    use crate::{error::MalformedRequest, http::StatusCode};

    #[test]
    fn decode_without_body() {
        let mut codec = ConnectionCodec::default();
        let mut src = BytesMut::from(&b"GET /echo/abc HTTP/1.1\r\nHost: localhost\r\n\r\n"[..]);

        let req = codec.decode(&mut src).unwrap().unwrap();
        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.target(), "/echo/abc");
        assert!(req.body().is_empty());
    }

    #[test]
    fn decode_waits_for_head() {
        let mut codec = ConnectionCodec::default();
        let mut src = BytesMut::from(&b"GET / HTTP/1.1\r\nHost: loc"[..]);

        assert!(codec.decode(&mut src).unwrap().is_none());

        src.extend_from_slice(b"alhost\r\n\r\n");
        let req = codec.decode(&mut src).unwrap().unwrap();
        assert_eq!(req.headers().get("Host"), Some("localhost"));
    }

    #[test]
    fn decode_waits_for_content_length() {
        let mut codec = ConnectionCodec::default();
        let mut src =
            BytesMut::from(&b"POST /files/x HTTP/1.1\r\ncontent-length: 10\r\n\r\n01234"[..]);

        assert!(codec.decode(&mut src).unwrap().is_none());

        src.extend_from_slice(b"56789trailing");
        let req = codec.decode(&mut src).unwrap().unwrap();
        assert_eq!(req.body().as_ref(), b"0123456789");
        assert!(src.is_empty());
    }

    #[test]
    fn invalid_content_length() {
        let mut codec = ConnectionCodec::default();
        let mut src = BytesMut::from(&b"POST /files/x HTTP/1.1\r\nContent-Length: ten\r\n\r\n"[..]);

        assert!(matches!(
            codec.decode(&mut src),
            Err(RequestError::InvalidContentLength)
        ));
    }

    #[test]
    fn content_length_over_limit() {
        #[rustfmt::skip]
        let cases = [
            ("18446744073709551615", true),
            ("1025",                 true),
            ("1024",                 false),
        ];

        for (length, rejected) in cases {
            let mut codec = ConnectionCodec::new(1024);
            let raw = format!("POST /files/x HTTP/1.1\r\nContent-Length: {length}\r\n\r\nabc");
            let mut src = BytesMut::from(raw.as_bytes());

            match codec.decode(&mut src) {
                Err(RequestError::BodyTooLarge { length: got, limit }) => {
                    assert!(rejected, "{length}");
                    assert_eq!(got.to_string(), length);
                    assert_eq!(limit, 1024);
                }
                Ok(None) => assert!(!rejected, "{length}"),
                other => panic!("{length}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn content_length_overflowing_usize() {
        let mut codec = ConnectionCodec::default();
        let mut src = BytesMut::from(
            &b"POST /files/x HTTP/1.1\r\nContent-Length: 99999999999999999999999\r\n\r\n"[..],
        );

        assert!(matches!(
            codec.decode(&mut src),
            Err(RequestError::InvalidContentLength)
        ));
    }

    #[test]
    fn finish_with_short_body() {
        let mut codec = ConnectionCodec::default();
        let mut src = BytesMut::from(&b"POST /files/x HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc"[..]);

        assert!(codec.decode(&mut src).unwrap().is_none());
        let req = codec.finish(&mut src).unwrap().unwrap();
        assert_eq!(req.body().as_ref(), b"abc");
    }

    #[test]
    fn finish_without_delimiter_is_malformed() {
        let mut codec = ConnectionCodec::default();
        let mut src = BytesMut::from(&b"GET / HTTP/1.1\r\n"[..]);

        assert!(codec.decode(&mut src).unwrap().is_none());
        assert!(matches!(
            codec.finish(&mut src),
            Err(RequestError::Malformed(MalformedRequest::MissingDelimiter))
        ));
    }

    #[test]
    fn finish_on_empty_buffer() {
        let mut codec = ConnectionCodec::default();

        assert!(codec.finish(&mut BytesMut::new()).unwrap().is_none());
    }

    #[test]
    fn encode_response() {
        let mut codec = ConnectionCodec::default();
        let mut dst = BytesMut::new();

        codec.encode(Response::new(StatusCode::CREATED), &mut dst).unwrap();
        assert_eq!(&dst[..], b"HTTP/1.1 201 Created\r\n\r\n");
    }
}
