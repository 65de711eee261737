use std::str::from_utf8;

use bytes::Bytes;
use http::Method;
use memchr::memmem;
use once_cell::sync::Lazy;

use crate::error::MalformedRequest;

use super::{Headers, Request, LINE_DELIMITER, REQUEST_DELIMITER};

static FINDER: Lazy<memmem::Finder> = Lazy::new(|| memmem::Finder::new(LINE_DELIMITER));

const HEADER_SEPARATOR: &str = ": ";

/// Parses a complete message: head, blank line, body.
pub fn parse(raw: &[u8]) -> Result<Request, MalformedRequest> {
    let position =
        memmem::find(raw, REQUEST_DELIMITER).ok_or(MalformedRequest::MissingDelimiter)?;

    let body = Bytes::copy_from_slice(&raw[position + REQUEST_DELIMITER.len()..]);
    parse_head(&raw[..position], body)
}

/// Parses everything before the blank line, attaching an already framed body.
pub(super) fn parse_head(mut head: &[u8], body: Bytes) -> Result<Request, MalformedRequest> {
    // request line = "METHOD TARGET HTTP/VERSION"
    let request_line = split_to_delimiter(&mut head)
        .filter(|line| !line.is_empty())
        .ok_or(MalformedRequest::MissingRequestLine)?;
    let (method, target) = split_request_line(from_utf8(request_line)?)?;

    let mut headers = Headers::new();
    // header = "Name: Value"
    while let Some(line) = split_to_delimiter(&mut head) {
        match header_from_line(line) {
            Some((name, value)) => headers.insert(name, value),
            None => tracing::debug!(line = ?String::from_utf8_lossy(line), "skipping malformed header"),
        }
    }

    Ok(Request::new(method, target.to_string(), headers, body))
}

fn split_request_line(line: &str) -> Result<(Method, &str), MalformedRequest> {
    let (method, rest) = line
        .split_once(' ')
        .ok_or(MalformedRequest::InvalidRequestLine)?;

    if method.is_empty() {
        return Err(MalformedRequest::InvalidRequestLine);
    }

    let target = match rest.rsplit_once(' ') {
        Some((target, version)) if version.starts_with("HTTP/") => target,
        _ => rest,
    };

    if target.is_empty() || target.starts_with(' ') {
        return Err(MalformedRequest::InvalidRequestLine);
    }

    let method = Method::from_bytes(method.as_bytes()).map_err(|_| MalformedRequest::InvalidMethod)?;
    Ok((method, target))
}

fn header_from_line(line: &[u8]) -> Option<(&str, &str)> {
    from_utf8(line).ok()?.split_once(HEADER_SEPARATOR)
}

#[inline]
fn split_to_delimiter<'a>(buf: &mut &'a [u8]) -> Option<&'a [u8]> {
    if buf.is_empty() {
        return None;
    }

    match FINDER.find(buf) {
        Some(pos) => {
            let part = &buf[..pos];
            *buf = &buf[pos + LINE_DELIMITER.len()..];
            Some(part)
        }
        None => {
            let part = *buf;
            *buf = &buf[part.len()..];
            Some(part)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_request() {
        let raw = b"POST /files/a.txt HTTP/1.1\r\nHost: localhost:4221\r\nContent-Length: 5\r\n\r\nhello";
        let req = parse(raw).unwrap();

        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.target(), "/files/a.txt");
        assert_eq!(req.headers().get("Host"), Some("localhost:4221"));
        assert_eq!(req.headers().get("Content-Length"), Some("5"));
        assert_eq!(req.body().as_ref(), b"hello");
    }

    #[test]
    fn parse_without_headers() {
        let req = parse(b"GET / HTTP/1.1\r\n\r\n").unwrap();

        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.target(), "/");
        assert!(req.headers().is_empty());
        assert!(req.body().is_empty());
    }

    #[test]
    fn parse_request_line() {
        #[rustfmt::skip]
        let cases = [
            ("GET /echo/abc HTTP/1.1",    Ok(("GET", "/echo/abc"))),
            ("GET /echo/a b HTTP/1.1",    Ok(("GET", "/echo/a b"))),
            ("GET /echo/abc",             Ok(("GET", "/echo/abc"))),
            ("DELETE /files/x HTTP/1.0",  Ok(("DELETE", "/files/x"))),
            ("PURGE /cache HTTP/1.1",     Ok(("PURGE", "/cache"))),

            ("GET",                       Err(MalformedRequest::InvalidRequestLine)),
            (" /echo HTTP/1.1",           Err(MalformedRequest::InvalidRequestLine)),
            ("GET  /x HTTP/1.1",          Err(MalformedRequest::InvalidRequestLine)),
            ("G(T / HTTP/1.1",            Err(MalformedRequest::InvalidMethod)),
        ];

        for (line, expected) in cases {
            let raw = format!("{line}\r\n\r\n");
            let parsed = parse(raw.as_bytes());

            match expected {
                Ok((method, target)) => {
                    let req = parsed.unwrap_or_else(|err| panic!("{line:?}: {err}"));
                    assert_eq!(req.method().as_str(), method, "{line:?}");
                    assert_eq!(req.target(), target, "{line:?}");
                }
                Err(err) => assert_eq!(parsed.unwrap_err(), err, "{line:?}"),
            }
        }
    }

    #[test]
    fn missing_delimiter() {
        assert_eq!(
            parse(b"GET / HTTP/1.1\r\nHost: x\r\n").unwrap_err(),
            MalformedRequest::MissingDelimiter
        );
        assert_eq!(parse(b"").unwrap_err(), MalformedRequest::MissingDelimiter);
    }

    #[test]
    fn missing_request_line() {
        assert_eq!(
            parse(b"\r\n\r\n").unwrap_err(),
            MalformedRequest::MissingRequestLine
        );
        assert_eq!(
            parse(b"\r\nHost: x\r\n\r\n").unwrap_err(),
            MalformedRequest::MissingRequestLine
        );
    }

    #[test]
    fn invalid_utf8_request_line() {
        assert!(matches!(
            parse(b"GET /\xff HTTP/1.1\r\n\r\n").unwrap_err(),
            MalformedRequest::InvalidUtf8(_)
        ));
    }

    #[test]
    fn malformed_headers_are_skipped() {
        let raw = b"GET /user-agent HTTP/1.1\r\nbroken\r\nNoSpace:value\r\n\xff\xfe: x\r\nUser-Agent: foo/1.0\r\n\r\n";
        let req = parse(raw).unwrap();

        assert_eq!(req.headers().len(), 1);
        assert_eq!(req.headers().get("User-Agent"), Some("foo/1.0"));
    }

    #[test]
    fn duplicate_headers_last_wins() {
        let raw = b"GET / HTTP/1.1\r\nAccept-Encoding: br\r\nAccept-Encoding: gzip\r\n\r\n";
        let req = parse(raw).unwrap();

        assert_eq!(req.headers().get("Accept-Encoding"), Some("gzip"));
    }

    #[test]
    fn header_value_keeps_later_separators() {
        let req = parse(b"GET / HTTP/1.1\r\nX-Note: a: b\r\n\r\n").unwrap();

        assert_eq!(req.headers().get("X-Note"), Some("a: b"));
    }

    #[test]
    fn body_is_split_at_first_blank_line() {
        let req = parse(b"POST /files/x HTTP/1.1\r\n\r\nline\r\n\r\nmore").unwrap();

        assert_eq!(req.body().as_ref(), b"line\r\n\r\nmore");
    }

    #[test]
    fn request_line_round_trip() {
        for raw in [
            &b"GET /echo/hello HTTP/1.1\r\nUser-Agent: x\r\n\r\n"[..],
            b"POST /files/report.bin HTTP/1.1\r\n\r\nbody",
            b"DELETE /files/x HTTP/1.1\r\n\r\n",
        ] {
            let req = parse(raw).unwrap();
            let line = req.request_line();
            let reparsed = parse(format!("{line}\r\n\r\n").as_bytes()).unwrap();

            assert_eq!(reparsed.method(), req.method());
            assert_eq!(reparsed.target(), req.target());
        }
    }
}
