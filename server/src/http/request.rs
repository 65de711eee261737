use bytes::Bytes;
use http::Method;

use super::{Headers, HTTP_VERSION};

/// A parsed inbound message. Only the parser constructs one, so `method` and
/// `target` are never empty.
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    target: String,
    headers: Headers,
    body: Bytes,
}

impl Request {
    pub(super) fn new(method: Method, target: String, headers: Headers, body: Bytes) -> Self {
        debug_assert!(!target.is_empty());

        Self {
            method,
            target,
            headers,
            body,
        }
    }

    pub(super) fn with_body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Raw path and query, exactly as received.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn request_line(&self) -> String {
        format!("{} {} {HTTP_VERSION}", self.method, self.target)
    }
}

#[cfg(test)]
impl Request {
    pub fn fake(method: Method, target: &str, headers: &[(&str, &str)], body: &'static [u8]) -> Self {
        Self::new(
            method,
            target.to_string(),
            headers.iter().copied().collect(),
            Bytes::from_static(body),
        )
    }
}
