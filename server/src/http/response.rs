use std::fmt;

use bytes::Bytes;

use super::Headers;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_LENGTH: &str = "Content-Length";
pub const CONTENT_ENCODING: &str = "Content-Encoding";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const CREATED: StatusCode = StatusCode(201);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const METHOD_NOT_ALLOWED: StatusCode = StatusCode(405);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    #[cfg(test)]
    pub const fn from_u16(code: u16) -> Self {
        Self(code)
    }

    pub const fn as_u16(self) -> u16 {
        self.0
    }

    pub const fn reason(self) -> &'static str {
        match self.0 {
            200 => "OK",
            201 => "Created",
            404 => "Not Found",
            405 => "Method Not Allowed",
            500 => "Internal Server Error",
            _ => "Unknown Status",
        }
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        Self::OK
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.reason())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    headers: Headers,
    body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_mut(&mut self) -> &mut StatusCode {
        &mut self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the body together with a matching `Content-Length`.
    pub fn with_body(self, content_type: &str, body: Bytes) -> Self {
        let length = body.len().to_string();
        let mut response = self
            .with_header(CONTENT_TYPE, content_type)
            .with_header(CONTENT_LENGTH, length);

        response.body = body;
        response
    }

    pub fn into_parts(self) -> (StatusCode, Headers, Bytes) {
        (self.status, self.headers, self.body)
    }
}

pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for StatusCode {
    fn into_response(self) -> Response {
        Response::new(self)
    }
}

impl IntoResponse for Bytes {
    fn into_response(self) -> Response {
        Response::default().with_body(mime::APPLICATION_OCTET_STREAM.as_ref(), self)
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        Response::default().with_body(mime::TEXT_PLAIN.as_ref(), Bytes::from(self))
    }
}

#[cfg(test)]
impl IntoResponse for &'static str {
    fn into_response(self) -> Response {
        Response::default().with_body(mime::TEXT_PLAIN.as_ref(), Bytes::from_static(self.as_bytes()))
    }
}

impl<B: IntoResponse> IntoResponse for (StatusCode, B) {
    fn into_response(self) -> Response {
        let mut response = self.1.into_response();
        *response.status_mut() = self.0;

        response
    }
}
