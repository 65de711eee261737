pub const LINE_DELIMITER: &[u8] = b"\r\n";
pub const REQUEST_DELIMITER: &[u8] = b"\r\n\r\n";
pub const HTTP_VERSION: &str = "HTTP/1.1";

pub mod codec;
pub mod encoding;
mod headers;
pub mod parser;
mod request;
mod response;
pub mod serializer;

pub use headers::Headers;
pub use request::Request;
pub use response::{
    IntoResponse, Response, StatusCode, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE,
};
