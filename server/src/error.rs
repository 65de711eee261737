use std::{io, num::ParseIntError, str::Utf8Error};

/// Reasons a byte buffer could not be turned into a [`Request`](crate::http::Request).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MalformedRequest {
    #[error("no blank line separates the head from the body")]
    MissingDelimiter,
    #[error("request line is missing")]
    MissingRequestLine,
    #[error("request line must be `METHOD TARGET`")]
    InvalidRequestLine,
    #[error("invalid method token")]
    InvalidMethod,
    #[error("request line is not valid utf-8")]
    InvalidUtf8(#[from] Utf8Error),
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("malformed request: {0}")]
    Malformed(#[from] MalformedRequest),
    #[error("invalid content-length header")]
    InvalidContentLength,
    #[error("body of {length} bytes exceeds the {limit} byte limit")]
    BodyTooLarge { length: usize, limit: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<ParseIntError> for RequestError {
    fn from(_: ParseIntError) -> Self {
        Self::InvalidContentLength
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("file does not exist")]
    NotExist,
    #[error(transparent)]
    Io(io::Error),
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotExist,
            _ => Self::Io(err),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("failed to compress body: {0}")]
pub struct CompressionError(#[from] pub io::Error);
