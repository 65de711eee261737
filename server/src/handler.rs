use http::Method;

use crate::{
    error::StoreError,
    http::{IntoResponse, Request, Response, StatusCode},
    store::ByteStore,
    AppState,
};

pub const ECHO_PREFIX: &str = "/echo/";
pub const FILES_PREFIX: &str = "/files/";

const USER_AGENT: &str = "User-Agent";

pub fn root() -> Response {
    StatusCode::OK.into_response()
}

pub fn echo(request: &Request) -> Response {
    let message = after_prefix(request.target(), ECHO_PREFIX);

    (StatusCode::OK, message.to_string()).into_response()
}

pub fn user_agent(request: &Request) -> Response {
    let user_agent = request.headers().get(USER_AGENT).unwrap_or_default();

    (StatusCode::OK, user_agent.to_string()).into_response()
}

pub async fn files(request: &Request, app_state: &AppState) -> Response {
    let name = after_prefix(request.target(), FILES_PREFIX);

    if request.method() == Method::GET {
        read_file(app_state, name).await
    } else if request.method() == Method::POST {
        write_file(app_state, name, request).await
    } else {
        StatusCode::METHOD_NOT_ALLOWED.into_response()
    }
}

pub fn not_found() -> Response {
    StatusCode::NOT_FOUND.into_response()
}

async fn read_file(app_state: &AppState, name: &str) -> Response {
    match app_state.store.read(name).await {
        Ok(content) => (StatusCode::OK, content).into_response(),
        Err(StoreError::NotExist) => {
            tracing::debug!(name, "file not found");
            StatusCode::NOT_FOUND.into_response()
        }
        Err(err) => {
            tracing::warn!(%err, name, "failed to read file");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn write_file(app_state: &AppState, name: &str, request: &Request) -> Response {
    match app_state.store.write(name, request.body()).await {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(err) => {
            tracing::warn!(%err, name, "failed to write file");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Everything past the first `prefix.len()` bytes of `target`, or an empty
/// string when the target is not that long.
fn after_prefix<'a>(target: &'a str, prefix: &str) -> &'a str {
    target.get(prefix.len()..).unwrap_or_default()
}
