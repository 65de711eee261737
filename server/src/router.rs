use crate::{
    handler::{self, ECHO_PREFIX},
    http::{
        encoding::{accepts_gzip, GZIP},
        Request, Response, CONTENT_ENCODING,
    },
    AppState,
};

const ACCEPT_ENCODING: &str = "Accept-Encoding";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Root,
    Echo,
    UserAgent,
    Files,
    NotFound,
}

#[derive(Clone, Copy, Debug)]
pub enum Matcher {
    Exact(&'static str),
    Prefix(&'static str),
}

impl Matcher {
    pub fn matches(self, target: &str) -> bool {
        match self {
            Matcher::Exact(path) => target == path,
            Matcher::Prefix(prefix) => target.starts_with(prefix),
        }
    }
}

/// Checked top to bottom, the first match wins.
pub const ROUTES: &[(Matcher, Endpoint)] = &[
    (Matcher::Exact("/"), Endpoint::Root),
    (Matcher::Prefix(ECHO_PREFIX), Endpoint::Echo),
    (Matcher::Prefix("/user-agent"), Endpoint::UserAgent),
    (Matcher::Prefix("/files"), Endpoint::Files),
];

pub fn resolve(target: &str) -> Endpoint {
    ROUTES
        .iter()
        .find(|(matcher, _)| matcher.matches(target))
        .map_or(Endpoint::NotFound, |&(_, endpoint)| endpoint)
}

pub async fn route_request(request: Request, app_state: AppState) -> Response {
    let endpoint = resolve(request.target());
    tracing::debug!(?endpoint, target = request.target(), "resolved route");

    let mut response = match endpoint {
        Endpoint::Root => handler::root(),
        Endpoint::Echo => handler::echo(&request),
        Endpoint::UserAgent => handler::user_agent(&request),
        Endpoint::Files => handler::files(&request, &app_state).await,
        Endpoint::NotFound => handler::not_found(),
    };

    // compression itself happens in the serializer, after Content-Length is final
    if request.headers().get(ACCEPT_ENCODING).is_some_and(accepts_gzip) {
        response.headers_mut().insert(CONTENT_ENCODING, GZIP);
    }

    response
}
