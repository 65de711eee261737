use std::time::{Duration, Instant};
use std::{future::Future, io, net::SocketAddr, sync::Arc};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::codec::{Decoder, Framed};

use crate::config::Config;
use crate::error::RequestError;
use crate::http::codec::ConnectionCodec;
use crate::http::{Request, Response};

type Handler<A, F> = fn(Request, A) -> F;

pub struct Server<A, F> {
    state: A,
    handler: Handler<A, F>,
    semaphore: Arc<Semaphore>,
    permits: usize,
    read_timeout: Duration,
    connection_timeout: Duration,
    max_body_bytes: usize,
}

impl<S, F> Server<S, F>
where
    S: Clone + Send + Sync + 'static,
    F: Future<Output = Response> + Send + 'static,
{
    pub fn new(state: S, handler: Handler<S, F>, config: &Config) -> Self {
        Self {
            state,
            handler,
            semaphore: Arc::new(Semaphore::new(config.permits)),
            permits: config.permits,
            read_timeout: config.read_timeout(),
            connection_timeout: config.connection_timeout(),
            max_body_bytes: config.max_body_bytes,
        }
    }

    pub async fn bind<A: ToSocketAddrs>(self, addr: A) -> io::Result<()> {
        let server = Arc::new(self);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        tracing::info!(target: "listener", ?addr, "server is running");

        loop {
            let (socket, addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    tracing::warn!(target: "listener", %err, "failed to accept connection");
                    continue;
                }
            };

            let permit = server.acquire_permit().await;

            let server = server.clone();
            tokio::spawn(async move {
                let timeout = server.connection_timeout;
                if tokio::time::timeout(timeout, server.handle_request(socket, addr, permit))
                    .await
                    .is_err()
                {
                    tracing::warn!(?addr, ?timeout, "connection timed out");
                }
            });
        }
    }

    #[tracing::instrument(skip(self, socket, permit), fields(conn = %uuid::Uuid::now_v7()))]
    async fn handle_request(
        self: Arc<Self>,
        socket: TcpStream,
        addr: SocketAddr,
        permit: OwnedSemaphorePermit,
    ) {
        let mut codec = ConnectionCodec::new(self.max_body_bytes).framed(socket);
        let req = match self.read_request(&mut codec).await {
            Ok(Some(req)) => {
                tracing::debug!(?req, "received request");
                req
            }
            Ok(None) => {
                tracing::error!("connection ended before request");
                return;
            }
            Err(err) => {
                tracing::warn!(%err, "failed to read request");
                return;
            }
        };

        let user = req.headers().get("User-Agent").unwrap_or("Unknown");
        tracing::info!(
            target: "requests",
            method = %req.method(),
            path = req.target(),
            user,
            r#""{}" by {user:?}"#, req.request_line()
        );

        let now = Instant::now();
        let resp = (self.handler)(req, self.state.clone()).await;
        tracing::debug!(?resp, "handled in {:?}, sending response", now.elapsed());

        drop(permit);

        if let Err(err) = codec.send(resp).await {
            tracing::warn!(%err, "failed to send response");
        }
    }

    /// Reads one request. A read that stalls past the read timeout ends the
    /// message, and whatever arrived so far is parsed as is.
    async fn read_request(
        &self,
        codec: &mut Framed<TcpStream, ConnectionCodec>,
    ) -> Result<Option<Request>, RequestError> {
        match tokio::time::timeout(self.read_timeout, codec.next()).await {
            Ok(next) => next.transpose(),
            Err(_) => {
                let mut buffered = std::mem::take(codec.read_buffer_mut());
                tracing::debug!(buffered = buffered.len(), "read timed out");

                codec.codec_mut().finish(&mut buffered)
            }
        }
    }

    async fn acquire_permit(&self) -> OwnedSemaphorePermit {
        loop {
            if let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() {
                break permit;
            }

            let mut factor = 1;
            loop {
                const BACKOFF: Duration = Duration::from_millis(50);
                tokio::time::sleep(factor * BACKOFF).await;
                factor *= 2;
                let available_permits = self.semaphore.available_permits();
                if available_permits >= (self.permits / 100).max(1) {
                    break;
                }
            }
        }
    }
}
