//! HTTP server, graceful shutdown, and escalation.
//!
//! # Shutdown
//!
//! On **SIGTERM** or Ctrl-C the server:
//! 1. Immediately stops `listener.accept()`, so no new connections are made.
//! 2. Tells every connection to shut down gracefully. Idle keep-alive
//!    connections close at once, busy ones after their current response.
//! 3. Returns `Ok(())` from [`Server::serve`] once all of them are closed.
//!
//! # Escalation
//!
//! An operation declared with `catch_fire` that fails still answers its
//! client with a `500`. Its error is then forwarded to the accept loop, which
//! shuts down the same way and returns [`Error::Escalated`] from
//! [`Server::serve`] once the connections have drained.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::method::Method;
use crate::request::Request;
use crate::resource::Dispatched;
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    ///
    /// ```rust,no_run
    /// use restive::Server;
    /// let server = Server::bind("0.0.0.0:8080");
    /// ```
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns after a graceful shutdown: `Ok(())` for a signal,
    /// [`Error::Escalated`] for a failed `catch_fire` operation.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let router = Arc::new(router);
        let (escalate, mut escalations) = mpsc::unbounded_channel::<Error>();

        info!(addr = %self.addr, resources = router.resources().len(), "restive listening");

        let mut tasks = tokio::task::JoinSet::new();
        let graceful = GracefulShutdown::new();
        let mut escalated = None;

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                Some(err) = escalations.recv() => {
                    error!(error = %err, in_flight = tasks.len(), "request escalated, draining connections");
                    escalated = Some(err);
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let escalate = escalate.clone();
                    let watcher = graceful.watcher();
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            let escalate = escalate.clone();
                            async move { dispatch(router, req, escalate).await }
                        });

                        let builder = ConnBuilder::new(TokioExecutor::new());
                        if let Err(e) = watcher.watch(builder.serve_connection(io, svc)).await {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        drop(listener);
        graceful.shutdown().await;
        while tasks.join_next().await.is_some() {}

        info!("restive stopped");
        match escalated {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Converts one hyper request, dispatches it, and reports escalations.
///
/// Every failure is answered with a response, so hyper never sees an error.
async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<Incoming>,
    escalate: mpsc::UnboundedSender<Error>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let Ok(method) = Method::try_from(req.method()) else {
        warn!(method = %req.method(), path = req.uri().path(), "verb not routable");
        let message = format!("The service does not have {} verb", req.method());
        return Ok(Response::html_error(Status::MethodNotAllowed, &message).into_inner());
    };

    let target = req
        .uri()
        .path_and_query()
        .map_or_else(|| "/".to_owned(), |pq| pq.as_str().to_owned());
    let headers = req
        .headers()
        .iter()
        .filter_map(|(k, v)| Some((k.as_str().to_owned(), v.to_str().ok()?.to_owned())))
        .collect();

    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes().to_vec(),
        Err(e) => {
            warn!(path = %target, "failed to read request body: {e}");
            return Ok(Response::status(Status::BadRequest).into_inner());
        }
    };

    let Dispatched { response, escalation } =
        router.handle(Request::new(method, &target, headers, body)).await;

    if let Some(err) = escalation {
        // The receiver only goes away once the server has stopped.
        let _ = escalate.send(err);
    }

    Ok(response.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or Ctrl-C. Windows only has Ctrl-C.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
