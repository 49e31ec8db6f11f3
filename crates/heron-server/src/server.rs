//! HTTP server.
//!
//! A Tokio accept loop serving HTTP/1.1 with hyper. Each request body is
//! collected in full, then the [`Dispatcher`] runs on the blocking pool so
//! handlers may block without stalling the reactor.
//!
//! # Example
//!
//! ```rust,ignore
//! use heron_server::{Dispatcher, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::new(routes);
//!     Server::new(ServerConfig::default(), dispatcher).run().await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use heron_telemetry::logging::fields::{ERROR, HTTP_METHOD, HTTP_PATH};
use heron_telemetry::metrics::InFlightGuard;

use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;
use crate::error::ServerError;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Response type written to the wire.
pub type HttpResponse = Response<Full<Bytes>>;

/// The Heron HTTP server.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    dispatcher: Dispatcher,
}

impl Server {
    /// Creates a server for a dispatcher.
    #[must_use]
    pub fn new(config: ServerConfig, dispatcher: Dispatcher) -> Self {
        Self { config, dispatcher }
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Binds the configured address and serves until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address is invalid or taken.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Binds the configured address and serves until `shutdown` triggers.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address is invalid or taken.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }

    /// Binds the configured address without serving.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address is invalid or taken.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let http_addr = self.config.http_addr();
        let addr = self
            .config
            .socket_addr()
            .map_err(|e| ServerError::bind(http_addr, io::Error::new(io::ErrorKind::InvalidInput, e)))?;

        TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::bind(http_addr, e))
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// triggers, then waits up to the shutdown timeout for open connections.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Io`] if the listener's address is unavailable.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(
            addr = %local_addr,
            routes = self.dispatcher.routes().len(),
            "server listening"
        );

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();
        let limit = server
            .config
            .max_connections()
            .map(|max| Arc::new(Semaphore::new(max)));

        loop {
            let permit = match &limit {
                Some(limit) => tokio::select! {
                    permit = Arc::clone(limit).acquire_owned() => permit.ok(),
                    () = shutdown.recv() => break,
                },
                None => None,
            };

            tokio::select! {
                result = listener.accept() => match result {
                    Ok((stream, remote_addr)) => {
                        let server = Arc::clone(&server);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();

                        tokio::spawn(async move {
                            server.handle_connection(stream, remote_addr, shutdown).await;
                            drop(permit);
                            drop(token);
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to accept connection");
                    }
                },
                () = shutdown.recv() => break,
            }
        }

        let shutdown_timeout = server.config.shutdown_timeout();
        tracing::info!(
            open_connections = tracker.active_connections(),
            timeout_ms = u64::try_from(shutdown_timeout.as_millis()).unwrap_or(u64::MAX),
            "shutdown requested, draining connections"
        );

        tokio::select! {
            () = tracker.wait_for_drain() => {
                tracing::info!("all connections closed");
            }
            () = tokio::time::sleep(shutdown_timeout) => {
                tracing::warn!(
                    open_connections = tracker.active_connections(),
                    "shutdown timeout reached"
                );
            }
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) {
        let io = TokioIo::new(stream);
        let server = Arc::clone(&self);
        let service = service_fn(move |req: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_request(req).await) }
        });

        let conn = http1::Builder::new()
            .keep_alive(self.config.keep_alive())
            .serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => {
                if let Err(e) = result {
                    tracing::debug!(remote = %remote_addr, error = %e, "connection error");
                }
            }
            () = shutdown.recv() => {
                // Let the in-flight request finish, then close.
                conn.as_mut().graceful_shutdown();
                if let Err(e) = conn.await {
                    tracing::debug!(remote = %remote_addr, error = %e, "connection error during shutdown");
                }
            }
        }
    }

    async fn handle_request(&self, req: Request<Incoming>) -> HttpResponse {
        let _in_flight = InFlightGuard::new();
        let (parts, body) = req.into_parts();

        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                tracing::error!(
                    { HTTP_METHOD } = %parts.method,
                    { HTTP_PATH } = parts.uri.path(),
                    { ERROR } = %e,
                    "failed to read request body"
                );
                return status_only(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        let dispatcher = self.dispatcher.clone();
        let dispatched = tokio::task::spawn_blocking(move || {
            dispatcher.dispatch(&parts.method, parts.uri.path(), &parts.headers, &body)
        })
        .await;

        match dispatched {
            Ok(response) => response.map(Full::new),
            Err(e) => {
                tracing::error!(error = %e, "dispatch task failed");
                status_only(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

fn status_only(status: StatusCode) -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}
