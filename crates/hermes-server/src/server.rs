//! The hyper host server.
//!
//! [`Server::bind`] builds the dispatch engine, binds a TCP listener and
//! spawns the accept loop. The returned [`ServerHandle`] is the only way
//! to interact with the running server.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use hermes_config::ConfigError;

use crate::app::AppConfig;
use crate::dispatch::DispatchEngine;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Errors raised while starting the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The application configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The listener could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Address as configured.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Starts servers.
///
/// # Example
///
/// ```rust,ignore
/// use hermes_server::{AppConfig, Server};
///
/// let handle = Server::bind(AppConfig::builder().mount(&Health).port(8080).build()).await?;
/// println!("listening on {}:{}", handle.hostname(), handle.port());
/// handle.stop();
/// handle.stopped().await;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Server;

impl Server {
    /// Starts serving `config`.
    ///
    /// # Errors
    ///
    /// Fails before accepting anything if the route table cannot be built or
    /// the address cannot be bound.
    pub async fn bind(config: AppConfig) -> Result<ServerHandle, ServerError> {
        Self::bind_with_shutdown(config, ShutdownSignal::new()).await
    }

    /// Starts serving `config`, stopping when `shutdown` fires.
    ///
    /// Pass [`ShutdownSignal::with_os_signals`] to stop on SIGTERM/SIGINT.
    ///
    /// # Errors
    ///
    /// See [`bind`](Self::bind).
    pub async fn bind_with_shutdown(
        config: AppConfig,
        shutdown: ShutdownSignal,
    ) -> Result<ServerHandle, ServerError> {
        let hostname = config.hostname().to_string();
        let port = config.port();
        let disable_banner = config.disable_startup_message();
        let shutdown_timeout = config.shutdown_timeout();

        let engine = Arc::new(DispatchEngine::new(config)?);

        let listener = TcpListener::bind((hostname.as_str(), port))
            .await
            .map_err(|source| ServerError::Bind {
                addr: format!("{hostname}:{port}"),
                source,
            })?;
        let local = listener.local_addr().map_err(|source| ServerError::Bind {
            addr: format!("{hostname}:{port}"),
            source,
        })?;

        if !disable_banner {
            tracing::info!(
                hostname = %hostname,
                port = local.port(),
                routes = engine.table().len(),
                "Hermes server listening"
            );
        }

        let task = tokio::spawn(accept_loop(
            listener,
            engine,
            shutdown.clone(),
            shutdown_timeout,
        ));

        Ok(ServerHandle {
            hostname,
            port: local.port(),
            shutdown,
            task,
        })
    }
}

async fn accept_loop(
    listener: TcpListener,
    engine: Arc<DispatchEngine>,
    shutdown: ShutdownSignal,
    shutdown_timeout: Duration,
) {
    let tracker = ConnectionTracker::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, remote_addr)) => {
                    let token = tracker.acquire();
                    let engine = Arc::clone(&engine);
                    let shutdown = shutdown.clone();
                    tokio::spawn(async move {
                        serve_connection(stream, remote_addr, engine, shutdown).await;
                        drop(token);
                    });
                }
                Err(e) => tracing::error!(error = %e, "Failed to accept connection"),
            },
            () = shutdown.recv() => break,
        }
    }

    drop(listener);
    tracing::info!(
        active = tracker.active_connections(),
        timeout_secs = shutdown_timeout.as_secs(),
        "Shutting down, draining connections"
    );

    if tracker.wait_for_drain(shutdown_timeout).await {
        tracing::info!("Server stopped");
    } else {
        tracing::warn!(
            active = tracker.active_connections(),
            "Shutdown timeout reached with connections still open"
        );
    }
}

async fn serve_connection(
    stream: TcpStream,
    remote_addr: SocketAddr,
    engine: Arc<DispatchEngine>,
    shutdown: ShutdownSignal,
) {
    let service = service_fn(move |request: Request<Incoming>| {
        let engine = Arc::clone(&engine);
        async move { Ok::<_, Infallible>(engine.dispatch(request, Some(remote_addr)).await) }
    });

    let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let result = tokio::select! {
        result = conn.as_mut() => result,
        () = shutdown.recv() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };

    if let Err(e) = result {
        tracing::debug!(remote = %remote_addr, error = %e, "Connection closed with error");
    }
}

/// Handle to a running server.
#[derive(Debug)]
pub struct ServerHandle {
    hostname: String,
    port: u16,
    shutdown: ShutdownSignal,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Stops accepting connections and starts draining open ones.
    pub fn stop(&self) {
        self.shutdown.trigger();
    }

    /// Returns the configured hostname.
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Returns the bound port. Differs from the configured one when that was `0`.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Waits until the accept loop has finished draining.
    pub async fn stopped(self) {
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Server task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{Controller, ControllerRoutes};
    use hermes_core::handler_fn;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    struct Ping;

    impl Controller for Ping {
        fn routes(&self) -> ControllerRoutes {
            ControllerRoutes::new("/ping").get(
                "/",
                "ping",
                handler_fn(|ctx| {
                    Box::pin(async move {
                        ctx.string("pong", None, None)?;
                        Ok(())
                    })
                }),
            )
        }
    }

    fn local_config() -> AppConfig {
        AppConfig::builder()
            .hostname("127.0.0.1")
            .port(0)
            .disable_startup_message(true)
            .shutdown_timeout(Duration::from_secs(1))
            .mount(&Ping)
            .build()
    }

    async fn raw_get(port: u16, path: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let request =
            format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_bind_serves_requests() {
        let handle = Server::bind(local_config()).await.unwrap();
        assert_eq!(handle.hostname(), "127.0.0.1");
        assert_ne!(handle.port(), 0);

        let response = raw_get(handle.port(), "/ping").await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with("pong"));

        let missing = raw_get(handle.port(), "/nope").await;
        assert!(missing.starts_with("HTTP/1.1 404"));

        handle.stop();
        tokio::time::timeout(Duration::from_secs(5), handle.stopped())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_bind_fails_fast_without_controllers() {
        let config = AppConfig::builder().hostname("127.0.0.1").port(0).build();
        let err = Server::bind(config).await.unwrap_err();
        assert!(matches!(err, ServerError::Config(ConfigError::NoControllers)));
    }

    #[tokio::test]
    async fn test_bind_reports_address_in_use() {
        let first = Server::bind(local_config()).await.unwrap();
        let config = AppConfig::builder()
            .hostname("127.0.0.1")
            .port(first.port())
            .disable_startup_message(true)
            .mount(&Ping)
            .build();
        let err = Server::bind(config).await.unwrap_err();
        assert!(matches!(err, ServerError::Bind { .. }));
        assert!(err.to_string().contains(&first.port().to_string()));
        first.stop();
    }

    #[tokio::test]
    async fn test_external_shutdown_signal() {
        let shutdown = ShutdownSignal::new();
        let handle = Server::bind_with_shutdown(local_config(), shutdown.clone())
            .await
            .unwrap();
        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), handle.stopped())
            .await
            .unwrap();
    }
}
