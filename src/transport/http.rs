//! HTTP transport
//!
//! Serves an axum router on a TCP listener until the cancellation token
//! fires, then drains in-flight requests.

use crate::error::TransportError;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Default port for the gateway
pub const DEFAULT_HTTP_PORT: u16 = 20290;

/// Configuration for the HTTP server
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Address to bind to (e.g., "127.0.0.1:20290")
    pub bind: SocketAddr,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], DEFAULT_HTTP_PORT)),
        }
    }
}

impl HttpConfig {
    /// Create a new HTTP config with the specified bind address
    pub fn new(bind: SocketAddr) -> Self {
        Self { bind }
    }

    /// Create config from host and port strings
    pub fn from_host_port(host: &str, port: u16) -> Result<Self, TransportError> {
        let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
        Ok(Self::new(addr))
    }
}

/// Bind the listener for a config
pub async fn bind(config: &HttpConfig) -> Result<TcpListener, TransportError> {
    let listener = TcpListener::bind(config.bind).await?;
    info!("HTTP server listening on http://{}", listener.local_addr()?);
    Ok(listener)
}

/// Serve a router on an already bound listener until `ct` is cancelled
pub async fn serve(
    listener: TcpListener,
    router: Router,
    ct: CancellationToken,
) -> Result<(), TransportError> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(|e| TransportError::Http(e.to_string()))?;

    info!("HTTP server stopped");
    Ok(())
}

/// Bind and serve a router until `ct` is cancelled
pub async fn run_http(
    router: Router,
    config: HttpConfig,
    ct: CancellationToken,
) -> Result<(), TransportError> {
    let listener = bind(&config).await?;
    serve(listener, router, ct).await
}

/// Run the HTTP server and wait for shutdown
///
/// This is a convenience function that stops the server on Ctrl+C or when
/// `ct` is cancelled elsewhere.
pub async fn run_http_blocking(
    router: Router,
    config: HttpConfig,
    ct: CancellationToken,
) -> Result<(), TransportError> {
    let listener = bind(&config).await?;

    info!("Press Ctrl+C to stop the server");

    let signal_ct = ct.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
            }
            _ = signal_ct.cancelled() => {}
        }
        signal_ct.cancel();
    });

    serve(listener, router, ct).await
}
