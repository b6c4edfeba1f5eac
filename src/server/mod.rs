//! Server module
//!
//! Owns the accept loops for the plaintext and TLS listeners and the
//! graceful shutdown sequence. Both listeners feed the same handler;
//! there is no HTTP to HTTPS redirect.

pub mod connection;
pub mod listener;
pub mod shutdown;

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;

use crate::config::{ServerContext, TlsConfig};
use crate::logger;
use crate::tls;
use shutdown::SignalHandler;

pub use listener::create_listener;

/// Bind the HTTPS listener when an address is configured.
///
/// A broken certificate setup or a failed bind downgrades to HTTP-only
/// instead of aborting startup: HTTPS is a missing optional capability
/// here, not misconfiguration. `None` means the server runs plaintext
/// only.
pub fn setup_https_listener(
    https_addr: Option<SocketAddr>,
    tls_config: &TlsConfig,
) -> Option<(TcpListener, TlsAcceptor)> {
    let addr = https_addr?;

    let acceptor = match tls::build_acceptor(tls_config) {
        Ok(acceptor) => acceptor,
        Err(e) => {
            logger::log_https_disabled(&e.to_string());
            return None;
        }
    };

    match listener::create_listener(addr) {
        Ok(listener) => Some((listener, acceptor)),
        Err(e) => {
            logger::log_https_disabled(&format!("failed to bind {addr}: {e}"));
            None
        }
    }
}

/// Run both accept loops until a shutdown signal arrives, then drain.
///
/// On shutdown: the listeners are dropped (no new connections), then
/// in-flight connections get `shutdown_grace_period` seconds to finish
/// before the process exits.
pub async fn run(
    state: Arc<ServerContext>,
    http_listener: TcpListener,
    tls_listener: Option<(TcpListener, TlsAcceptor)>,
    signal: Arc<SignalHandler>,
) {
    loop {
        tokio::select! {
            accept_result = http_listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        connection::accept_plain(stream, peer_addr, &state);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            accept_result = accept_tls_conn(tls_listener.as_ref()) => {
                match accept_result {
                    Ok((stream, peer_addr, acceptor)) => {
                        connection::accept_tls(stream, peer_addr, &state, acceptor);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept TLS connection: {e}"));
                    }
                }
            }

            _ = signal.shutdown.notified() => {
                break;
            }
        }

        if signal.shutdown_requested.load(Ordering::SeqCst) {
            break;
        }
    }

    // Release the listening sockets before draining
    drop(http_listener);
    drop(tls_listener);
    drain(&state).await;
}

/// Accept on the TLS listener, or park forever when HTTPS is disabled
/// (the select branch then simply never fires).
async fn accept_tls_conn(
    tls: Option<&(TcpListener, TlsAcceptor)>,
) -> std::io::Result<(TcpStream, SocketAddr, TlsAcceptor)> {
    match tls {
        Some((listener, acceptor)) => {
            let (stream, peer_addr) = listener.accept().await?;
            Ok((stream, peer_addr, acceptor.clone()))
        }
        None => std::future::pending().await,
    }
}

/// Wait for in-flight connections to finish, up to the grace period.
async fn drain(state: &ServerContext) {
    let grace = Duration::from_secs(state.config.performance.shutdown_grace_period);
    let deadline = tokio::time::Instant::now() + grace;

    logger::log_shutdown("Stopped accepting connections, draining in-flight requests");

    loop {
        let active = state.active_connections.load(Ordering::SeqCst);
        if active == 0 {
            logger::log_shutdown("All connections closed, exiting cleanly");
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            logger::log_shutdown(&format!(
                "Grace period elapsed with {active} connections still open, closing forcibly"
            ));
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
