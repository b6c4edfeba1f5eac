// Connection handling module
// Serves a single accepted connection, plaintext or TLS

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsAcceptor;

use crate::config::ServerContext;
use crate::handler;
use crate::logger;

/// Admit a connection against the configured limit.
///
/// Increments the active-connection counter first and rolls back on
/// rejection, so the check cannot race with other accepts.
fn try_admit(state: &ServerContext) -> bool {
    let prev_count = state.active_connections.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            state.active_connections.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            return false;
        }
    }
    true
}

/// Accept a plaintext connection and serve it in a spawned task.
pub fn accept_plain(stream: TcpStream, peer_addr: SocketAddr, state: &Arc<ServerContext>) {
    if !try_admit(state) {
        drop(stream);
        return;
    }

    if state.config.logging.access_log {
        logger::log_connection_accepted(&peer_addr);
    }

    let state = Arc::clone(state);
    tokio::spawn(async move {
        serve_io(stream, peer_addr, &state).await;
        state.active_connections.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Accept a TLS connection: handshake in the spawned task (never in the
/// accept loop), then serve the decrypted stream.
pub fn accept_tls(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<ServerContext>,
    acceptor: TlsAcceptor,
) {
    if !try_admit(state) {
        drop(stream);
        return;
    }

    if state.config.logging.access_log {
        logger::log_connection_accepted(&peer_addr);
    }

    let state = Arc::clone(state);
    tokio::spawn(async move {
        let idle_timeout = Duration::from_millis(state.config.server.idle_timeout_ms);
        match tokio::time::timeout(idle_timeout, acceptor.accept(stream)).await {
            Ok(Ok(tls_stream)) => serve_io(tls_stream, peer_addr, &state).await,
            Ok(Err(err)) => {
                logger::log_warning(&format!("TLS handshake failed for {peer_addr}: {err}"));
            }
            Err(_) => {
                logger::log_warning(&format!("TLS handshake timed out for {peer_addr}"));
            }
        }
        state.active_connections.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Serve one HTTP/1.1 connection over any byte stream.
///
/// Keep-alive is enabled. The idle timeout measures inactivity, not
/// connection age: each served request resets the window, and only a
/// window with no request progress closes the socket.
async fn serve_io<IO>(stream: IO, peer_addr: SocketAddr, state: &Arc<ServerContext>)
where
    IO: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let io = TokioIo::new(stream);
    let idle_timeout = Duration::from_millis(state.config.server.idle_timeout_ms);

    // Bumped at request arrival and response completion; a value left
    // unchanged across a full timeout window means the peer went quiet.
    let activity = Arc::new(AtomicU64::new(0));

    let svc_state = Arc::clone(state);
    let svc_activity = Arc::clone(&activity);
    let conn = http1::Builder::new().keep_alive(true).serve_connection(
        io,
        service_fn(move |req| {
            let state = Arc::clone(&svc_state);
            let activity = Arc::clone(&svc_activity);
            async move {
                activity.fetch_add(1, Ordering::Relaxed);
                let result = handler::handle_request(req, state, peer_addr).await;
                activity.fetch_add(1, Ordering::Relaxed);
                result
            }
        }),
    );
    tokio::pin!(conn);

    loop {
        let seen = activity.load(Ordering::Relaxed);
        match tokio::time::timeout(idle_timeout, conn.as_mut()).await {
            Ok(Ok(())) => break,
            // Malformed requests and client resets land here; scoped to
            // this connection only.
            Ok(Err(err)) => {
                logger::log_connection_error(&err);
                break;
            }
            Err(_) => {
                if activity.load(Ordering::Relaxed) == seen {
                    logger::log_warning(&format!(
                        "Connection from {peer_addr} idle for {}ms, closing",
                        idle_timeout.as_millis()
                    ));
                    break;
                }
                // Requests arrived during the window; keep serving
            }
        }
    }
}
