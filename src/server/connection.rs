// Connection handling module
// Admits a TCP connection against the connection limit and serves it in its
// own task

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// One admitted connection; releases its slot when dropped
pub struct ConnectionSlot {
    active: Arc<AtomicUsize>,
}

impl ConnectionSlot {
    /// Claim a slot, or `None` when `limit` connections are already open.
    ///
    /// The count is bumped before the check so two racing accepts cannot both
    /// take the last slot.
    pub fn acquire(active: &Arc<AtomicUsize>, limit: Option<u64>) -> Option<Self> {
        let previous = active.fetch_add(1, Ordering::SeqCst);
        let slot = Self {
            active: Arc::clone(active),
        };
        match limit {
            Some(max) if previous >= usize::try_from(max).unwrap_or(usize::MAX) => None,
            _ => Some(slot),
        }
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Admit `stream` and spawn its serving task, or drop it when over the limit
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    active: &Arc<AtomicUsize>,
) {
    let limit = state.config.performance.max_connections;
    let Some(slot) = ConnectionSlot::acquire(active, limit) else {
        logger::log_warning(&format!(
            "Max connections reached ({}), rejecting {peer_addr}",
            limit.unwrap_or_default()
        ));
        return;
    };

    logger::log_connection_accepted(&peer_addr);
    tokio::spawn(serve_connection(stream, peer_addr, Arc::clone(state), slot));
}

/// Serve HTTP/1.1 on one connection until the client closes it.
///
/// Once the connection lifetime (the larger of the read and write timeouts)
/// runs out, keep-alive is switched off: an idle connection closes at once and
/// a request in flight still gets its response before the connection closes.
async fn serve_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    _slot: ConnectionSlot,
) {
    let performance = &state.config.performance;
    let lifetime = Duration::from_secs(performance.read_timeout.max(performance.write_timeout));

    let service_state = Arc::clone(&state);
    let service = service_fn(move |req| {
        handler::handle_request(req, Arc::clone(&service_state), peer_addr)
    });

    let mut builder = http1::Builder::new();
    builder.keep_alive(performance.keep_alive);
    let conn = builder.serve_connection(TokioIo::new(stream), service);
    let expiry = tokio::time::sleep(lifetime);
    tokio::pin!(conn, expiry);

    let mut draining = false;
    let result = loop {
        tokio::select! {
            result = conn.as_mut() => break result,
            () = &mut expiry, if !draining => {
                draining = true;
                logger::log_debug(&format!(
                    "Connection from {peer_addr} reached its {}s lifetime, closing after current request",
                    lifetime.as_secs()
                ));
                conn.as_mut().graceful_shutdown();
            }
        }
    };

    if let Err(err) = result {
        logger::log_connection_error(&err);
    }
}
