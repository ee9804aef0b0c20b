// Server module entry point
// Binds the listener and runs the accept loop until shutdown

pub mod connection;
pub mod listener;
pub mod signal;

use std::error::Error;
use std::future::Future;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;

pub use listener::create_listener;

use crate::config::{AppState, Config};
use crate::logger;
use connection::accept_connection;

/// Bind the configured address and serve until SIGINT/SIGTERM
pub async fn run(config: Config) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = config.get_socket_addr()?;
    let listener = create_listener(addr)?;
    let state = Arc::new(AppState::new(config)?);

    logger::log_server_start(&listener.local_addr()?, &state.config);

    serve(listener, state, signal::shutdown_signal()).await
}

/// Accept loop; returns once `shutdown` resolves
///
/// Connections already being served keep running in their own tasks.
pub async fn serve<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), Box<dyn Error + Send + Sync>>
where
    F: Future<Output = &'static str>,
{
    let active_connections = Arc::new(AtomicUsize::new(0));
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            reason = &mut shutdown => {
                logger::log_shutdown(reason);
                return Ok(());
            }
        }
    }
}
