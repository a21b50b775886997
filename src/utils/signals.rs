//! Signal handling for graceful shutdown

use std::future::Future;

use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use futures::stream::StreamExt;
use tracing::{error, info};

/// Wait for SIGTERM or SIGINT and return the signal number
pub async fn shutdown_signal() -> std::io::Result<i32> {
    let mut signals = Signals::new([SIGTERM, SIGINT])?;
    let handle = signals.handle();

    let signal = signals.next().await.unwrap_or(SIGTERM);
    info!("Received signal: {}", signal);

    handle.close();
    Ok(signal)
}

/// Resolve once `signal` delivers. If listening fails this never resolves,
/// so the server keeps running instead of shutting down at startup.
pub async fn until_shutdown<F>(signal: F)
where
    F: Future<Output = std::io::Result<i32>>,
{
    match signal.await {
        Ok(_) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for shutdown signals: {}", e);
            futures::future::pending::<()>().await;
        }
    }
}
