//! Cancellation from process signals.

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Token that is cancelled on Ctrl+C or SIGTERM.
///
/// Pass it (or a [`child_token`](CancellationToken::child_token)) to rate
/// limiter waits, retries and builds so an interrupted command stops
/// sleeping and returns a cancellation error instead of finishing its
/// backoff. The watcher task exits once the token is cancelled by either
/// side.
///
/// Must be called from within a Tokio runtime.
///
/// # Example
///
/// ```no_run
/// use cvx::{RateLimiter, cancel_on_interrupt};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let cancel = cancel_on_interrupt();
/// let limiter = RateLimiter::new(1.0)?;
/// limiter.wait(&cancel).await?;
/// # Ok(())
/// # }
/// ```
pub fn cancel_on_interrupt() -> CancellationToken {
    let token = CancellationToken::new();
    let watcher = token.clone();

    tokio::spawn(async move {
        tokio::select! {
            _ = watcher.cancelled() => {}
            _ = interrupted() => {
                info!("Interrupt received, cancelling in-flight work");
                watcher.cancel();
            }
        }
    });

    token
}

/// Resolves on the first Ctrl+C or SIGTERM.
///
/// A handler that cannot be installed never resolves, so the other signal
/// still works.
async fn interrupted() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
