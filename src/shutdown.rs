//! Shutdown signalling for the long-running binaries.
//!
//! A `watch::Receiver<bool>` is the cancellation token: `true` means stop.
//! A dropped sender never cancels.

use crate::error::SolarError;
use tokio::sync::watch;
use tracing::info;

/// Resolves once `shutdown` holds `true`.
pub async fn requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Flip `tx` to `true` on the first SIGINT or SIGTERM.
///
/// Handlers are registered before this returns, so a signal that arrives
/// afterwards is never lost. Must be called inside a runtime context.
#[cfg(unix)]
pub fn forward_signals(tx: watch::Sender<bool>) -> Result<(), SolarError> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    tokio::spawn(async move {
        let name = tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
        };
        info!(signal = name, "shutdown requested");
        let _ = tx.send(true);
    });
    Ok(())
}

#[cfg(not(unix))]
pub fn forward_signals(tx: watch::Sender<bool>) -> Result<(), SolarError> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!(signal = "ctrl-c", "shutdown requested");
            let _ = tx.send(true);
        }
    });
    Ok(())
}
