//! Daemon shutdown. Long-running tasks wait on [`shutdown_requested`], which resolves
//! once [`request_shutdown`] was called from the signal handler or the `kill` command.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use tokio::sync::broadcast;

static SHUTDOWN: Lazy<broadcast::Sender<()>> = Lazy::new(|| broadcast::channel(1).0);
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Tell every task waiting on [`shutdown_requested`] to stop. Only the first call broadcasts,
/// later ones succeed without doing anything.
pub fn request_shutdown() -> Result<()> {
    if SHUTDOWN_REQUESTED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    SHUTDOWN.send(()).map(|_| ()).context("No task is listening for the shutdown request")
}

pub async fn shutdown_requested() -> Result<()> {
    let mut recv = SHUTDOWN.subscribe();
    recv.recv().await.context("Shutdown channel closed")
}

/// `tokio::select!` over the given branches in a loop, until the daemon shuts down.
#[macro_export]
macro_rules! select_until_shutdown {
    ($($branches:tt)*) => {
        loop {
            tokio::select! {
                Ok(()) = $crate::application_lifecycle::shutdown_requested() => break,
                $($branches)*
            }
        }
    };
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_shutdown_is_broadcast_once() {
        let mut recv = SHUTDOWN.subscribe();
        assert!(request_shutdown().is_ok());
        assert!(recv.try_recv().is_ok());

        // the kill command repeats the request after a signal already started the shutdown
        drop(recv);
        assert!(request_shutdown().is_ok());
    }
}
