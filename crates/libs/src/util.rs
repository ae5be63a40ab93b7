use std::{io, path::Path, sync::Arc};

use tokio::sync::Notify;

/// Resolves once SIGINT (or SIGTERM on unix) arrives, then wakes every waiter on `notify`.
pub async fn listen_for_shutdown(notify: Arc<Notify>) {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!("cannot install SIGTERM handler: {e}");
                    let _ = tokio::signal::ctrl_c().await;
                    tracing::info!("shutdown signal received – starting graceful shutdown");
                    notify.notify_waiters();
                    return;
                }
            };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = sigterm.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("shutdown signal received – starting graceful shutdown");
    notify.notify_waiters();
}

/// Creates `dir` and any missing parents. Fails if `dir` exists but is not a directory.
pub fn ensure_dir(dir: impl AsRef<Path>) -> io::Result<()> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        std::fs::create_dir_all(dir)?;
        tracing::debug!("created directory {}", dir.display());
    }
    Ok(())
}
