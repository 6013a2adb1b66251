//! Coalescing drive notifications into tree refreshes
//!
//! A single file copy produces a storm of IoStarted/IoStopped pairs. Each
//! notification restarts a quiet-period timer and the tree is only reloaded
//! once the drive has been quiet for the whole window.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::FloppyNotification;
use crate::config::DragOutConfig;

/// Default quiet period before refreshing
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Spawn a task that calls `on_refresh` once per burst of notifications.
///
/// A burst still waiting when the channel closes is flushed before the task
/// exits. Must be called from within a tokio runtime.
pub fn spawn_refresh_debouncer<F>(
    mut rx: mpsc::UnboundedReceiver<FloppyNotification>,
    window: Duration,
    mut on_refresh: F,
) -> JoinHandle<()>
where
    F: FnMut() + Send + 'static,
{
    tokio::spawn(async move {
        // Wait for the first notification of a burst
        while let Some(first) = rx.recv().await {
            tracing::trace!(?first, "drive activity, scheduling refresh");
            let mut closed = false;
            loop {
                match tokio::time::timeout(window, rx.recv()).await {
                    // More activity restarts the window
                    Ok(Some(_)) => continue,
                    Ok(None) => {
                        closed = true;
                        break;
                    }
                    Err(_) => break,
                }
            }
            on_refresh();
            if closed {
                break;
            }
        }
        tracing::debug!("refresh debouncer stopped");
    })
}

/// [`spawn_refresh_debouncer`] with the quiet period from `config`.
pub fn spawn_configured_debouncer<F>(
    rx: mpsc::UnboundedReceiver<FloppyNotification>,
    config: &DragOutConfig,
    on_refresh: F,
) -> JoinHandle<()>
where
    F: FnMut() + Send + 'static,
{
    spawn_refresh_debouncer(rx, config.refresh_debounce(), on_refresh)
}
