use crate::manager::StateWatcher;
use crate::tracker::PlaybackState;

use anyhow::{Result, anyhow};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Handle to a running watcher, returned by [`crate::start`].
///
/// Dropping the handle also stops the browse loop, but without waiting for it.
pub struct WatcherHandle {
    pub(crate) watcher: Arc<StateWatcher>,
    pub(crate) shutdown_tx: oneshot::Sender<()>,
    pub(crate) task: JoinHandle<Result<()>>,
}

impl WatcherHandle {
    /// Most recently observed playback state, if any announcement has been classified.
    pub async fn current_state(&self) -> Option<PlaybackState> {
        self.watcher.current_state().await
    }

    /// True once the browse loop has exited, e.g. because the daemon died.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops browsing, releases the mDNS daemon and waits for the loop to exit.
    pub async fn shutdown(self) -> Result<()> {
        // The loop may already be gone; its result is reported below.
        let _ = self.shutdown_tx.send(());
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(anyhow!("watcher task failed: {}", e)),
        }
    }
}
