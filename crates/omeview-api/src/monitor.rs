// Live load-progress counters.
//
// Every mutation goes through `watch::Sender::send_modify`, which serializes
// concurrent updates; readers subscribe and observe a consistent sequence.
// In-flight tracking uses an RAII guard so the counter is decremented on
// every exit path, including early returns on transport failure.

use tokio::sync::watch;

/// Observable progress counters for catalog requests and the orphaned-image
/// population run.
#[derive(Debug)]
pub struct LoadMonitor {
    entities_loading: watch::Sender<usize>,
    thumbnails_loading: watch::Sender<usize>,
    orphaned_loading: watch::Sender<bool>,
    orphaned_loaded: watch::Sender<usize>,
}

impl LoadMonitor {
    pub fn new() -> Self {
        Self {
            entities_loading: watch::channel(0).0,
            thumbnails_loading: watch::channel(0).0,
            orphaned_loading: watch::channel(false).0,
            orphaned_loaded: watch::channel(0).0,
        }
    }

    /// Mark one entity request as in flight. The returned guard releases the
    /// slot when dropped.
    pub fn begin_entity_load(&self) -> LoadingGuard<'_> {
        self.entities_loading.send_modify(|n| *n += 1);
        LoadingGuard {
            counter: &self.entities_loading,
        }
    }

    /// Mark one thumbnail fetch as in flight.
    pub fn begin_thumbnail_load(&self) -> LoadingGuard<'_> {
        self.thumbnails_loading.send_modify(|n| *n += 1);
        LoadingGuard {
            counter: &self.thumbnails_loading,
        }
    }

    /// Number of entity requests currently in flight.
    pub fn entities_loading(&self) -> watch::Receiver<usize> {
        self.entities_loading.subscribe()
    }

    /// Number of thumbnail fetches currently in flight.
    pub fn thumbnails_loading(&self) -> watch::Receiver<usize> {
        self.thumbnails_loading.subscribe()
    }

    /// Whether an orphaned-image population run is in progress.
    pub fn orphaned_images_loading(&self) -> watch::Receiver<bool> {
        self.orphaned_loading.subscribe()
    }

    /// Number of orphaned images attempted so far in the current run.
    pub fn orphaned_images_loaded(&self) -> watch::Receiver<usize> {
        self.orphaned_loaded.subscribe()
    }

    pub(crate) fn begin_orphaned_run(&self) -> OrphanedRunGuard<'_> {
        self.orphaned_loaded.send_modify(|n| *n = 0);
        self.orphaned_loading.send_modify(|on| *on = true);
        OrphanedRunGuard {
            flag: &self.orphaned_loading,
        }
    }

    /// Account for one completed batch. Failed fetches within the batch are
    /// still counted as attempted.
    pub(crate) fn add_orphaned_attempted(&self, count: usize) {
        self.orphaned_loaded.send_modify(|n| *n += count);
    }
}

impl Default for LoadMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the in-flight entity counter on drop.
pub struct LoadingGuard<'a> {
    counter: &'a watch::Sender<usize>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.counter.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// Clears the orphaned-loading flag on drop.
pub(crate) struct OrphanedRunGuard<'a> {
    flag: &'a watch::Sender<bool>,
}

impl Drop for OrphanedRunGuard<'_> {
    fn drop(&mut self) {
        self.flag.send_modify(|on| *on = false);
    }
}
