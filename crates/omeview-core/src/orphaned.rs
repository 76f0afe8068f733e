// The synthetic container for parent-less datasets and images.
//
// The child count is resolved eagerly at construction from two quick
// requests (dataset listing, image id enumeration), so the UI can show an
// approximate count long before any per-image detail fetch completes.
// The content itself is populated lazily, on first child-list access.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use omeview_api::entities::{EntityList, ServerEntity};

use crate::repository::Repository;

pub const ORPHANED_FOLDER_NAME: &str = "Orphaned images";

/// Lifecycle of the folder's content. Counts may be known in any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulationState {
    Unpopulated,
    Populating,
    Populated,
}

/// Lazily-populated tree node holding every orphaned dataset and image.
pub struct OrphanedFolder {
    repository: Arc<Repository>,
    children: Arc<EntityList>,
    state: watch::Sender<PopulationState>,
    dataset_count: watch::Sender<usize>,
    image_count: watch::Sender<usize>,
}

impl OrphanedFolder {
    /// Create the folder and start resolving its child count in the
    /// background. Content is not fetched until [`children`](Self::children)
    /// is first called.
    pub fn new(repository: Arc<Repository>) -> Arc<Self> {
        let folder = Arc::new(Self {
            repository,
            children: Arc::new(EntityList::new()),
            state: watch::channel(PopulationState::Unpopulated).0,
            dataset_count: watch::channel(0).0,
            image_count: watch::channel(0).0,
        });

        let this = Arc::clone(&folder);
        tokio::spawn(async move {
            let datasets = this.repository.orphaned_datasets().await.len();
            this.dataset_count.send_modify(|n| *n = datasets);

            let images = this.repository.catalog().orphaned_image_count().await;
            this.image_count.send_modify(|n| *n = images);
            debug!("orphaned folder holds {datasets} datasets and {images} images");
        });

        folder
    }

    pub fn name(&self) -> &'static str {
        ORPHANED_FOLDER_NAME
    }

    /// Known child count: orphaned datasets plus orphaned images. Available
    /// before any content is populated; zero until the count requests land.
    pub fn child_count(&self) -> usize {
        *self.dataset_count.borrow() + *self.image_count.borrow()
    }

    pub fn subscribe_dataset_count(&self) -> watch::Receiver<usize> {
        self.dataset_count.subscribe()
    }

    pub fn subscribe_image_count(&self) -> watch::Receiver<usize> {
        self.image_count.subscribe()
    }

    pub fn state(&self) -> PopulationState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PopulationState> {
        self.state.subscribe()
    }

    /// The folder's content list. The first call flips the folder to
    /// `Populating` and starts the background load: orphaned datasets are
    /// appended first, then images stream in batch by batch. Later calls
    /// return the same list without re-triggering anything.
    pub fn children(self: &Arc<Self>) -> Arc<EntityList> {
        let started = self.state.send_if_modified(|state| {
            if *state == PopulationState::Unpopulated {
                *state = PopulationState::Populating;
                true
            } else {
                false
            }
        });

        if started {
            let this = Arc::clone(self);
            tokio::spawn(async move {
                let datasets = this.repository.orphaned_datasets().await;
                this.children
                    .extend(datasets.into_iter().map(ServerEntity::Dataset));

                this.repository
                    .catalog()
                    .populate_orphaned_images(&this.children)
                    .await;

                this.state
                    .send_modify(|state| *state = PopulationState::Populated);
            });
        }

        Arc::clone(&self.children)
    }
}
