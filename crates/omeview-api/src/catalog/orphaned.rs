// Orphaned-image enumeration and batched population.
//
// The id enumeration is one request; the per-image detail fetches are bounded
// to `orphaned_batch_size` in flight at once so a large orphaned set does not
// exhaust the connection pool or trip server-side throttling. Entities are
// appended to the target batch by batch, so an observer bound to the target
// sees partial results stream in.

use futures_util::future::join_all;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::CatalogApi;
use crate::entities::{EntityList, ServerEntity};

#[derive(Debug, Deserialize)]
struct OrphanedIdList {
    images: Vec<OrphanedIdEntry>,
}

#[derive(Debug, Deserialize)]
struct OrphanedIdEntry {
    id: i64,
}

impl CatalogApi {
    /// Ids of every image with no parent dataset. Empty on failure.
    pub async fn orphaned_image_ids(&self) -> Vec<i64> {
        let raw = format!("{}webclient/api/images/?orphaned=true", self.host());
        let url = match Url::parse(&raw) {
            Ok(url) => url,
            Err(e) => {
                warn!("cannot build orphaned-image listing URL {raw}: {e}");
                return Vec::new();
            }
        };

        match self.sender().get_json::<OrphanedIdList>(&url).await {
            Ok(list) => list.images.into_iter().map(|entry| entry.id).collect(),
            Err(e) => {
                warn!("cannot enumerate orphaned images: {e}");
                Vec::new()
            }
        }
    }

    /// Number of orphaned images, known before any detail fetch.
    pub async fn orphaned_image_count(&self) -> usize {
        self.orphaned_image_ids().await.len()
    }

    /// Fetch every orphaned image's details and append them to `target`.
    ///
    /// Details are fetched in bounded batches; after each batch the
    /// loaded-so-far counter advances by the batch size, counting failed
    /// fetches as attempted, so observers can track progress against the
    /// total id count. The loading flag stays set for the whole run.
    pub async fn populate_orphaned_images(&self, target: &EntityList) {
        let _run = self.monitor().begin_orphaned_run();

        let detail_urls: Vec<Url> = self
            .orphaned_image_ids()
            .await
            .into_iter()
            .filter_map(|id| {
                let raw = format!("{}{id}", self.endpoints().images);
                match Url::parse(&raw) {
                    Ok(url) => Some(url),
                    Err(e) => {
                        warn!("cannot build detail URL for orphaned image {id}: {e}");
                        None
                    }
                }
            })
            .collect();
        debug!("populating {} orphaned images", detail_urls.len());

        for batch in detail_urls.chunks(self.orphaned_batch_size()) {
            let images: Vec<ServerEntity> =
                join_all(batch.iter().map(|url| self.fetch_image_detail(url)))
                    .await
                    .into_iter()
                    .flatten()
                    .collect();

            target.extend(images);
            self.monitor().add_orphaned_attempted(batch.len());
        }
    }

    async fn fetch_image_detail(&self, url: &Url) -> Option<ServerEntity> {
        let body: Value = match self.sender().get_json(url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("orphaned image detail at {url} failed: {e}");
                return None;
            }
        };

        let entity = ServerEntity::from_value(body.get("data")?)?;
        matches!(entity, ServerEntity::Image(_)).then_some(entity)
    }
}
