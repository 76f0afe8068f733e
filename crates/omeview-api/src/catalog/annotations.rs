// Annotation listing for one catalog entity.
//
// Annotations live on the webclient surface, not the JSON API: the listing
// is addressed by a per-kind query key rather than a discovered endpoint.

use serde_json::Value;
use tracing::warn;
use url::Url;

use super::CatalogApi;
use crate::entities::{AnnotationGroup, EntityKind, EntityRef};

/// The webclient's query key for one entity kind. The synthetic orphaned
/// folder has no server-side annotations.
fn annotation_key(kind: EntityKind) -> Option<&'static str> {
    match kind {
        EntityKind::Project => Some("project"),
        EntityKind::Dataset => Some("dataset"),
        EntityKind::Image => Some("image"),
        EntityKind::Screen => Some("screen"),
        EntityKind::Plate => Some("plate"),
        EntityKind::PlateAcquisition => Some("acquisition"),
        EntityKind::Well => Some("well"),
        EntityKind::OrphanedFolder => None,
    }
}

impl CatalogApi {
    /// Every annotation attached to one entity, with the experimenters
    /// they reference. `None` for the orphaned folder and on any failure.
    pub async fn annotations(&self, entity: EntityRef) -> Option<AnnotationGroup> {
        let key = annotation_key(entity.kind)?;
        let raw = format!(
            "{}webclient/api/annotations/?{key}={}",
            self.host(),
            entity.id
        );
        let url = match Url::parse(&raw) {
            Ok(url) => url,
            Err(e) => {
                warn!("cannot build annotation listing URL {raw}: {e}");
                return None;
            }
        };

        match self.sender().get_json::<Value>(&url).await {
            Ok(body) => Some(AnnotationGroup::from_value(&body)),
            Err(e) => {
                warn!("cannot fetch annotations of {:?} {}: {e}", entity.kind, entity.id);
                None
            }
        }
    }
}
