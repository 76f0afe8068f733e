// Entity listing operations.
//
// Every listing delegates to the pagination aggregator against a URL built
// from the discovered endpoint map. Failures never propagate: a listing
// that cannot be fetched is an empty list, logged. Each call holds an
// entities-loading guard so observers see a busy indicator; the guard is
// released on every exit path.

use serde_json::Value;
use tracing::warn;
use url::Url;

use super::CatalogApi;
use crate::entities::{Dataset, Group, Image, Owner, Plate, PlateAcquisition, Project, Screen, ServerEntity, Well};

fn parse_url(raw: &str) -> Option<Url> {
    match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(e) => {
            warn!("cannot build listing URL {raw}: {e}");
            None
        }
    }
}

macro_rules! filter_kind {
    ($entities:expr, $variant:ident) => {
        $entities
            .into_iter()
            .filter_map(|entity| match entity {
                ServerEntity::$variant(inner) => Some(inner),
                _ => None,
            })
            .collect()
    };
}

impl CatalogApi {
    /// All projects of the server, with child counts.
    pub async fn projects(&self) -> Vec<Project> {
        let url = format!("{}?childCount=true", self.endpoints().projects);
        filter_kind!(self.children(&url).await, Project)
    }

    /// Datasets with no parent project.
    pub async fn orphaned_datasets(&self) -> Vec<Dataset> {
        let url = format!("{}?childCount=true&orphaned=true", self.endpoints().datasets);
        filter_kind!(self.children(&url).await, Dataset)
    }

    /// Datasets of one project.
    pub async fn datasets(&self, project_id: i64) -> Vec<Dataset> {
        let url = format!(
            "{}{project_id}/datasets/?childCount=true",
            self.endpoints().projects
        );
        filter_kind!(self.children(&url).await, Dataset)
    }

    /// Images of one dataset.
    pub async fn images(&self, dataset_id: i64) -> Vec<Image> {
        let url = format!(
            "{}{dataset_id}/images/?childCount=true",
            self.endpoints().datasets
        );
        filter_kind!(self.children(&url).await, Image)
    }

    /// All screens of the server.
    pub async fn screens(&self) -> Vec<Screen> {
        let url = format!("{}?childCount=true", self.endpoints().screens);
        filter_kind!(self.children(&url).await, Screen)
    }

    /// Plates with no parent screen.
    pub async fn orphaned_plates(&self) -> Vec<Plate> {
        let url = format!("{}?childCount=true&orphaned=true", self.endpoints().plates);
        filter_kind!(self.children(&url).await, Plate)
    }

    /// Plates of one screen.
    pub async fn plates(&self, screen_id: i64) -> Vec<Plate> {
        let url = format!(
            "{}{screen_id}/plates/?childCount=true",
            self.endpoints().screens
        );
        filter_kind!(self.children(&url).await, Plate)
    }

    /// Plate acquisitions (runs) of one plate.
    pub async fn plate_acquisitions(&self, plate_id: i64) -> Vec<PlateAcquisition> {
        let url = format!(
            "{}{plate_id}/plateacquisitions/?childCount=true",
            self.endpoints().plates
        );
        filter_kind!(self.children(&url).await, PlateAcquisition)
    }

    /// Wells of one plate.
    pub async fn wells_of_plate(&self, plate_id: i64) -> Vec<Well> {
        let url = format!(
            "{}{plate_id}/wells/?childCount=true",
            self.endpoints().plates
        );
        filter_kind!(self.children(&url).await, Well)
    }

    /// Wells of one plate acquisition, addressed by well sample index.
    pub async fn wells_of_plate_acquisition(
        &self,
        plate_acquisition_id: i64,
        well_sample_index: u32,
    ) -> Vec<Well> {
        let url = format!(
            "{}{plate_acquisition_id}/wellsampleindex/{well_sample_index}/wells/?childCount=true",
            self.endpoints().plate_acquisitions
        );
        filter_kind!(self.children(&url).await, Well)
    }

    /// One image by id, including its pixel metadata.
    pub async fn image(&self, image_id: i64) -> Option<Image> {
        let url = parse_url(&format!("{}{image_id}", self.endpoints().images))?;
        let body: Value = match self.sender().get_json(&url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("cannot fetch image {image_id}: {e}");
                return None;
            }
        };
        match ServerEntity::from_value(body.get("data")?)? {
            ServerEntity::Image(image) => Some(image),
            other => {
                warn!("entity {image_id} is a {:?}, not an image", other.kind());
                None
            }
        }
    }

    /// All experimenter groups, each with its owners resolved through the
    /// group's experimenters link. A failed owner lookup leaves that group's
    /// owner list empty.
    pub async fn groups(&self) -> Vec<Group> {
        let elements = self.sender().get_paginated(&self.endpoints().groups).await;
        let mut groups: Vec<Group> = elements
            .iter()
            .filter_map(|element| match serde_json::from_value(element.clone()) {
                Ok(group) => Some(group),
                Err(e) => {
                    warn!("skipping unparseable group: {e}");
                    None
                }
            })
            .collect();

        for group in &mut groups {
            let Some(link) = group.experimenters_url.as_deref().and_then(parse_url) else {
                continue;
            };
            group.owners = self
                .sender()
                .get_paginated(&link)
                .await
                .iter()
                .filter_map(|element| serde_json::from_value(element.clone()).ok())
                .collect();
        }

        groups
    }

    /// All experimenters of the server.
    pub async fn owners(&self) -> Vec<Owner> {
        self.sender()
            .get_paginated(&self.endpoints().owners)
            .await
            .iter()
            .filter_map(|element| match serde_json::from_value(element.clone()) {
                Ok(owner) => Some(owner),
                Err(e) => {
                    warn!("skipping unparseable owner: {e}");
                    None
                }
            })
            .collect()
    }

    async fn children(&self, raw_url: &str) -> Vec<ServerEntity> {
        let Some(url) = parse_url(raw_url) else {
            return Vec::new();
        };

        let _guard = self.monitor().begin_entity_load();
        let elements = self.sender().get_paginated(&url).await;
        ServerEntity::from_values(&elements)
    }
}
