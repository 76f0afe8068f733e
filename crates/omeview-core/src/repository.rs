// Facade over the catalog and gateway APIs.
//
// Thumbnails and icons are memoized with a single-flight cell per key:
// concurrent misses for the same key collapse into one network fetch, and
// a failed fetch leaves nothing cached so the next request retries.

use std::sync::Arc;

use dashmap::DashMap;
use image::DynamicImage;
use tokio::sync::OnceCell;
use tracing::debug;

use omeview_api::entities::{
    AnnotationGroup, Dataset, EntityKind, EntityRef, Group, Image, ImageMetadata, Owner, Plate,
    PlateAcquisition, Project, Screen, SearchQuery, SearchResult, Shape, Well,
};
use omeview_api::{
    CatalogApi, CredentialProvider, Credentials, LoadMonitor, LoginOutcome, RenderApi,
    RequestSender, TileRequest, TransportConfig,
};

use crate::config::ServerConfig;
use crate::error::CoreError;

type ImageCell = Arc<OnceCell<Option<Arc<DynamicImage>>>>;

/// One connected image-repository server: catalog, gateway, caches, and the
/// shared load counters.
pub struct Repository {
    catalog: CatalogApi,
    render: RenderApi,
    monitor: Arc<LoadMonitor>,
    thumbnails: DashMap<i64, ImageCell>,
    icons: DashMap<EntityKind, ImageCell>,
    thumbnail_size: u32,
}

impl Repository {
    /// Connect to the server named in `config`.
    ///
    /// Runs the full session establishment; any failure there is fatal and
    /// the caller must call `connect` again with a fresh config.
    pub async fn connect(config: &ServerConfig) -> Result<Self, CoreError> {
        let host = config.base_url()?;

        let transport = TransportConfig {
            timeout: config.timeout(),
            ..TransportConfig::default()
        };
        let sender = Arc::new(RequestSender::new(&transport)?);
        let monitor = Arc::new(LoadMonitor::new());

        let catalog = CatalogApi::connect(
            Arc::clone(&sender),
            Arc::clone(&monitor),
            host.clone(),
            config.orphaned_batch_size,
        )
        .await?;
        let render = RenderApi::new(sender, Arc::clone(&monitor), host);

        debug!("repository connected to {}", config.url);
        Ok(Self::from_parts(
            catalog,
            render,
            monitor,
            config.thumbnail_size,
        ))
    }

    /// Assemble a repository from already-built API clients.
    pub fn from_parts(
        catalog: CatalogApi,
        render: RenderApi,
        monitor: Arc<LoadMonitor>,
        thumbnail_size: u32,
    ) -> Self {
        Self {
            catalog,
            render,
            monitor,
            thumbnails: DashMap::new(),
            icons: DashMap::new(),
            thumbnail_size,
        }
    }

    pub fn monitor(&self) -> &Arc<LoadMonitor> {
        &self.monitor
    }

    pub fn catalog(&self) -> &CatalogApi {
        &self.catalog
    }

    pub fn render(&self) -> &RenderApi {
        &self.render
    }

    // ── Authentication ──────────────────────────────────────────────

    pub async fn login(
        &self,
        credentials: Option<Credentials>,
        prompt: &dyn CredentialProvider,
    ) -> LoginOutcome {
        self.catalog.login(credentials, prompt).await
    }

    pub async fn can_skip_authentication(&self) -> bool {
        self.catalog.can_skip_authentication().await
    }

    // ── Listings ────────────────────────────────────────────────────

    pub async fn projects(&self) -> Vec<Project> {
        self.catalog.projects().await
    }

    pub async fn orphaned_datasets(&self) -> Vec<Dataset> {
        self.catalog.orphaned_datasets().await
    }

    pub async fn datasets(&self, project_id: i64) -> Vec<Dataset> {
        self.catalog.datasets(project_id).await
    }

    pub async fn images(&self, dataset_id: i64) -> Vec<Image> {
        self.catalog.images(dataset_id).await
    }

    pub async fn screens(&self) -> Vec<Screen> {
        self.catalog.screens().await
    }

    pub async fn orphaned_plates(&self) -> Vec<Plate> {
        self.catalog.orphaned_plates().await
    }

    pub async fn plates(&self, screen_id: i64) -> Vec<Plate> {
        self.catalog.plates(screen_id).await
    }

    pub async fn plate_acquisitions(&self, plate_id: i64) -> Vec<PlateAcquisition> {
        self.catalog.plate_acquisitions(plate_id).await
    }

    pub async fn wells_of_plate(&self, plate_id: i64) -> Vec<Well> {
        self.catalog.wells_of_plate(plate_id).await
    }

    pub async fn wells_of_plate_acquisition(
        &self,
        plate_acquisition_id: i64,
        well_sample_index: u32,
    ) -> Vec<Well> {
        self.catalog
            .wells_of_plate_acquisition(plate_acquisition_id, well_sample_index)
            .await
    }

    pub async fn image(&self, image_id: i64) -> Option<Image> {
        self.catalog.image(image_id).await
    }

    pub async fn groups(&self) -> Vec<Group> {
        self.catalog.groups().await
    }

    pub async fn owners(&self) -> Vec<Owner> {
        self.catalog.owners().await
    }

    pub async fn annotations(&self, entity: EntityRef) -> Option<AnnotationGroup> {
        self.catalog.annotations(entity).await
    }

    pub async fn search(&self, query: &SearchQuery) -> Vec<SearchResult> {
        self.catalog.search(query).await
    }

    // ── Cached images ───────────────────────────────────────────────

    /// Thumbnail of one image at the configured size, memoized by id.
    pub async fn thumbnail(&self, image_id: i64) -> Option<Arc<DynamicImage>> {
        let cell = self
            .thumbnails
            .entry(image_id)
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let result = cell
            .get_or_init(|| async {
                self.render
                    .thumbnail(image_id, self.thumbnail_size)
                    .await
                    .map(Arc::new)
            })
            .await
            .clone();

        if result.is_none() {
            // No negative caching: drop the cell (if still ours) so the
            // next request retries the fetch.
            self.thumbnails
                .remove_if(&image_id, |_, current| Arc::ptr_eq(current, &cell));
        }
        result
    }

    /// Icon for one entity kind, memoized by kind.
    pub async fn icon(&self, kind: EntityKind) -> Option<Arc<DynamicImage>> {
        let cell = self
            .icons
            .entry(kind)
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let result = cell
            .get_or_init(|| async { self.render.icon(kind).await.map(Arc::new) })
            .await
            .clone();

        if result.is_none() {
            self.icons
                .remove_if(&kind, |_, current| Arc::ptr_eq(current, &cell));
        }
        result
    }

    // ── Pixels & metadata ───────────────────────────────────────────

    pub async fn image_metadata(&self, image_id: i64) -> Option<ImageMetadata> {
        self.render.image_metadata(image_id).await
    }

    pub async fn read_single_resolution_tile(
        &self,
        image_id: i64,
        tile: TileRequest,
        preferred_width: u32,
        preferred_height: u32,
        quality: f64,
        smooth: bool,
    ) -> Option<DynamicImage> {
        self.render
            .read_single_resolution_tile(
                image_id,
                tile,
                preferred_width,
                preferred_height,
                quality,
                smooth,
            )
            .await
    }

    pub async fn read_multi_resolution_tile(
        &self,
        image_id: i64,
        tile: TileRequest,
        preferred_width: u32,
        preferred_height: u32,
        quality: f64,
    ) -> Option<DynamicImage> {
        self.render
            .read_multi_resolution_tile(image_id, tile, preferred_width, preferred_height, quality)
            .await
    }

    // ── ROIs ────────────────────────────────────────────────────────

    pub async fn rois(&self, image_id: i64) -> Vec<Shape> {
        self.catalog.rois(image_id).await
    }

    /// Write `shapes` as the ROIs of one image.
    ///
    /// With `remove_existing`, the current ROIs are fetched first and sent
    /// as the removal set; that fetch failing degrades to "nothing removed"
    /// rather than failing the operation. Overall success is the write
    /// step's success alone.
    pub async fn replace_rois(
        &self,
        image_id: i64,
        shapes: &[Shape],
        remove_existing: bool,
    ) -> bool {
        let to_remove = if remove_existing {
            self.catalog.rois(image_id).await
        } else {
            Vec::new()
        };
        self.catalog.write_rois(image_id, shapes, &to_remove).await
    }
}
