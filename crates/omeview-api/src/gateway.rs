// Render/gateway endpoint family: icons, thumbnails, image metadata, and
// pixel tiles.
//
// Rendering parameters are fixed for a 3-channel RGB rendering; true
// multi-channel compositing is served by a different pixel source entirely.
// Tile retrieval has two addressing modes: explicit pixel regions on
// single-resolution images (resized client-side, the region endpoint does
// not guarantee exact output dimensions) and tile-grid coordinates on
// pyramidal images (returned exactly, no resize).

use std::sync::Arc;

use image::DynamicImage;
use image::imageops::FilterType;
use tracing::warn;
use url::Url;

use crate::entities::{EntityKind, ImageMetadata};
use crate::monitor::LoadMonitor;
use crate::transport::RequestSender;

const CHANNEL_SETTINGS: &str = "1|0:255$FF0000,2|0:255$00FF00,3|0:255$0000FF";
const MAPS_SETTINGS: &str =
    r#"[{"inverted":{"enabled":false}},{"inverted":{"enabled":false}},{"inverted":{"enabled":false}}]"#;

/// One tile of an image, in the coordinate space of its resolution level.
#[derive(Debug, Clone, Copy)]
pub struct TileRequest {
    /// Resolution level, 0 = full resolution. Ignored in single-resolution
    /// addressing.
    pub level: u32,
    /// Pixel x of the tile's top-left corner at this level.
    pub x: u32,
    pub y: u32,
    /// Output tile dimensions.
    pub width: u32,
    pub height: u32,
    pub z: u32,
    pub t: u32,
}

/// Client for the render/gateway endpoint family.
pub struct RenderApi {
    sender: Arc<RequestSender>,
    monitor: Arc<LoadMonitor>,
    host: Url,
}

impl RenderApi {
    pub fn new(sender: Arc<RequestSender>, monitor: Arc<LoadMonitor>, host: Url) -> Self {
        Self {
            sender,
            monitor,
            host,
        }
    }

    /// Fetch the static icon for one entity kind. `None` for wells, which
    /// have no icon, and on any fetch failure.
    pub async fn icon(&self, kind: EntityKind) -> Option<DynamicImage> {
        let path = match kind {
            EntityKind::Project => "static/webgateway/img/folder16.png",
            EntityKind::Dataset => "static/webgateway/img/folder_image16.png",
            EntityKind::OrphanedFolder => "static/webgateway/img/folder_yellow16.png",
            EntityKind::Image => "static/webclient/image/image16.png",
            EntityKind::Screen => "static/webclient/image/folder_screen16.png",
            EntityKind::Plate => "static/webclient/image/folder_plate16.png",
            EntityKind::PlateAcquisition => "static/webclient/image/run16.png",
            EntityKind::Well => return None,
        };
        self.fetch_image(&format!("{}{path}", self.host)).await
    }

    /// Fetch the thumbnail of one image, `size` pixels on its long edge.
    pub async fn thumbnail(&self, image_id: i64, size: u32) -> Option<DynamicImage> {
        let _guard = self.monitor.begin_thumbnail_load();
        self.fetch_image(&format!(
            "{}webgateway/render_thumbnail/{image_id}/{size}",
            self.host
        ))
        .await
    }

    /// Full acquisition metadata of one image.
    pub async fn image_metadata(&self, image_id: i64) -> Option<ImageMetadata> {
        let url = parse_url(&format!("{}webgateway/imgData/{image_id}", self.host))?;
        match self.sender.get_json(&url).await {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!("cannot fetch metadata of image {image_id}: {e}");
                None
            }
        }
    }

    /// Read a tile from a single-resolution image by explicit pixel region.
    ///
    /// The fetched region is resized to the tile's own dimensions because
    /// the region endpoint may return a slightly different size. `smooth`
    /// selects linear interpolation over nearest-neighbour.
    pub async fn read_single_resolution_tile(
        &self,
        image_id: i64,
        tile: TileRequest,
        preferred_width: u32,
        preferred_height: u32,
        quality: f64,
        smooth: bool,
    ) -> Option<DynamicImage> {
        let url = format!(
            "{}webgateway/render_image_region/{image_id}/{}/{}/?region={},{},{preferred_width},{preferred_height}&{}",
            self.host,
            tile.z,
            tile.t,
            tile.x,
            tile.y,
            render_settings(quality),
        );

        let filter = if smooth {
            FilterType::Triangle
        } else {
            FilterType::Nearest
        };
        self.fetch_image(&url)
            .await
            .map(|image| image.resize_exact(tile.width, tile.height, filter))
    }

    /// Read a tile from a pyramidal image by level and tile-grid coordinates.
    ///
    /// Pixel coordinates are divided by the preferred tile dimensions to
    /// obtain grid indices; the server returns exact grid-aligned tiles, so
    /// no client-side resize is needed.
    pub async fn read_multi_resolution_tile(
        &self,
        image_id: i64,
        tile: TileRequest,
        preferred_width: u32,
        preferred_height: u32,
        quality: f64,
    ) -> Option<DynamicImage> {
        if preferred_width == 0 || preferred_height == 0 {
            warn!("rejecting tile request with zero preferred dimensions");
            return None;
        }

        let url = format!(
            "{}webgateway/render_image_region/{image_id}/{}/{}/?tile={},{},{},{preferred_width},{preferred_height}&{}",
            self.host,
            tile.z,
            tile.t,
            tile.level,
            tile.x / preferred_width,
            tile.y / preferred_height,
            render_settings(quality),
        );
        self.fetch_image(&url).await
    }

    async fn fetch_image(&self, raw_url: &str) -> Option<DynamicImage> {
        let url = parse_url(raw_url)?;
        match self.sender.get_image(&url).await {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("cannot fetch image at {url}: {e}");
                None
            }
        }
    }
}

/// The fixed rendering query: RGB channel mapping, non-inverted contrast
/// maps, color model, normal projection, and the JPEG quality factor.
fn render_settings(quality: f64) -> String {
    let channels: String = form_urlencoded::byte_serialize(CHANNEL_SETTINGS.as_bytes()).collect();
    let maps: String = form_urlencoded::byte_serialize(MAPS_SETTINGS.as_bytes()).collect();
    format!("c={channels}&maps={maps}&m=c&p=normal&q={quality}")
}

fn parse_url(raw: &str) -> Option<Url> {
    match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(e) => {
            warn!("cannot build gateway URL {raw}: {e}");
            None
        }
    }
}
