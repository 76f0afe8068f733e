// Full per-image acquisition metadata, as served by the gateway's
// `imgData` document (distinct from the catalog's `Pixels` block).

use serde::Deserialize;

/// Metadata for one image: dimensions, physical pixel sizes, pixel type,
/// and the resolution pyramid description.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageMetadata {
    pub id: i64,
    pub size: ImageSize,
    #[serde(default)]
    pub meta: ImageMeta,
    #[serde(default)]
    pub pixel_size: Option<PixelSpacing>,
    /// Number of resolution levels; absent for single-resolution images.
    #[serde(default)]
    pub levels: Option<u32>,
    #[serde(default)]
    pub tiles: bool,
    #[serde(default)]
    pub tile_size: Option<TileSize>,
}

impl ImageMetadata {
    /// Whether the server exposes a multi-resolution pyramid for this image.
    pub fn is_multi_resolution(&self) -> bool {
        self.tiles && self.levels.is_some_and(|levels| levels > 1)
    }

    /// The pixel type, parsed into a known kind.
    pub fn pixel_kind(&self) -> Option<PixelKind> {
        self.meta
            .pixels_type
            .as_deref()
            .and_then(PixelKind::parse)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
    pub z: u32,
    pub t: u32,
    pub c: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageMeta {
    #[serde(rename = "imageName", default)]
    pub image_name: Option<String>,
    #[serde(rename = "pixelsType", default)]
    pub pixels_type: Option<String>,
}

/// Physical pixel spacing in micrometres.
#[derive(Debug, Clone, Deserialize)]
pub struct PixelSpacing {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub z: Option<f64>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TileSize {
    pub width: u32,
    pub height: u32,
}

/// Pixel value formats the server can report. Anything else is treated as
/// unsupported data and skipped with a warning by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelKind {
    Uint8,
    Int8,
    Uint16,
    Int16,
    Uint32,
    Int32,
    Float32,
    Float64,
}

impl PixelKind {
    /// Map the server's pixel-type string to a known kind.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "uint8" => Some(Self::Uint8),
            "int8" => Some(Self::Int8),
            "uint16" => Some(Self::Uint16),
            "int16" => Some(Self::Int16),
            "uint32" => Some(Self::Uint32),
            "int32" => Some(Self::Int32),
            "float" => Some(Self::Float32),
            "double" => Some(Self::Float64),
            _ => None,
        }
    }

    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::Uint8 | Self::Int8 => 1,
            Self::Uint16 | Self::Int16 => 2,
            Self::Uint32 | Self::Int32 | Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }
}
