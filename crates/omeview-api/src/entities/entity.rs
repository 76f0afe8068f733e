// Repository entities returned by the catalog API.
//
// The server discriminates entity payloads with an `@type` member holding an
// OME schema URL. The closed `ServerEntity` enum matches one variant per
// concrete kind; adding a new kind is a one-site change here.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

const SCHEMA: &str = "http://www.openmicroscopy.org/Schemas/OME/2016-06";

/// The kind of a repository entity. Used as an icon-cache key and for
/// hierarchy traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Project,
    Dataset,
    Image,
    Screen,
    Plate,
    PlateAcquisition,
    Well,
    /// The synthetic parent-less container; not a server-side entity.
    OrphanedFolder,
}

/// A (kind, id) pair identifying one repository entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: i64,
}

/// Any entity the catalog API can return, discriminated by `@type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "@type")]
pub enum ServerEntity {
    #[serde(rename = "http://www.openmicroscopy.org/Schemas/OME/2016-06#Project")]
    Project(Project),
    #[serde(rename = "http://www.openmicroscopy.org/Schemas/OME/2016-06#Dataset")]
    Dataset(Dataset),
    #[serde(rename = "http://www.openmicroscopy.org/Schemas/OME/2016-06#Image")]
    Image(Image),
    #[serde(rename = "http://www.openmicroscopy.org/Schemas/OME/2016-06#Screen")]
    Screen(Screen),
    #[serde(rename = "http://www.openmicroscopy.org/Schemas/OME/2016-06#Plate")]
    Plate(Plate),
    #[serde(rename = "http://www.openmicroscopy.org/Schemas/OME/2016-06#PlateAcquisition")]
    PlateAcquisition(PlateAcquisition),
    #[serde(rename = "http://www.openmicroscopy.org/Schemas/OME/2016-06#Well")]
    Well(Well),
}

impl ServerEntity {
    /// Parse one entity from a raw JSON element. Unrecognized or malformed
    /// payloads yield `None` with a warning; they never abort a batch.
    pub fn from_value(value: &Value) -> Option<Self> {
        match serde_json::from_value(value.clone()) {
            Ok(entity) => Some(entity),
            Err(e) => {
                let kind = value
                    .get("@type")
                    .and_then(Value::as_str)
                    .unwrap_or("<no @type>");
                warn!("skipping unparseable entity of type {kind}: {e}");
                None
            }
        }
    }

    /// Parse a whole page of raw elements, skipping anything unrecognized.
    pub fn from_values(values: &[Value]) -> Vec<Self> {
        values.iter().filter_map(Self::from_value).collect()
    }

    pub fn id(&self) -> i64 {
        match self {
            Self::Project(e) => e.id,
            Self::Dataset(e) => e.id,
            Self::Image(e) => e.id,
            Self::Screen(e) => e.id,
            Self::Plate(e) => e.id,
            Self::PlateAcquisition(e) => e.id,
            Self::Well(e) => e.id,
        }
    }

    pub fn name(&self) -> &str {
        let name = match self {
            Self::Project(e) => &e.name,
            Self::Dataset(e) => &e.name,
            Self::Image(e) => &e.name,
            Self::Screen(e) => &e.name,
            Self::Plate(e) => &e.name,
            Self::PlateAcquisition(e) => &e.name,
            Self::Well(e) => &e.name,
        };
        name.as_deref().unwrap_or("-")
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Project(_) => EntityKind::Project,
            Self::Dataset(_) => EntityKind::Dataset,
            Self::Image(_) => EntityKind::Image,
            Self::Screen(_) => EntityKind::Screen,
            Self::Plate(_) => EntityKind::Plate,
            Self::PlateAcquisition(_) => EntityKind::PlateAcquisition,
            Self::Well(_) => EntityKind::Well,
        }
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef {
            kind: self.kind(),
            id: self.id(),
        }
    }

    /// Reported child count, where the listing was requested with
    /// `childCount=true`. Images and wells have no children.
    pub fn child_count(&self) -> u64 {
        match self {
            Self::Project(e) => e.child_count,
            Self::Dataset(e) => e.child_count,
            Self::Screen(e) => e.child_count,
            Self::Plate(e) => e.child_count,
            Self::PlateAcquisition(e) => e.child_count,
            Self::Image(_) | Self::Well(_) => 0,
        }
    }

    /// The schema URL the server uses to discriminate this kind.
    pub fn schema_type(kind: EntityKind) -> Option<String> {
        let suffix = match kind {
            EntityKind::Project => "Project",
            EntityKind::Dataset => "Dataset",
            EntityKind::Image => "Image",
            EntityKind::Screen => "Screen",
            EntityKind::Plate => "Plate",
            EntityKind::PlateAcquisition => "PlateAcquisition",
            EntityKind::Well => "Well",
            EntityKind::OrphanedFolder => return None,
        };
        Some(format!("{SCHEMA}#{suffix}"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    #[serde(rename = "@id")]
    pub id: i64,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "omero:childCount", default)]
    pub child_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Dataset {
    #[serde(rename = "@id")]
    pub id: i64,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "omero:childCount", default)]
    pub child_count: u64,
}

/// An image entity, including the pixel metadata returned by a detail fetch.
#[derive(Debug, Clone, Deserialize)]
pub struct Image {
    #[serde(rename = "@id")]
    pub id: i64,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    /// Milliseconds since the epoch; absent when the acquisition date is unknown.
    #[serde(rename = "AcquisitionDate", default)]
    pub acquisition_date: Option<i64>,
    #[serde(rename = "Pixels", default)]
    pub pixels: Option<PixelInfo>,
}

impl Image {
    /// (width, height, z-slices, channels, time points), or `None` when the
    /// pixel metadata has not been delivered.
    pub fn dimensions(&self) -> Option<[u32; 5]> {
        self.pixels
            .as_ref()
            .map(|p| [p.size_x, p.size_y, p.size_z, p.size_c, p.size_t])
    }

    /// Pixel value format (e.g. `uint8`), as reported by the server.
    pub fn pixel_type(&self) -> Option<&str> {
        self.pixels
            .as_ref()
            .and_then(|p| p.pixel_type.as_ref())
            .map(|t| t.value.as_str())
    }
}

/// Pixel-level metadata nested inside an image payload.
#[derive(Debug, Clone, Deserialize)]
pub struct PixelInfo {
    #[serde(rename = "SizeX")]
    pub size_x: u32,
    #[serde(rename = "SizeY")]
    pub size_y: u32,
    #[serde(rename = "SizeZ")]
    pub size_z: u32,
    #[serde(rename = "SizeC")]
    pub size_c: u32,
    #[serde(rename = "SizeT")]
    pub size_t: u32,
    #[serde(rename = "PhysicalSizeX", default)]
    pub physical_size_x: Option<PhysicalSize>,
    #[serde(rename = "PhysicalSizeY", default)]
    pub physical_size_y: Option<PhysicalSize>,
    #[serde(rename = "PhysicalSizeZ", default)]
    pub physical_size_z: Option<PhysicalSize>,
    #[serde(rename = "Type", default)]
    pub pixel_type: Option<PixelTypeName>,
}

/// A physical length with its unit symbol (e.g. `0.25 µm`).
#[derive(Debug, Clone, Deserialize)]
pub struct PhysicalSize {
    #[serde(rename = "Symbol", default)]
    pub symbol: Option<String>,
    #[serde(rename = "Value")]
    pub value: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PixelTypeName {
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Screen {
    #[serde(rename = "@id")]
    pub id: i64,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "omero:childCount", default)]
    pub child_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Plate {
    #[serde(rename = "@id")]
    pub id: i64,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "omero:childCount", default)]
    pub child_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlateAcquisition {
    #[serde(rename = "@id")]
    pub id: i64,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "omero:childCount", default)]
    pub child_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Well {
    #[serde(rename = "@id")]
    pub id: i64,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Row", default)]
    pub row: Option<u32>,
    #[serde(rename = "Column", default)]
    pub column: Option<u32>,
}
