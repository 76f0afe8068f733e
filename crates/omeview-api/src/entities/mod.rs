// Wire-format DTOs for the catalog and gateway endpoint families.
//
// Entities are immutable value objects constructed atomically from complete
// JSON payloads; a partially populated entity is never exposed.

pub mod annotation;
pub mod entity;
pub mod envelope;
pub mod list;
pub mod metadata;
pub mod permissions;
pub mod search;
pub mod shape;

pub use annotation::{Annotation, AnnotationBody, AnnotationGroup, AttachedFile, Experimenter};
pub use entity::{
    Dataset, EntityKind, EntityRef, Image, PhysicalSize, PixelInfo, Plate, PlateAcquisition,
    Project, Screen, ServerEntity, Well,
};
pub use envelope::{PageMeta, PaginatedEnvelope};
pub use list::EntityList;
pub use metadata::{ImageMetadata, PixelKind};
pub use permissions::{Group, Owner};
pub use search::{SearchQuery, SearchResult};
pub use shape::{Shape, ShapeGeometry};
