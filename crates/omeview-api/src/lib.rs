// omeview-api: Async Rust client for OMERO-style image-repository web APIs
// (entity catalog + render/gateway + ROI persistence)

pub mod catalog;
pub mod entities;
pub mod error;
pub mod gateway;
pub mod monitor;
mod paginate;
pub mod transport;

pub use catalog::{
    CatalogApi, CredentialProvider, Credentials, DEFAULT_ORPHANED_BATCH_SIZE, LoginOutcome,
    SessionDetails,
};
pub use error::Error;
pub use gateway::{RenderApi, TileRequest};
pub use monitor::LoadMonitor;
pub use transport::{RequestSender, TransportConfig};
