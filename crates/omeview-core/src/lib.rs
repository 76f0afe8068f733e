// omeview-core: Facade and caching layer between omeview-api and consumers
// (browsers, viewers, scripts).

pub mod config;
pub mod error;
pub mod orphaned;
pub mod repository;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ConfigError, ServerConfig};
pub use error::CoreError;
pub use orphaned::{OrphanedFolder, PopulationState};
pub use repository::Repository;

// API types consumers need alongside the facade.
pub use omeview_api::entities::{
    AnnotationGroup, EntityKind, EntityList, EntityRef, SearchQuery, SearchResult, ServerEntity,
    Shape,
};
pub use omeview_api::{
    CredentialProvider, Credentials, LoadMonitor, LoginOutcome, SessionDetails, TileRequest,
};
