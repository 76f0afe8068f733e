use serde::Deserialize;
use serde_json::Value;

/// The `{ data, meta }` wrapper carried by every paginated collection.
#[derive(Debug, Deserialize)]
pub struct PaginatedEnvelope {
    pub data: Vec<Value>,
    pub meta: PageMeta,
}

/// Pagination metadata. `totalCount` is the authoritative element count.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageMeta {
    pub limit: u64,
    #[serde(rename = "totalCount")]
    pub total_count: u64,
}
