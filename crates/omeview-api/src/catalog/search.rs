// Server-wide search through the webclient's search form.

use tracing::warn;
use url::Url;

use super::CatalogApi;
use crate::entities::{SearchQuery, SearchResult};

impl CatalogApi {
    /// Run a search across the server. Empty on failure; rows the result
    /// table renders without a recognizable kind and id are dropped.
    pub async fn search(&self, query: &SearchQuery) -> Vec<SearchResult> {
        let raw = format!(
            "{}webclient/load_searching/form/?{}",
            self.host(),
            query.to_query_string()
        );
        let url = match Url::parse(&raw) {
            Ok(url) => url,
            Err(e) => {
                warn!("cannot build search URL {raw}: {e}");
                return Vec::new();
            }
        };

        match self.sender().get_text(&url).await {
            Ok(body) => SearchResult::from_html(&body, self.host()),
            Err(e) => {
                warn!("search for '{}' failed: {e}", query.query);
                Vec::new()
            }
        }
    }
}
