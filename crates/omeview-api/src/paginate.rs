// Pagination aggregation over the `{ data, meta: { limit, totalCount } }`
// envelope. Subsequent pages are requested by appending `offset=<n>` to the
// original query string and fetched concurrently; results are concatenated
// in offset order regardless of completion order.

use futures_util::future::join_all;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;
use url::Url;

use crate::entities::PaginatedEnvelope;
use crate::transport::RequestSender;

/// Body of a follow-up page. Only the `data` member matters; the envelope
/// metadata was already read from page one.
#[derive(Debug, Deserialize)]
struct PageBody {
    data: Vec<Value>,
}

impl RequestSender {
    /// Fetch every element of a paginated collection.
    ///
    /// `totalCount` is authoritative: pages are requested at offsets
    /// `limit, 2*limit, ...` strictly below it. A page that fails
    /// contributes zero elements (logged); an undershoot relative to
    /// `totalCount` is accepted with a warning rather than reported as an
    /// error. A failed first page yields an empty result.
    pub async fn get_paginated(&self, url: &Url) -> Vec<Value> {
        let first: PaginatedEnvelope = match self.get_json(url).await {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("cannot read paginated collection at {url}: {e}");
                return Vec::new();
            }
        };

        let total = first.meta.total_count;
        let mut elements = first.data;

        let offsets = page_offsets(first.meta.limit, total);
        if !offsets.is_empty() {
            let delimiter = if url.query().is_none_or(str::is_empty) {
                '?'
            } else {
                '&'
            };

            // One request per remaining offset, all in flight at once.
            // join_all preserves input order, so concatenation below is
            // already offset-ordered.
            let pages = join_all(offsets.into_iter().map(|offset| async move {
                let raw = format!("{url}{delimiter}offset={offset}");
                let page_url = match Url::parse(&raw) {
                    Ok(page_url) => page_url,
                    Err(e) => {
                        warn!("invalid page URL {raw}: {e}");
                        return Vec::new();
                    }
                };
                match self.get_json::<PageBody>(&page_url).await {
                    Ok(body) => body.data,
                    Err(e) => {
                        warn!("page at offset {offset} of {url} failed: {e}");
                        Vec::new()
                    }
                }
            }))
            .await;

            for page in pages {
                elements.extend(page);
            }
        }

        if (elements.len() as u64) < total {
            warn!(
                "paginated collection at {url} under-delivered: got {} of {total} elements",
                elements.len()
            );
        }

        elements
    }
}

/// Offsets of the pages remaining after page one: `limit, 2*limit, ...`
/// strictly below `total_count`.
fn page_offsets(limit: u64, total_count: u64) -> Vec<u64> {
    if limit == 0 {
        return Vec::new();
    }
    (1..)
        .map(|i| i * limit)
        .take_while(|offset| *offset < total_count)
        .collect()
}
