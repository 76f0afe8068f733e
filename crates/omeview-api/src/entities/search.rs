// Server-wide entity search through the webclient's search form.
//
// The form answers with an HTML fragment holding one table row per hit.
// Rows are scraped with fixed patterns matching how the webclient renders
// its result table; a row that does not match is dropped.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// A search form submission. `new` enables every field and entity kind;
/// callers narrow from there.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub query: String,
    pub search_names: bool,
    pub search_descriptions: bool,
    pub include_images: bool,
    pub include_datasets: bool,
    pub include_projects: bool,
    pub include_wells: bool,
    pub include_plates: bool,
    pub include_screens: bool,
    /// Restrict to one group; `None` searches across all groups.
    pub group_id: Option<i64>,
    /// Restrict to one owner; `None` searches across all owners.
    pub owner_id: Option<i64>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            search_names: true,
            search_descriptions: true,
            include_images: true,
            include_datasets: true,
            include_projects: true,
            include_wells: true,
            include_plates: true,
            include_screens: true,
            group_id: None,
            owner_id: None,
        }
    }

    /// The form's query string. Fields and datatypes are repeated keys;
    /// absent group/owner restrictions use the form's "everything" values.
    pub(crate) fn to_query_string(&self) -> String {
        let encoded: String = form_urlencoded::byte_serialize(self.query.as_bytes()).collect();
        let mut parts = vec![format!("query={encoded}")];

        for (enabled, field) in [
            (self.search_names, "name"),
            (self.search_descriptions, "description"),
        ] {
            if enabled {
                parts.push(format!("field={field}"));
            }
        }
        for (enabled, datatype) in [
            (self.include_images, "images"),
            (self.include_datasets, "datasets"),
            (self.include_projects, "projects"),
            (self.include_wells, "wells"),
            (self.include_plates, "plates"),
            (self.include_screens, "screens"),
        ] {
            if enabled {
                parts.push(format!("datatype={datatype}"));
            }
        }

        let group = self.group_id.map_or_else(String::new, |id| id.to_string());
        let owner = self.owner_id.map_or_else(|| "-1".into(), |id| id.to_string());
        parts.push(format!("searchGroup={group}"));
        parts.push(format!("ownedBy={owner}"));
        parts.push("useAcquisitionDate=false".into());
        parts.join("&")
    }
}

static ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<tr id="([a-z_]+)-(\d+)".*?</tr>"#).expect("row pattern is valid")
});
static NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<td class="desc"[^>]*><a[^>]*>(.*?)</a>"#).expect("name pattern is valid")
});
static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<td class="date"[^>]*>(.*?)</td>"#).expect("date pattern is valid")
});
static GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<td class="group"[^>]*>(.*?)</td>"#).expect("group pattern is valid")
});
static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<td[^>]*><a href="(.*?)""#).expect("link pattern is valid")
});

/// One search hit. Dates are kept as the webclient renders them.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub kind: String,
    pub id: i64,
    pub name: String,
    pub acquired: Option<String>,
    pub imported: Option<String>,
    pub group: Option<String>,
    pub link: Option<Url>,
}

impl SearchResult {
    /// Scrape every result row out of a search response. Relative links are
    /// resolved against `host`.
    pub fn from_html(body: &str, host: &Url) -> Vec<Self> {
        ROW.captures_iter(body)
            .filter_map(|row| {
                let kind = row.get(1)?.as_str().to_owned();
                let id = row.get(2)?.as_str().parse().ok()?;
                let chunk = row.get(0)?.as_str();

                let name = NAME
                    .captures(chunk)
                    .and_then(|c| c.get(1))
                    .map_or_else(|| "-".into(), |m| m.as_str().to_owned());
                let mut dates = DATE
                    .captures_iter(chunk)
                    .filter_map(|c| c.get(1))
                    .map(|m| m.as_str().to_owned());
                let acquired = dates.next();
                let imported = dates.next();
                let group = GROUP
                    .captures(chunk)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_owned());
                let link = LINK
                    .captures(chunk)
                    .and_then(|c| c.get(1))
                    .and_then(|m| host.join(m.as_str()).ok());

                Some(Self {
                    kind,
                    id,
                    name,
                    acquired,
                    imported,
                    group,
                    link,
                })
            })
            .collect()
    }
}
