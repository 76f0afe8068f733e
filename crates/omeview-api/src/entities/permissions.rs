use serde::Deserialize;

/// An experimenter group. Its members are resolved through a follow-up
/// request against the group's experimenters link.
#[derive(Debug, Clone, Deserialize)]
pub struct Group {
    #[serde(rename = "@id")]
    pub id: i64,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "url:experimenters", default)]
    pub experimenters_url: Option<String>,
    /// Filled after construction from the experimenters link; empty when the
    /// follow-up request failed.
    #[serde(skip)]
    pub owners: Vec<Owner>,
}

/// An entity owner (experimenter).
#[derive(Debug, Clone, Deserialize)]
pub struct Owner {
    #[serde(rename = "@id")]
    pub id: i64,
    #[serde(rename = "FirstName", default)]
    pub first_name: Option<String>,
    #[serde(rename = "LastName", default)]
    pub last_name: Option<String>,
}

impl Owner {
    pub fn full_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => "-".into(),
        }
    }
}
