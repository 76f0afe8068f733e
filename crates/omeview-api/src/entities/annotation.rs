// Annotations attached to catalog entities.
//
// The webclient's annotation listing delivers a flat array discriminated by
// a `class` member, next to the experimenters those annotations reference.
// The body is a closed tagged enum; an unrecognized class fails to parse and
// is skipped with a warning, never aborting the group.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Every annotation attached to one entity, plus the experimenters the
/// annotations' owner references point at.
#[derive(Debug, Clone, Default)]
pub struct AnnotationGroup {
    pub annotations: Vec<Annotation>,
    pub experimenters: Vec<Experimenter>,
}

impl AnnotationGroup {
    /// Parse a webclient annotation-listing body. Unparseable annotations
    /// are skipped; a body without the expected members yields an empty
    /// group.
    pub fn from_value(body: &Value) -> Self {
        let annotations = body
            .get("annotations")
            .and_then(Value::as_array)
            .map(|elements| {
                elements
                    .iter()
                    .filter_map(|element| match serde_json::from_value(element.clone()) {
                        Ok(annotation) => Some(annotation),
                        Err(e) => {
                            warn!("skipping unparseable annotation: {e}");
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let experimenters = body
            .get("experimenters")
            .and_then(Value::as_array)
            .map(|elements| {
                elements
                    .iter()
                    .filter_map(|element| serde_json::from_value(element.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            annotations,
            experimenters,
        }
    }

    /// Resolve an annotation's owner reference.
    pub fn experimenter(&self, id: i64) -> Option<&Experimenter> {
        self.experimenters.iter().find(|e| e.id == id)
    }
}

/// One annotation. The concrete payload lives in [`AnnotationBody`].
#[derive(Debug, Clone, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "ns", default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub owner: Option<ExperimenterRef>,
    #[serde(flatten)]
    pub body: AnnotationBody,
}

/// Reference to an experimenter in the group's `experimenters` list.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ExperimenterRef {
    pub id: i64,
}

/// The concrete payload of an annotation, one variant per known class.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "class")]
pub enum AnnotationBody {
    #[serde(rename = "CommentAnnotationI", alias = "comment")]
    Comment {
        #[serde(rename = "textValue", default)]
        text: Option<String>,
    },
    #[serde(rename = "TagAnnotationI", alias = "tag")]
    Tag {
        #[serde(rename = "textValue", default)]
        text: Option<String>,
    },
    /// Key/value pairs, transmitted as an array of two-element arrays.
    #[serde(rename = "MapAnnotationI", alias = "map")]
    Map {
        #[serde(default)]
        values: Vec<(String, String)>,
    },
    #[serde(rename = "FileAnnotationI", alias = "file")]
    File {
        #[serde(default)]
        file: Option<AttachedFile>,
    },
    /// A star rating, carried as the webclient's long-value annotation.
    #[serde(rename = "LongAnnotationI", alias = "rating")]
    Rating {
        #[serde(rename = "longValue", default)]
        value: Option<i64>,
    },
}

/// Metadata of a file attachment.
#[derive(Debug, Clone, Deserialize)]
pub struct AttachedFile {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub mimetype: Option<String>,
}

/// An experimenter as listed next to the annotations. This is the
/// webclient's wire format, distinct from the catalog's owner payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Experimenter {
    pub id: i64,
    #[serde(rename = "firstName", default)]
    pub first_name: Option<String>,
    #[serde(rename = "lastName", default)]
    pub last_name: Option<String>,
}

impl Experimenter {
    pub fn full_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => "-".into(),
        }
    }
}
