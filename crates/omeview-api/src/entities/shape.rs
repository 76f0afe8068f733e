// Region-of-interest shapes.
//
// Shapes arrive nested inside ROI payloads and are written back through the
// ROI-persistence endpoint, so they both deserialize and serialize. The
// geometry is a closed `@type`-tagged enum; an unrecognized shape kind fails
// to parse and is skipped by the caller, never aborting the batch.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// One shape of a region of interest.
///
/// `roi_id` is a back-reference to the annotation the shape was delivered
/// in, not an ownership relation; it is attached at parse time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shape {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "oldId", default, skip_serializing_if = "Option::is_none")]
    pub roi_id: Option<i64>,
    #[serde(rename = "Text", default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "TheZ", default, skip_serializing_if = "Option::is_none")]
    pub z: Option<u32>,
    #[serde(rename = "TheT", default, skip_serializing_if = "Option::is_none")]
    pub t: Option<u32>,
    #[serde(rename = "TheC", default, skip_serializing_if = "Option::is_none")]
    pub c: Option<u32>,
    #[serde(flatten)]
    pub geometry: ShapeGeometry,
}

impl Shape {
    /// Parse one shape from a raw JSON element, attaching the id of the
    /// annotation it came from. Unparseable shapes yield `None` with a
    /// warning.
    pub fn from_value(value: &Value, roi_id: i64) -> Option<Self> {
        match serde_json::from_value::<Self>(value.clone()) {
            Ok(mut shape) => {
                shape.roi_id = Some(roi_id);
                Some(shape)
            }
            Err(e) => {
                warn!("skipping unparseable shape in ROI {roi_id}: {e}");
                None
            }
        }
    }
}

/// Geometry of a shape, one variant per concrete kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum ShapeGeometry {
    #[serde(rename = "http://www.openmicroscopy.org/Schemas/OME/2016-06#Rectangle")]
    Rectangle {
        #[serde(rename = "X")]
        x: f64,
        #[serde(rename = "Y")]
        y: f64,
        #[serde(rename = "Width")]
        width: f64,
        #[serde(rename = "Height")]
        height: f64,
    },
    #[serde(rename = "http://www.openmicroscopy.org/Schemas/OME/2016-06#Ellipse")]
    Ellipse {
        #[serde(rename = "X")]
        x: f64,
        #[serde(rename = "Y")]
        y: f64,
        #[serde(rename = "RadiusX")]
        radius_x: f64,
        #[serde(rename = "RadiusY")]
        radius_y: f64,
    },
    #[serde(rename = "http://www.openmicroscopy.org/Schemas/OME/2016-06#Line")]
    Line {
        #[serde(rename = "X1")]
        x1: f64,
        #[serde(rename = "Y1")]
        y1: f64,
        #[serde(rename = "X2")]
        x2: f64,
        #[serde(rename = "Y2")]
        y2: f64,
    },
    #[serde(rename = "http://www.openmicroscopy.org/Schemas/OME/2016-06#Point")]
    Point {
        #[serde(rename = "X")]
        x: f64,
        #[serde(rename = "Y")]
        y: f64,
    },
    /// Space-separated `x,y` pairs, as transmitted by the server.
    #[serde(rename = "http://www.openmicroscopy.org/Schemas/OME/2016-06#Polyline")]
    Polyline {
        #[serde(rename = "Points")]
        points: String,
    },
    #[serde(rename = "http://www.openmicroscopy.org/Schemas/OME/2016-06#Polygon")]
    Polygon {
        #[serde(rename = "Points")]
        points: String,
    },
    #[serde(rename = "http://www.openmicroscopy.org/Schemas/OME/2016-06#Label")]
    Label {
        #[serde(rename = "X")]
        x: f64,
        #[serde(rename = "Y")]
        y: f64,
    },
}
