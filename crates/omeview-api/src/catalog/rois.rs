// Region-of-interest reads and writes.
//
// Reads go through the paginated ROI collection, where each element carries
// a nested shape array; the result is flattened into one shape list with
// each shape back-referencing its containing annotation. Writes go to the
// viewer's persistence endpoint and need the session CSRF token.

use serde_json::{Map, Value, json};
use tracing::warn;
use url::Url;

use super::CatalogApi;
use crate::entities::Shape;

impl CatalogApi {
    /// All shapes of every ROI of one image, flattened. Empty on failure.
    pub async fn rois(&self, image_id: i64) -> Vec<Shape> {
        let raw = format!("{}api/v0/m/rois/?image={image_id}", self.host());
        let url = match Url::parse(&raw) {
            Ok(url) => url,
            Err(e) => {
                warn!("cannot build ROI listing URL {raw}: {e}");
                return Vec::new();
            }
        };

        self.sender()
            .get_paginated(&url)
            .await
            .iter()
            .flat_map(|roi| {
                let Some(roi_id) = roi.get("@id").and_then(Value::as_i64) else {
                    warn!("skipping ROI without an @id for image {image_id}");
                    return Vec::new();
                };
                roi.get("shapes")
                    .and_then(Value::as_array)
                    .map(|shapes| {
                        shapes
                            .iter()
                            .filter_map(|shape| Shape::from_value(shape, roi_id))
                            .collect()
                    })
                    .unwrap_or_default()
            })
            .collect()
    }

    /// Write `shapes` as the new ROIs of one image, deleting
    /// `shapes_to_remove` in the same request. Returns overall success.
    pub async fn write_rois(
        &self,
        image_id: i64,
        shapes: &[Shape],
        shapes_to_remove: &[Shape],
    ) -> bool {
        let raw = format!("{}iviewer/persist_rois/", self.host());
        let url = match Url::parse(&raw) {
            Ok(url) => url,
            Err(e) => {
                warn!("cannot build ROI persistence URL {raw}: {e}");
                return false;
            }
        };

        // The removal set is keyed by containing ROI id, listing the shape
        // ids to drop from each.
        let mut empty_rois: Map<String, Value> = Map::new();
        for shape in shapes_to_remove {
            let (Some(roi_id), Some(shape_id)) = (shape.roi_id, shape.id) else {
                continue;
            };
            if let Some(ids) = empty_rois
                .entry(roi_id.to_string())
                .or_insert_with(|| Value::Array(Vec::new()))
                .as_array_mut()
            {
                ids.push(json!(shape_id));
            }
        }

        let body = json!({
            "imageId": image_id,
            "rois": {
                "count": shapes.len(),
                "empty_rois": empty_rois,
                "new": shapes,
            }
        });

        let referer = format!("{}iviewer/?images={image_id}", self.host());
        match self
            .sender()
            .post_json(&url, &body, &referer, &self.token())
            .await
        {
            // The endpoint reports problems as an `error` member in a 200
            // body. Only the top level counts; shape text echoed back in the
            // response must not trip the check.
            Ok(response) => match serde_json::from_str::<Value>(&response) {
                Ok(parsed) => !parsed
                    .as_object()
                    .is_some_and(|body| body.contains_key("error")),
                Err(e) => {
                    warn!("unreadable ROI write response for image {image_id}: {e}");
                    false
                }
            },
            Err(e) => {
                warn!("writing ROIs of image {image_id} failed: {e}");
                false
            }
        }
    }
}
