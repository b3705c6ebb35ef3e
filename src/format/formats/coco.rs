//! COCO JSON format implementation.
//!
//! Implements the COCO (Common Objects in Context) detection format.
//! Box geometry is written as `[x, y, w, h]` normalized by the image width
//! and height, with `area` normalized the same way.
//!
//! The conversion is lossy: COCO has no image-level labels, no edit history,
//! and no per-box timestamps or authors, so only boxes survive a round trip.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::format::error::FormatError;
use crate::format::traits::{AnnotationFormat, ExportResult, FormatWarning};
use crate::geometry;
use crate::model::{AnnotationRecord, BoundingBox, ImageAnnotations};

/// COCO JSON format.
///
/// Supports:
/// - Bounding boxes (bbox), one category per box
/// - Image dimensions
///
/// Does not support:
/// - Image-level classification labels
/// - Label and box history
/// - Records without image dimensions (skipped on export)
pub struct CocoFormat;

impl AnnotationFormat for CocoFormat {
    fn id(&self) -> &'static str {
        "coco"
    }

    fn display_name(&self) -> &'static str {
        "COCO (JSON)"
    }

    fn extensions(&self) -> &[&'static str] {
        &["json"]
    }

    fn is_lossless(&self) -> bool {
        false
    }

    fn export_to_bytes(
        &self,
        data: &ImageAnnotations,
    ) -> Result<(Vec<u8>, ExportResult), FormatError> {
        let mut result = ExportResult::new();
        let mut coco = CocoDataset::new();
        let mut category_ids: HashMap<String, u64> = HashMap::new();
        let mut annotation_id = 0u64;

        for record in data.records() {
            let Some((width, height)) = record.dimensions().filter(|&(w, h)| w > 0 && h > 0)
            else {
                log::warn!(
                    "Skipping image '{}' in COCO export: image width/height not set",
                    record.image_name
                );
                result.add_warning(
                    FormatWarning::warning("Image dimensions missing, image skipped")
                        .with_image(&record.image_name),
                );
                continue;
            };

            let image_id = coco.images.len() as u64 + 1;
            coco.images.push(CocoImage {
                id: image_id,
                width,
                height,
                file_name: record.image_name.clone(),
            });

            if record.label.is_some() {
                result.add_warning(
                    FormatWarning::info("Image label not representable in COCO, dropped")
                        .with_image(&record.image_name),
                );
            }

            for bbox in &record.bboxes {
                let Some(class_name) = &bbox.class_name else {
                    log::warn!(
                        "Skipping box {:?} on '{}' in COCO export: no class name",
                        bbox.xyxy,
                        record.image_name
                    );
                    result.add_warning(
                        FormatWarning::warning("Box without class name skipped")
                            .with_image(&record.image_name),
                    );
                    continue;
                };

                let area = geometry::normalized_area(bbox.xyxy, width, height);
                if !(area > 0.0) {
                    log::warn!(
                        "Skipping box {:?} on '{}' in COCO export: non-positive area",
                        bbox.xyxy,
                        record.image_name
                    );
                    result.add_warning(
                        FormatWarning::warning("Box with non-positive area skipped")
                            .with_image(&record.image_name),
                    );
                    continue;
                }

                let category_id = match category_ids.get(class_name) {
                    Some(&id) => id,
                    None => {
                        let id = coco.categories.len() as u64 + 1;
                        coco.categories.push(CocoCategory {
                            id,
                            name: class_name.clone(),
                            supercategory: default_supercategory(),
                        });
                        category_ids.insert(class_name.clone(), id);
                        id
                    }
                };

                annotation_id += 1;
                coco.annotations.push(CocoAnnotation {
                    id: annotation_id,
                    image_id,
                    category_id,
                    segmentation: Vec::new(),
                    bbox: Some(geometry::normalize(bbox.xywh(), width, height)),
                    area,
                    iscrowd: 0,
                });
            }
        }

        result.images_exported = coco.images.len();
        result.annotations_exported = coco.annotations.len();

        // Serialize to JSON
        let json = serde_json::to_string_pretty(&coco)?;
        Ok((json.into_bytes(), result))
    }

    fn import_from_bytes(&self, bytes: &[u8]) -> Result<ImageAnnotations, FormatError> {
        let coco: CocoDataset = serde_json::from_slice(bytes)?;

        let categories: HashMap<u64, &str> = coco
            .categories
            .iter()
            .map(|c| (c.id, c.name.as_str()))
            .collect();

        let mut images: HashMap<u64, &CocoImage> = HashMap::new();
        let mut data = ImageAnnotations::new();

        // Register every image first so dimensions survive for images without boxes
        for image in &coco.images {
            if images.insert(image.id, image).is_some() {
                return Err(FormatError::invalid_format(format!(
                    "duplicate image id {}",
                    image.id
                )));
            }
            data.insert(
                AnnotationRecord::new(&image.file_name).with_dimensions(image.width, image.height),
            );
        }

        for ann in &coco.annotations {
            let Some(image) = images.get(&ann.image_id) else {
                log::warn!(
                    "Skipping COCO annotation {}: unknown image id {}",
                    ann.id,
                    ann.image_id
                );
                continue;
            };
            let Some(&class_name) = categories.get(&ann.category_id) else {
                log::warn!(
                    "Skipping COCO annotation {}: unknown category id {}",
                    ann.id,
                    ann.category_id
                );
                continue;
            };
            let Some(bbox) = ann.bbox else {
                log::warn!("Skipping COCO annotation {}: no bbox", ann.id);
                continue;
            };

            let xywh = geometry::unnormalize(bbox, image.width, image.height);
            let bbox = BoundingBox::new(geometry::xywh_to_xyxy(xywh)).with_class(class_name);
            data.push_bbox(&image.file_name, bbox, None, false);
        }

        Ok(data)
    }
}

fn default_supercategory() -> String {
    "none".to_string()
}

// COCO format structures

#[derive(Debug, Serialize, Deserialize)]
struct CocoDataset {
    #[serde(default)]
    info: CocoInfo,
    #[serde(default)]
    images: Vec<CocoImage>,
    #[serde(default)]
    annotations: Vec<CocoAnnotation>,
    #[serde(default)]
    categories: Vec<CocoCategory>,
    #[serde(default)]
    licenses: Vec<CocoLicense>,
}

impl CocoDataset {
    fn new() -> Self {
        Self {
            info: CocoInfo::default(),
            images: Vec::new(),
            annotations: Vec::new(),
            categories: Vec::new(),
            licenses: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CocoInfo {
    #[serde(default)]
    year: u32,
    #[serde(default)]
    version: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    contributor: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    date_created: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoImage {
    id: u64,
    width: u32,
    height: u32,
    file_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoAnnotation {
    id: u64,
    image_id: u64,
    category_id: u64,
    #[serde(default)]
    segmentation: Vec<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bbox: Option<[f64; 4]>,
    #[serde(default)]
    area: f64,
    #[serde(default)]
    iscrowd: u8,
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoCategory {
    id: u64,
    name: String,
    #[serde(default = "default_supercategory")]
    supercategory: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoLicense {
    id: u32,
    name: String,
    url: String,
}
