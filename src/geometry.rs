//! Bounding box coordinate conversions.
//!
//! Boxes are carried in two encodings:
//! - **xyxy**: opposite corners `[x1, y1, x2, y2]`, the native pixel form
//! - **xywh**: top-left corner plus size `[x, y, w, h]`, the COCO form
//!
//! Normalized coordinates divide the pixel values by the image width and
//! height, giving values in `0.0..=1.0` for boxes inside the image.

/// Box in `[x1, y1, x2, y2]` corner form.
pub type Xyxy = [f64; 4];

/// Box in `[x, y, width, height]` form.
pub type Xywh = [f64; 4];

/// Convert corner form to origin-plus-size form.
///
/// Corner order is normalized, so `[10, 10, 0, 0]` yields `[0, 0, 10, 10]`.
pub fn xyxy_to_xywh(b: Xyxy) -> Xywh {
    [
        b[0].min(b[2]),
        b[1].min(b[3]),
        (b[2] - b[0]).abs(),
        (b[3] - b[1]).abs(),
    ]
}

/// Convert origin-plus-size form to corner form.
///
/// Width and height are added as-is; callers supply non-negative sizes.
pub fn xywh_to_xyxy(b: Xywh) -> Xyxy {
    [b[0], b[1], b[0] + b[2], b[1] + b[3]]
}

/// Divide each component by `[width, height, width, height]`.
pub fn normalize(b: [f64; 4], width: u32, height: u32) -> [f64; 4] {
    let (w, h) = (f64::from(width), f64::from(height));
    [b[0] / w, b[1] / h, b[2] / w, b[3] / h]
}

/// Multiply each component by `[width, height, width, height]`.
pub fn unnormalize(b: [f64; 4], width: u32, height: u32) -> [f64; 4] {
    let (w, h) = (f64::from(width), f64::from(height));
    [b[0] * w, b[1] * h, b[2] * w, b[3] * h]
}

/// Area of a corner-form box in pixels.
pub fn area(b: Xyxy) -> f64 {
    (b[2] - b[0]).abs() * (b[3] - b[1]).abs()
}

/// Area of a corner-form box as a fraction of the image area.
pub fn normalized_area(b: Xyxy, width: u32, height: u32) -> f64 {
    area(b) / (f64::from(width) * f64::from(height))
}

/// Reorder corners so that `x1 <= x2` and `y1 <= y2`.
pub fn sort_corners(b: Xyxy) -> Xyxy {
    [b[0].min(b[2]), b[1].min(b[3]), b[0].max(b[2]), b[1].max(b[3])]
}

/// Whether the box is finite with strictly positive width and height.
pub fn is_valid_xyxy(b: Xyxy) -> bool {
    b.iter().all(|v| v.is_finite()) && b[0] < b[2] && b[1] < b[3]
}
