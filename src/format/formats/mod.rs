//! Annotation format implementations.

mod coco;
mod native_json;

#[cfg(test)]
mod tests;

pub use coco::CocoFormat;
pub use native_json::NativeJsonFormat;
