use crate::{CoreError, ImageId, ImageRecord};

/// Drops every record carrying `id`; everything else keeps its relative order.
pub fn remove_by_id(images: &[ImageRecord], id: ImageId) -> Vec<ImageRecord> {
    images.iter().filter(|r| r.id != id).cloned().collect()
}

pub fn find_by_id(images: &[ImageRecord], id: ImageId) -> Option<&ImageRecord> {
    images.iter().find(|r| r.id == id)
}

/// Smallest id greater than every id in use. Used by the register view only.
/// Fails once the largest id is already `ImageId::MAX`.
pub fn next_id(images: &[ImageRecord]) -> Result<ImageId, CoreError> {
    match images.iter().map(|r| r.id).max() {
        Some(m) => m.checked_add(1).ok_or(CoreError::Invalid("no image id available")),
        None => Ok(1),
    }
}

pub fn encode(images: &[ImageRecord]) -> Result<String, CoreError> {
    serde_json::to_string(images).map_err(|_| CoreError::Storage("encode collection"))
}

/// Parses the stored blob. An empty string counts as "nothing stored".
pub fn decode(raw: &str) -> Result<Vec<ImageRecord>, CoreError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str::<Vec<ImageRecord>>(raw).map_err(|e| CoreError::Malformed(e.to_string()))
}
