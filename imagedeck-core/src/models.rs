use serde::{Deserialize, Serialize};

pub type ImageId = i64;

/// One registered flashcard image. `uri` is a local path or content URI and
/// is never interpreted here.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRecord {
    pub id: ImageId,
    pub uri: String,
}

impl ImageRecord {
    pub fn new(id: ImageId, uri: impl Into<String>) -> Self {
        Self { id, uri: uri.into() }
    }
}

/// What the study list should render right now.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Empty,
    Populated,
    Failed(String),
}

/// User-facing acknowledgments raised by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Deleted { id: ImageId, removed: usize },
    Added { id: ImageId },
    SaveFailed { error: String },
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::Deleted { .. } => "deleted".to_string(),
            Notice::Added { id } => format!("registered image {id}"),
            Notice::SaveFailed { error } => format!("save failed: {error} (press r to retry)"),
        }
    }
}
