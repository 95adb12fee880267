pub mod matcher;

use crate::models::dataset::ConversationRecord;
use log::{ info, error };
use std::fs;
use std::path::Path;
use thiserror::Error;

pub use matcher::{ DatasetMatcher, MatchError, GREETING_REPLY };

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Dataset file IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Dataset JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Predefined conversations, in file order. Never mutated after load.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<ConversationRecord>,
}

impl Dataset {
    pub fn new(records: Vec<ConversationRecord>) -> Self {
        Self { records }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ConversationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn from_json(content: &str) -> Result<Self, DatasetError> {
        let records: Vec<ConversationRecord> = serde_json::from_str(content)?;
        Ok(Self::new(records))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Loads the dataset, falling back to an empty one so the service can
    /// still answer through the generation backend.
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(dataset) => {
                info!("Loaded {} predefined conversations from {}", dataset.len(), path.display());
                dataset
            }
            Err(DatasetError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                error!("JSON file not found at {}. Ensure the file exists.", path.display());
                Self::empty()
            }
            Err(e) => {
                error!("Error loading dataset from {}: {}", path.display(), e);
                Self::empty()
            }
        }
    }
}
