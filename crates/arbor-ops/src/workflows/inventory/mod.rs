//! Bulk import of tree-inventory CSV exports into assessment submissions.

mod parser;

use std::io::Read;
use std::path::Path;

use crate::workflows::estimating::{AssessmentSubmission, TreeId};

/// One inventory row, ready to feed the normal intake path. Imported rows get
/// the same validation and pricing as manual submissions.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryEntry {
    pub tree_id: TreeId,
    pub submission: AssessmentSubmission,
}

/// Import failures, typed so callers can distinguish transport from format.
#[derive(Debug, thiserror::Error)]
pub enum InventoryImportError {
    #[error("failed to read inventory export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid inventory CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("inventory row {row} has no tree identifier")]
    MissingTreeId { row: usize },
}

pub struct TreeInventoryImporter;

impl TreeInventoryImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<InventoryEntry>, InventoryImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse inventory rows in file order. Duplicate tree identifiers are
    /// preserved here; job attachment collapses them by key later.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<InventoryEntry>, InventoryImportError> {
        parser::parse_entries(reader)
    }
}
