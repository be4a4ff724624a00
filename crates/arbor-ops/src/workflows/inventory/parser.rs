use std::collections::BTreeMap;
use std::io::Read;

use serde::{Deserialize, Deserializer};

use super::{InventoryEntry, InventoryImportError};
use crate::workflows::estimating::{AssessmentSubmission, TreeId};

pub(crate) fn parse_entries<R: Read>(
    reader: R,
) -> Result<Vec<InventoryEntry>, InventoryImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut entries = Vec::new();

    for (index, record) in csv_reader.deserialize::<InventoryRow>().enumerate() {
        let row = record?;

        let tree_id = row.tree_id.trim();
        if tree_id.is_empty() {
            return Err(InventoryImportError::MissingTreeId { row: index + 1 });
        }

        entries.push(InventoryEntry {
            tree_id: TreeId(tree_id.to_string()),
            submission: AssessmentSubmission {
                height_ft: row.height_ft,
                canopy_radius_ft: row.canopy_radius_ft,
                dbh_in: row.dbh_in,
                species: row.species,
                hazards: hazard_flags(row.hazards.as_deref()),
                parameters: None,
            },
        });
    }

    Ok(entries)
}

#[derive(Debug, Deserialize)]
struct InventoryRow {
    #[serde(rename = "Tree ID")]
    tree_id: String,
    #[serde(rename = "Height (ft)")]
    height_ft: f64,
    #[serde(rename = "Canopy Radius (ft)")]
    canopy_radius_ft: f64,
    #[serde(rename = "DBH (in)")]
    dbh_in: f64,
    #[serde(rename = "Species", default, deserialize_with = "empty_string_as_none")]
    species: Option<String>,
    #[serde(rename = "Hazards", default, deserialize_with = "empty_string_as_none")]
    hazards: Option<String>,
}

/// Split the semicolon-separated hazards cell into an open flag map. The
/// names are passed through verbatim; intake decides what is recognized.
fn hazard_flags(cell: Option<&str>) -> BTreeMap<String, bool> {
    let mut flags = BTreeMap::new();

    if let Some(cell) = cell {
        for name in cell.split(';') {
            let name = name.trim();
            if !name.is_empty() {
                flags.insert(name.to_string(), true);
            }
        }
    }

    flags
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
