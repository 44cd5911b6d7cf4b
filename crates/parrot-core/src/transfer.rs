//! JSON export and import of materials.
//!
//! Two import shapes are accepted: a bulk bundle `{version, exportDate,
//! materials: [...]}` and a bare single material `{title, chunks: [...], ...}`.
//! Parsing is all-or-nothing: one malformed material rejects the whole file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::Material;

/// Bundle format version written by [`ExportBundle::new`].
pub const EXPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub version: u32,
    #[serde(alias = "export_date")]
    pub export_date: DateTime<Utc>,
    pub materials: Vec<Material>,
}

impl ExportBundle {
    pub fn new(materials: Vec<Material>) -> Self {
        Self {
            version: EXPORT_VERSION,
            export_date: Utc::now(),
            materials,
        }
    }
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Unrecognized import format: {0}")]
    Format(String),
}

/// Parse an import file into materials with ids filled in.
///
/// Nothing is returned unless every material in the file is valid.
pub fn parse_import(json: &str) -> Result<Vec<Material>, ImportError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| ImportError::Format(format!("invalid JSON: {e}")))?;

    let Value::Object(map) = &value else {
        return Err(ImportError::Format("expected a JSON object".to_string()));
    };

    let mut materials = if let Some(list) = map.get("materials") {
        let Value::Array(items) = list else {
            return Err(ImportError::Format("`materials` must be an array".to_string()));
        };
        if let Some(version) = map.get("version").and_then(Value::as_u64) {
            if version != u64::from(EXPORT_VERSION) {
                tracing::warn!(version, expected = EXPORT_VERSION, "Importing bundle from another version");
            }
        }
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                Material::deserialize(item)
                    .map_err(|e| ImportError::Format(format!("material {i}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?
    } else if map.get("chunks").is_some_and(Value::is_array)
        && map.get("title").is_some_and(Value::is_string)
    {
        let material = Material::deserialize(&value)
            .map_err(|e| ImportError::Format(format!("material: {e}")))?;
        vec![material]
    } else {
        return Err(ImportError::Format(
            "expected `materials` array or a material with `title` and `chunks`".to_string(),
        ));
    };

    for material in &mut materials {
        material.ensure_ids();
    }
    Ok(materials)
}
