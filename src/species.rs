//! Species registry: species identifier -> genome file + display name

use crate::error::{Result, WorkerError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// One registry entry. The genome path is relative to the genomes root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesEntry {
    pub genome_file: PathBuf,
    pub name: String,
}

impl SpeciesEntry {
    pub fn new(genome_file: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            genome_file: genome_file.into(),
            name: name.into(),
        }
    }
}

/// Read-only species table, built once at startup and shared behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct SpeciesRegistry {
    entries: BTreeMap<String, SpeciesEntry>,
}

impl SpeciesRegistry {
    /// Built-in species table
    pub fn builtin() -> Self {
        let entries = [
            (
                "oryza_sativa",
                SpeciesEntry::new("oryza/IRGSP-1.0.fa", "Oryza sativa (Rice)"),
            ),
            (
                "arabidopsis_thaliana",
                SpeciesEntry::new("arabidopsis/TAIR10.fa", "Arabidopsis thaliana"),
            ),
            (
                "zea_mays",
                SpeciesEntry::new("zea/Zm-B73-REFERENCE-NAM-5.0.fa", "Zea mays (Maize)"),
            ),
            (
                "solanum_lycopersicum",
                SpeciesEntry::new("solanum/SL4.0.fa", "Solanum lycopersicum (Tomato)"),
            ),
            (
                "glycine_max",
                SpeciesEntry::new("glycine/Gmax_v4.0.fa", "Glycine max (Soybean)"),
            ),
        ];

        Self::from_entries(entries.into_iter().map(|(id, e)| (id.to_string(), e)))
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (String, SpeciesEntry)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Load a registry from a JSON object of `{"<id>": {"genomeFile", "name"}}`
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let load_error = |reason: String| WorkerError::RegistryLoadError {
            path: path.to_path_buf(),
            reason,
        };

        let raw = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
        let entries: BTreeMap<String, SpeciesEntry> =
            serde_json::from_str(&raw).map_err(|e| load_error(e.to_string()))?;

        if let Some((id, _)) = entries.iter().find(|(_, e)| e.genome_file.is_absolute()) {
            return Err(load_error(format!(
                "genomeFile for '{}' must be relative to the genomes directory",
                id
            )));
        }

        info!("Loaded {} species from {}", entries.len(), path.display());
        Ok(Self { entries })
    }

    pub fn get(&self, species: &str) -> Option<&SpeciesEntry> {
        self.entries.get(species)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SpeciesEntry)> {
        self.entries.iter().map(|(id, e)| (id.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
