use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FertilizerEntry {
    pub fertilizer: String,
    pub quantity: String,
    pub frequency: String,
}

impl FertilizerEntry {
    /// Valor fijo para etiquetas que no están en la tabla. Los clientes dependen de él.
    pub fn not_found() -> Self {
        Self {
            fertilizer: "Not found".into(),
            quantity: "N/A".into(),
            frequency: "N/A".into(),
        }
    }
}

/// Tabla de solo lectura etiqueta -> recomendación. Se carga una vez al arrancar.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct FertilizerTable {
    entries: HashMap<String, FertilizerEntry>,
}

impl FertilizerTable {
    pub fn new(entries: HashMap<String, FertilizerEntry>) -> Self {
        Self { entries }
    }

    pub fn lookup(&self, label: &str) -> Option<&FertilizerEntry> {
        self.entries.get(label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
