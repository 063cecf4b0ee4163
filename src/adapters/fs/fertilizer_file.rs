use anyhow::{Context, Result};
use std::path::Path;

use crate::domain::fertilizer::FertilizerTable;

/// Lee `fertilizer_data.json`: objeto `{ "<etiqueta>": {fertilizer, quantity, frequency} }`.
pub fn load_fertilizer_table(path: &Path) -> Result<FertilizerTable> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("no se pudo leer la tabla de fertilizantes {}", path.display()))?;
    let table: FertilizerTable = serde_json::from_str(&raw)
        .with_context(|| format!("JSON inválido en {}", path.display()))?;
    Ok(table)
}
