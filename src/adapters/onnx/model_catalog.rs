use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;

use crate::adapters::onnx::yolo_engine::OnnxYoloEngine;
use crate::application::ports::ModelCatalogPort;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::{ClassNames, ModelId};

pub struct OnnxModelCatalog;

impl OnnxModelCatalog {
    pub fn new() -> Self { Self }

    /// Resuelve índice -> nombre: primero el fichero de etiquetas, si no los metadatos del modelo.
    pub fn class_names(&self, labels_path: Option<&Path>, engine: &OnnxYoloEngine) -> Result<ClassNames> {
        if let Some(path) = labels_path {
            return read_labels_file(path);
        }
        Ok(engine.embedded_class_names().unwrap_or_default())
    }
}

#[async_trait]
impl ModelCatalogPort for OnnxModelCatalog {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()> {
        if model.onnx_path.trim().is_empty() {
            return Err(DomainError::InvalidInput("onnx_path empty".into()));
        }
        if !Path::new(&model.onnx_path).exists() {
            return Err(DomainError::NotFound(format!("model file not found: {}", model.onnx_path)));
        }
        Ok(())
    }
}

/// Un nombre de clase por línea; las líneas vacías se ignoran.
pub fn read_labels_file(path: &Path) -> Result<ClassNames> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("no se pudo leer el fichero de etiquetas {}", path.display()))?;
    let names = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();
    Ok(ClassNames::new(names))
}
