use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::domain::{detection::Detection, errors::DomainResult, model::ModelId};

/// Detector de objetos (caja negra). Bloqueante: llamar desde `spawn_blocking`.
pub trait DetectorPort: Send + Sync {
    fn detect(&self, image_path: &Path) -> DomainResult<Vec<Detection>>;
    fn class_count(&self) -> usize;
}

/// Dibuja las detecciones sobre una copia de la imagen original y la codifica
/// según la extensión de `target_name`. Bloqueante.
pub trait AnnotatorPort: Send + Sync {
    fn annotate(&self, source: &Path, detections: &[Detection], target_name: &str) -> DomainResult<Vec<u8>>;
}

#[async_trait]
pub trait ModelCatalogPort: Send + Sync {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()>;
}

/// Carpeta lógica donde vive una imagen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageBucket {
    Uploads,
    Results,
}

#[async_trait]
pub trait ImageStorePort: Send + Sync {
    /// Escribe los bytes bajo `filename` (último en escribir gana) y devuelve la ruta.
    async fn save(&self, bucket: ImageBucket, filename: &str, bytes: &[u8]) -> DomainResult<PathBuf>;
    async fn read(&self, bucket: ImageBucket, filename: &str) -> DomainResult<Vec<u8>>;
}
