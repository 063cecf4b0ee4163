use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};

/// Fichero recibido en el formulario multipart.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Partes con fichero encontradas en `POST /predict`.
/// Se aceptan los campos `file` e `image`; `file` tiene prioridad.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadedImage>,
    pub image: Option<UploadedImage>,
}

impl UploadForm {
    pub fn into_upload(self) -> DomainResult<UploadedImage> {
        let upload = self
            .file
            .or(self.image)
            .ok_or_else(|| DomainError::InvalidInput("No image uploaded".into()))?;

        if upload.filename.is_empty() {
            return Err(DomainError::InvalidInput("No image selected".into()));
        }
        Ok(upload)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub classes: usize,
    pub fertilizers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
