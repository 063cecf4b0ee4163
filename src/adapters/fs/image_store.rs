use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{ImageBucket, ImageStorePort};
use crate::domain::errors::{DomainError, DomainResult};

/// Almacén en disco local: una carpeta para subidas y otra para resultados.
pub struct LocalImageStore {
    uploads_dir: PathBuf,
    results_dir: PathBuf,
}

impl LocalImageStore {
    pub fn new(uploads_dir: impl Into<PathBuf>, results_dir: impl Into<PathBuf>) -> Self {
        Self { uploads_dir: uploads_dir.into(), results_dir: results_dir.into() }
    }

    pub fn dir(&self, bucket: ImageBucket) -> &Path {
        match bucket {
            ImageBucket::Uploads => &self.uploads_dir,
            ImageBucket::Results => &self.results_dir,
        }
    }

    /// Crea ambas carpetas si no existen.
    pub async fn ensure_dirs(&self) -> DomainResult<()> {
        for dir in [&self.uploads_dir, &self.results_dir] {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| DomainError::OperationFailed(format!("no se pudo crear {}: {e}", dir.display())))?;
        }
        Ok(())
    }
}

#[async_trait]
impl ImageStorePort for LocalImageStore {
    async fn save(&self, bucket: ImageBucket, filename: &str, bytes: &[u8]) -> DomainResult<PathBuf> {
        let dir = self.dir(bucket);
        fs::create_dir_all(dir)
            .await
            .map_err(|e| DomainError::OperationFailed(format!("no se pudo crear {}: {e}", dir.display())))?;

        // Escribir aparte y renombrar: nadie lee un fichero a medias y la última escritura gana.
        let target = dir.join(filename);
        let tmp = dir.join(format!(".{filename}.{}.part", uuid::Uuid::new_v4().simple()));

        if let Err(e) = fs::write(&tmp, bytes).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(DomainError::OperationFailed(format!("error escribiendo {}: {e}", tmp.display())));
        }
        if let Err(e) = fs::rename(&tmp, &target).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(DomainError::OperationFailed(format!("error moviendo a {}: {e}", target.display())));
        }
        Ok(target)
    }

    async fn read(&self, bucket: ImageBucket, filename: &str) -> DomainResult<Vec<u8>> {
        let path = self.dir(bucket).join(filename);
        fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => DomainError::NotFound(filename.to_string()),
            _ => DomainError::OperationFailed(format!("error leyendo {}: {e}", path.display())),
        })
    }
}
