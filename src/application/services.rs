use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    application::{
        dto::UploadedImage,
        ports::{AnnotatorPort, DetectorPort, ImageBucket, ImageStorePort},
    },
    domain::{
        detection::Detection,
        errors::{DomainError, DomainResult},
        fertilizer::{FertilizerEntry, FertilizerTable},
        prediction::{summarize_detections, DetectionRecord, PredictionReport},
        upload::{is_servable_name, result_filename, stored_filename},
    },
};

/// Caso de uso principal: guardar la subida, detectar, anotar y cruzar con la
/// tabla de fertilizantes.
#[derive(Clone)]
pub struct PredictionService {
    detector: Arc<dyn DetectorPort>,
    annotator: Arc<dyn AnnotatorPort>,
    store: Arc<dyn ImageStorePort>,
    fertilizers: Arc<FertilizerTable>,
}

impl PredictionService {
    pub fn new(
        detector: Arc<dyn DetectorPort>,
        annotator: Arc<dyn AnnotatorPort>,
        store: Arc<dyn ImageStorePort>,
        fertilizers: Arc<FertilizerTable>,
    ) -> Self {
        Self { detector, annotator, store, fertilizers }
    }

    /// `base_url` es el origen de la petición sin barra final, p.ej. `http://host:5000`.
    pub async fn predict(&self, upload: UploadedImage, base_url: &str) -> DomainResult<PredictionReport> {
        let stored = stored_filename(&upload.filename);
        let source = self.store.save(ImageBucket::Uploads, &stored, &upload.bytes).await?;
        debug!(file = %stored, bytes = upload.bytes.len(), "subida guardada");

        let result_name = result_filename(&stored);

        // Inferencia y dibujo son CPU puro: fuera del runtime async.
        let detector = self.detector.clone();
        let annotator = self.annotator.clone();
        let target_name = result_name.clone();
        let (detections, annotated) = tokio::task::spawn_blocking(move || -> DomainResult<(Vec<Detection>, Vec<u8>)> {
            let detections = detector.detect(&source)?;
            let annotated = annotator.annotate(&source, &detections, &target_name)?;
            Ok((detections, annotated))
        })
        .await
        .map_err(|e| DomainError::OperationFailed(format!("tarea de inferencia abortada: {e}")))??;

        self.store.save(ImageBucket::Results, &result_name, &annotated).await?;

        info!(
            file = %stored,
            count = detections.len(),
            "predicción: [{}]",
            summarize_detections(&detections)
        );

        let detections = detections
            .iter()
            .map(|d| DetectionRecord::new(d, self.recommend(&d.label)))
            .collect();

        let base = base_url.trim_end_matches('/');
        Ok(PredictionReport {
            detections,
            result_image_url: format!("{base}/result/{result_name}"),
            original_image_url: format!("{base}/uploads/{stored}"),
        })
    }

    /// Recomendación para una etiqueta; si no está en la tabla, el centinela fijo.
    pub fn recommend(&self, label: &str) -> FertilizerEntry {
        self.fertilizers
            .lookup(label)
            .cloned()
            .unwrap_or_else(FertilizerEntry::not_found)
    }

    pub async fn fetch(&self, bucket: ImageBucket, filename: &str) -> DomainResult<Vec<u8>> {
        if !is_servable_name(filename) {
            return Err(DomainError::NotFound(filename.to_string()));
        }
        self.store.read(bucket, filename).await
    }

    pub fn class_count(&self) -> usize {
        self.detector.class_count()
    }

    pub fn fertilizer_count(&self) -> usize {
        self.fertilizers.len()
    }
}
