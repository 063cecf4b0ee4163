//! Puertos falsos para tests: sin modelo ONNX ni decodificación de imagen.

use std::collections::HashMap;
use std::path::Path;

use crate::application::ports::{AnnotatorPort, DetectorPort};
use crate::domain::{
    detection::{BoundingBox, Detection},
    errors::{DomainError, DomainResult},
    fertilizer::{FertilizerEntry, FertilizerTable},
};

/// Detector con un vocabulario de clases propio, independiente de lo que detecta.
pub struct FakeDetector {
    detections: Vec<Detection>,
    classes: Vec<String>,
}

impl FakeDetector {
    pub fn weed_a(score: f32) -> Self {
        Self {
            detections: vec![Detection {
                bbox: BoundingBox { x1: 4, y1: 12, x2: 40, y2: 60 },
                score,
                class_id: 0,
                label: "weed_A".into(),
            }],
            classes: vec!["weed_A".into(), "weed_B".into()],
        }
    }

    /// Una detección por etiqueta; el vocabulario son esas mismas etiquetas.

    pub fn labels(labels: &[&str]) -> Self {
        let detections = labels
            .iter()
            .enumerate()
            .map(|(i, label)| Detection {
                bbox: BoundingBox { x1: 0, y1: 0, x2: 10, y2: 10 },
                score: 0.5 + i as f32 * 0.1,
                class_id: i,
                label: label.to_string(),
            })
            .collect();
        Self { detections, classes: labels.iter().map(|l| l.to_string()).collect() }
    }

    pub fn with_classes(mut self, classes: &[&str]) -> Self {
        self.classes = classes.iter().map(|c| c.to_string()).collect();
        self
    }
}

impl DetectorPort for FakeDetector {
    fn detect(&self, image_path: &Path) -> DomainResult<Vec<Detection>> {
        if !image_path.is_file() {
            return Err(DomainError::NotFound(image_path.display().to_string()));
        }
        Ok(self.detections.clone())
    }

    fn class_count(&self) -> usize {
        self.classes.len()
    }
}

pub struct FailingDetector;

impl DetectorPort for FailingDetector {
    fn detect(&self, _image_path: &Path) -> DomainResult<Vec<Detection>> {
        Err(DomainError::OperationFailed("sesión ONNX caída".into()))
    }

    fn class_count(&self) -> usize {
        0
    }
}

/// Copia los bytes originales tal cual.
pub struct FakeAnnotator;

impl AnnotatorPort for FakeAnnotator {
    fn annotate(&self, source: &Path, _detections: &[Detection], _target_name: &str) -> DomainResult<Vec<u8>> {
        std::fs::read(source).map_err(|e| DomainError::OperationFailed(e.to_string()))
    }
}

pub fn fertilizer_table() -> FertilizerTable {
    let mut entries = HashMap::new();
    entries.insert(
        "weed_A".to_string(),
        FertilizerEntry {
            fertilizer: "Urea".into(),
            quantity: "50 kg/acre".into(),
            frequency: "Every 30 days".into(),
        },
    );
    FertilizerTable::new(entries)
}
