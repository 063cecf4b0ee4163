use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

use crate::adapters::onnx::yolo_engine::OnnxYoloEngine;
use crate::adapters::render::decode::open_oriented_rgb;
use crate::application::ports::DetectorPort;
use crate::domain::{
    detection::Detection,
    errors::{DomainError, DomainResult},
    model::{ClassNames, YoloParams},
};

/// Adaptador del puerto de detección sobre una sesión ONNX.
/// `Session::run` necesita `&mut`, así que las peticiones se serializan en el Mutex.
pub struct OnnxDetector {
    engine: Mutex<OnnxYoloEngine>,
    params: YoloParams,
    names: ClassNames,
}

impl OnnxDetector {
    pub fn new(engine: OnnxYoloEngine, params: YoloParams, names: ClassNames) -> Self {
        Self { engine: Mutex::new(engine), params, names }
    }
}

impl DetectorPort for OnnxDetector {
    fn detect(&self, image_path: &Path) -> DomainResult<Vec<Detection>> {
        let rgb = open_oriented_rgb(image_path)
            .map_err(|e| DomainError::OperationFailed(format!("no se pudo decodificar {}: {e}", image_path.display())))?;

        let t_infer_start = std::time::Instant::now();
        let detections = {
            let mut engine = self
                .engine
                .lock()
                .map_err(|_| DomainError::OperationFailed("Lock del motor ONNX fallido".into()))?;
            engine
                .infer(&rgb, &self.params, &self.names)
                .map_err(|e| DomainError::OperationFailed(format!("inferencia fallida: {e:#}")))?
        };
        let infer_ms = t_infer_start.elapsed().as_secs_f32() * 1000.0;

        debug!(
            width = rgb.width(),
            height = rgb.height(),
            infer_ms,
            count = detections.len(),
            "inferencia completada"
        );
        Ok(detections)
    }

    fn class_count(&self) -> usize {
        self.names.len()
    }
}
