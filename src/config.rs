//! Configuración por variables de entorno (y `.env` si existe).

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::model::YoloParams;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub model_path: String,
    /// Fichero de etiquetas opcional; si falta se usan los metadatos del modelo.
    pub labels_path: Option<PathBuf>,
    pub fertilizer_db: PathBuf,
    pub uploads_dir: PathBuf,
    pub results_dir: PathBuf,
    pub font_path: Option<PathBuf>,
    pub yolo: YoloParams,
    pub max_upload_bytes: usize,
    pub cors_origins: Vec<String>,
    /// `None`: los ficheros no se borran nunca.
    pub retention: Option<Duration>,
    pub retention_sweep: Duration,
    pub log_json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            model_path: "best.onnx".to_string(),
            labels_path: None,
            fertilizer_db: PathBuf::from("fertilizer_data.json"),
            uploads_dir: PathBuf::from("uploads"),
            results_dir: PathBuf::from("results"),
            font_path: None,
            yolo: YoloParams::default(),
            max_upload_bytes: 16 * 1024 * 1024,
            cors_origins: vec!["*".to_string()],
            retention: None,
            retention_sweep: Duration::from_secs(600),
            log_json: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente arbitraria (tests).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let path = |key: &str| get(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from);

        Self {
            host: get("HOST").unwrap_or(d.host),
            port: parse_num(get("PORT")).unwrap_or(d.port),
            model_path: get("MODEL_PATH").unwrap_or(d.model_path),
            labels_path: path("LABELS_PATH"),
            fertilizer_db: path("FERTILIZER_DB").unwrap_or(d.fertilizer_db),
            uploads_dir: path("UPLOAD_DIR").unwrap_or(d.uploads_dir),
            results_dir: path("RESULTS_DIR").unwrap_or(d.results_dir),
            font_path: path("FONT_PATH"),
            yolo: YoloParams {
                input_size: parse_num(get("IMGSZ")).unwrap_or(d.yolo.input_size),
                conf_threshold: parse_num(get("CONF_THRES")).unwrap_or(d.yolo.conf_threshold),
                iou_threshold: parse_num(get("IOU_THRES")).unwrap_or(d.yolo.iou_threshold),
                max_detections: parse_num(get("MAX_DET")).unwrap_or(d.yolo.max_detections),
            },
            max_upload_bytes: parse_num(get("MAX_UPLOAD_BYTES")).unwrap_or(d.max_upload_bytes),
            cors_origins: get("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
                .unwrap_or(d.cors_origins),
            retention: parse_num(get("RETENTION_HOURS"))
                .filter(|h: &u64| *h > 0)
                .map(|h| Duration::from_secs(h * 3600)),
            retention_sweep: parse_num(get("RETENTION_SWEEP_SECS"))
                .filter(|s: &u64| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(d.retention_sweep),
            log_json: get("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
        }
    }

    /// Host:puerto para URLs cuando la petición no trae `Host`.
    pub fn public_host(&self) -> String {
        format!("localhost:{}", self.port)
    }
}

fn parse_num<T: FromStr>(raw: Option<String>) -> Option<T> {
    raw.and_then(|v| v.trim().parse().ok())
}
