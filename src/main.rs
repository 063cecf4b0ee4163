mod domain;
mod application;
mod adapters;
mod config;

use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use crate::application::{ports::ModelCatalogPort, services::PredictionService};
use crate::adapters::{
    fs::{fertilizer_file::load_fertilizer_table, image_store::LocalImageStore, retention::RetentionSweeper},
    onnx::{detector::OnnxDetector, model_catalog::OnnxModelCatalog, yolo_engine::OnnxYoloEngine},
    render::annotator::ImageprocAnnotator,
    http::{router, state::HttpState, HttpOptions},
};
use crate::config::AppConfig;
use crate::domain::model::ModelId;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cfg = AppConfig::from_env();

    // 1. Inicializar logs (RUST_LOG=info por defecto, LOG_FORMAT=json opcional)
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cfg.log_json {
        tracing_subscriber::registry().with(fmt::layer().json()).with(env_filter).init();
    } else {
        tracing_subscriber::registry().with(fmt::layer().with_target(true)).with(env_filter).init();
    }

    tracing::info!("🔧 Inicializando adaptadores de infraestructura...");

    // 2. Modelo: validar la ruta antes de cargar la sesión ONNX
    let model = ModelId::from_path(&cfg.model_path);
    let catalog = OnnxModelCatalog::new();
    catalog.validate_model(&model).await.context("modelo inválido")?;

    let engine = OnnxYoloEngine::load(&model.onnx_path)
        .with_context(|| format!("no se pudo cargar el modelo {}", model.onnx_path))?;
    let names = catalog.class_names(cfg.labels_path.as_deref(), &engine)?;
    if names.is_empty() {
        tracing::warn!("El modelo no trae nombres de clase; se usará class_<id>");
    }
    tracing::info!("🧠 Modelo '{}' cargado ({} clases)", model.name, names.len());

    // 3. Tabla de fertilizantes (solo lectura, compartida)
    let fertilizers = load_fertilizer_table(&cfg.fertilizer_db)?;
    tracing::info!("🌱 {} recomendaciones cargadas desde {}", fertilizers.len(), cfg.fertilizer_db.display());

    // 4. Instanciar Adaptadores
    // Usamos Arc porque serán compartidos entre el servicio y el servidor HTTP.
    let detector = Arc::new(OnnxDetector::new(engine, cfg.yolo.clone(), names));
    let annotator = Arc::new(ImageprocAnnotator::new(cfg.font_path.as_deref())?);
    let store = LocalImageStore::new(&cfg.uploads_dir, &cfg.results_dir);
    store.ensure_dirs().await?;
    let store = Arc::new(store);

    // 5. Servicio (Caso de Uso) y estado de la API
    let prediction = Arc::new(PredictionService::new(detector, annotator, store, Arc::new(fertilizers)));
    let state = HttpState { prediction, fallback_host: cfg.public_host() };

    if let Some(max_age) = cfg.retention {
        let sweeper = RetentionSweeper::new(
            vec![cfg.uploads_dir.clone(), cfg.results_dir.clone()],
            max_age,
            cfg.retention_sweep,
        );
        tokio::spawn(sweeper.run());
    }

    // 6. Router de Axum
    let opts = HttpOptions { max_upload_bytes: cfg.max_upload_bytes, cors_origins: cfg.cors_origins.clone() };
    let app = router(state, &opts);

    // 7. Lanzar el Servidor
    let addr = format!("{}:{}", cfg.host, cfg.port);

    tracing::info!("🚀 Servidor iniciado en http://{}", addr);
    tracing::info!("📂 Subidas en '{}', resultados en '{}'", cfg.uploads_dir.display(), cfg.results_dir.display());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Servidor detenido");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("No se pudo instalar el manejador de Ctrl+C: {e}");
    }
}
