use std::sync::Arc;
use crate::application::services::PredictionService;

/// Estado compartido para los manejadores HTTP de Axum.
/// Siguiendo la Arquitectura Hexagonal, el estado contiene los servicios (Casos de Uso).
#[derive(Clone)]
pub struct HttpState {
    /// Detección + anotación + recomendación, y lectura de imágenes guardadas.
    pub prediction: Arc<PredictionService>,
    /// Host a usar en las URLs cuando la petición no trae cabecera `Host`.
    pub fallback_host: String,
}
