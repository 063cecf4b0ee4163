use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("No encontrado: {0}")]
    NotFound(String),
    #[error("Entrada inválida: {0}")]
    InvalidInput(String),
    #[error("Error de operación: {0}")]
    OperationFailed(String),
}

impl DomainError {
    /// Mensaje sin prefijo, el que viaja en `{"error": ...}`.
    pub fn message(&self) -> &str {
        match self {
            DomainError::NotFound(m) | DomainError::InvalidInput(m) | DomainError::OperationFailed(m) => m,
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
