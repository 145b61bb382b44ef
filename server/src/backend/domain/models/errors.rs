use uuid::Uuid;

/// A precondition failed before any repository call; nothing was changed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Debe seleccionar un estado diferente al actual")]
    NoOpTransition,
    #[error("El motivo es obligatorio para estados BLOQUEADA y RESERVADA")]
    MissingReason,
    #[error("No tienes permisos para {0}")]
    PermissionDenied(String),
    #[error("Solo se permiten archivos Excel (.xlsx, .xls) o CSV")]
    UnsupportedFile,
    #[error("Filtro no válido: {0}")]
    InvalidFilter(String),
    #[error("Vivienda no encontrada: {0}")]
    UnitNotFound(Uuid),
    #[error("Error al procesar el archivo: {0}")]
    InvalidSpreadsheet(String),
    #[error("{0} es obligatorio")]
    MissingField(&'static str),
}

/// Errors returned by domain services.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The storage backend rejected or failed the operation; carries its message
    #[error("{0}")]
    OperationFailed(String),
}

impl DomainError {
    pub fn operation_failed(error: anyhow::Error) -> Self {
        DomainError::OperationFailed(error.to_string())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, DomainError::Validation(_))
    }
}

/// Failure of the best-effort notification; logged and recorded, never returned to callers.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport failed: {0}")]
    Transport(String),
    #[error("notification endpoint rejected the request with status {status}")]
    Rejected { status: u16 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_converts_into_domain_error() {
        let err: DomainError = ValidationError::MissingReason.into();
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "El motivo es obligatorio para estados BLOQUEADA y RESERVADA"
        );
    }

    #[test]
    fn test_operation_failed_keeps_backend_message() {
        let err = DomainError::operation_failed(anyhow::anyhow!("connection reset"));
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "connection reset");
    }
}
