use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum AppError {
    #[error("Sesión no iniciada")]
    Unauthenticated,

    #[error("Fallo de red: {0}")]
    NetworkFailure(String),

    #[error("Tiempo de espera agotado")]
    Timeout,

    #[error("Rechazado por el servidor ({status}): {message}")]
    ServerRejected { status: u16, message: String },

    #[error("Respuesta inesperada: {0}")]
    ParseFailure(String),

    #[error("Campo inválido {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Error de almacenamiento: {0}")]
    Storage(String),

    #[error("Operación cancelada")]
    Cancelled,

    #[error("Error interno: {0}")]
    Internal(String),
}

impl FromStr for AppError {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("Sesión no iniciada") {
            Ok(AppError::Unauthenticated)
        } else if let Some(rest) = s.strip_prefix("Fallo de red: ") {
            Ok(AppError::NetworkFailure(rest.to_string()))
        } else if let Some(rest) = s.strip_prefix("Rechazado por el servidor (") {
            let (status, message) = rest.split_once("): ").unwrap_or((rest, ""));
            Ok(AppError::ServerRejected {
                status: status.parse().unwrap_or_default(),
                message: message.to_string(),
            })
        } else if let Some(rest) = s.strip_prefix("Respuesta inesperada: ") {
            Ok(AppError::ParseFailure(rest.to_string()))
        } else if let Some(rest) = s.strip_prefix("Campo inválido ") {
            let (field, message) = rest.split_once(": ").unwrap_or((rest, ""));
            Ok(AppError::validation(field, message))
        } else if let Some(rest) = s.strip_prefix("Error de almacenamiento: ") {
            Ok(AppError::Storage(rest.to_string()))
        } else if s.starts_with("Operación cancelada") {
            Ok(AppError::Cancelled)
        } else if let Some(rest) = s.strip_prefix("Error interno: ") {
            Ok(AppError::Internal(rest.to_string()))
        } else if s.starts_with("Tiempo de espera agotado") || s.contains("timeout") {
            Ok(AppError::Timeout)
        } else {
            Ok(AppError::Internal(s.to_string()))
        }
    }
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ServerRejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The backend already holds the resource being created.
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn user_message(&self) -> &str {
        match self {
            Self::Unauthenticated => "Debes iniciar sesión para continuar.",
            Self::NetworkFailure(_) => "Problemas con el servidor. Inténtalo de nuevo.",
            Self::Timeout => "El servidor tardó demasiado. Inténtalo de nuevo.",
            Self::ServerRejected { status: 401 | 403, .. } => {
                "No tienes permiso para realizar esta acción."
            }
            Self::ServerRejected { message, .. } if !message.is_empty() => message.as_str(),
            Self::ServerRejected { .. } => "El servidor rechazó la solicitud.",
            Self::ParseFailure(_) => "El servidor respondió con datos inesperados.",
            Self::Validation { message, .. } => message.as_str(),
            Self::Storage(_) => "No se pudo guardar la sesión.",
            Self::Cancelled => "La operación fue cancelada.",
            Self::Internal(_) => "Ocurrió un error inesperado.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_round_trips_through_from_str() {
        let errors = [
            AppError::Unauthenticated,
            AppError::NetworkFailure("connection refused".to_string()),
            AppError::ServerRejected {
                status: 500,
                message: "boom".to_string(),
            },
            AppError::validation("title", "El título es obligatorio"),
            AppError::Cancelled,
            AppError::Timeout,
            AppError::Internal("connect timeout".to_string()),
        ];

        for error in errors {
            let parsed: AppError = error.to_string().parse().unwrap();
            assert_eq!(parsed, error);
        }
    }

    #[test]
    fn test_raw_timeout_message_is_timeout() {
        let parsed: AppError = "operation timeout after 30s".parse().unwrap();
        assert_eq!(parsed, AppError::Timeout);
    }

    #[test]
    fn test_unknown_message_is_internal() {
        let parsed: AppError = "algo raro".parse().unwrap();
        assert_eq!(parsed, AppError::Internal("algo raro".to_string()));
    }

    #[test]
    fn test_status_helpers() {
        let conflict = AppError::ServerRejected {
            status: 409,
            message: String::new(),
        };
        assert!(conflict.is_conflict());
        assert!(!conflict.is_not_found());
        assert_eq!(AppError::Timeout.status(), None);
    }

    #[test]
    fn test_user_message_prefers_backend_message() {
        let err = AppError::ServerRejected {
            status: 400,
            message: "Category slug already exists".to_string(),
        };
        assert_eq!(err.user_message(), "Category slug already exists");

        let err = AppError::ServerRejected {
            status: 403,
            message: "Forbidden".to_string(),
        };
        assert_eq!(
            err.user_message(),
            "No tienes permiso para realizar esta acción."
        );
    }
}
