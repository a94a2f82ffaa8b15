//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.
//! Los errores de negocio son esperados y se devuelven al llamador;
//! solo los fallos de persistencia se reportan como `StorageUnavailable`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Vehicle not found: {0}")]
    VehicleNotFound(Uuid),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Driver {0} already has a trip in progress")]
    DriverAlreadyActive(Uuid),

    #[error("Vehicle {0} is already assigned to another trip during this period")]
    OverlappingAssignment(Uuid),

    #[error("Vehicle {0} is currently in maintenance")]
    VehicleUnderMaintenance(Uuid),

    #[error("Incomplete window: {0}")]
    IncompleteWindow(String),

    #[error("Invalid odometer: {0}")]
    InvalidOdometer(String),

    #[error("Invalid odometer range: end {end} must be greater than start {start}")]
    InvalidOdometerRange { start: i64, end: i64 },

    #[error("Fuel consumption of {consumption:.1} L/100km is outside [{min}, {max}]")]
    ImplausibleFuelConsumption { consumption: f64, min: f64, max: f64 },

    #[error("Trip {0} is already completed")]
    TripAlreadyCompleted(Uuid),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("JWT error: {0}")]
    Jwt(String),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::StorageUnavailable(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        AppError::StorageUnavailable(format!("migration failed: {}", e))
    }
}

impl AppError {
    /// Código HTTP asociado a cada tipo de error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) | AppError::VehicleNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidTransition(_)
            | AppError::DriverAlreadyActive(_)
            | AppError::OverlappingAssignment(_)
            | AppError::VehicleUnderMaintenance(_)
            | AppError::IncompleteWindow(_)
            | AppError::InvalidOdometer(_)
            | AppError::InvalidOdometerRange { .. }
            | AppError::ImplausibleFuelConsumption { .. }
            | AppError::TripAlreadyCompleted(_)
            | AppError::Validation(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Código estable que consume el dashboard
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::VehicleNotFound(_) => "VEHICLE_NOT_FOUND",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::InvalidTransition(_) => "INVALID_TRANSITION",
            AppError::DriverAlreadyActive(_) => "DRIVER_ALREADY_ACTIVE",
            AppError::OverlappingAssignment(_) => "OVERLAPPING_ASSIGNMENT",
            AppError::VehicleUnderMaintenance(_) => "VEHICLE_UNDER_MAINTENANCE",
            AppError::IncompleteWindow(_) => "INCOMPLETE_WINDOW",
            AppError::InvalidOdometer(_) => "INVALID_ODOMETER",
            AppError::InvalidOdometerRange { .. } => "INVALID_ODOMETER_RANGE",
            AppError::ImplausibleFuelConsumption { .. } => "IMPLAUSIBLE_FUEL_CONSUMPTION",
            AppError::TripAlreadyCompleted(_) => "TRIP_ALREADY_COMPLETED",
            AppError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Conflict(_) => "CONFLICT",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::Jwt(_) => "JWT_ERROR",
        }
    }

    /// Indica si el error es de negocio (esperado) o de infraestructura
    pub fn is_business_error(&self) -> bool {
        !matches!(self, AppError::StorageUnavailable(_) | AppError::Internal(_))
    }
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code().to_string();

        let (message, details) = match &self {
            AppError::StorageUnavailable(msg) => {
                tracing::error!("❌ Storage unavailable: {}", msg);
                (
                    "The storage backend is currently unavailable".to_string(),
                    None,
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("❌ Internal error: {}", msg);
                ("An unexpected error occurred".to_string(), None)
            }
            AppError::Validation(e) => {
                tracing::warn!("Validation error: {}", e);
                ("The provided data is invalid".to_string(), Some(json!(e)))
            }
            AppError::ImplausibleFuelConsumption { consumption, min, max } => {
                tracing::warn!("{}", self);
                (
                    self.to_string(),
                    Some(json!({ "consumption": consumption, "min": min, "max": max })),
                )
            }
            other => {
                tracing::warn!("{}", other);
                (other.to_string(), None)
            }
        };

        let error_response = ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            message,
            details,
            code,
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: Uuid) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de acceso prohibido
pub fn forbidden_error(operation: &str, reason: &str) -> AppError {
    AppError::Forbidden(format!("Cannot {}: {}", operation, reason))
}

/// Función helper para crear errores de conflicto
pub fn conflict_error(resource: &str, field: &str, value: &str) -> AppError {
    AppError::Conflict(format!("{} with {} '{}' already exists", resource, field, value))
}

/// Función helper para crear errores de solicitud incorrecta
pub fn bad_request_error(message: &str) -> AppError {
    AppError::BadRequest(message.to_string())
}
