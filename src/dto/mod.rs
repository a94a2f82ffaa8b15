//! DTOs
//!
//! Registros de entrada y salida de la API HTTP (JSON en camelCase).

pub mod api_response;
pub mod maintenance_dto;
pub mod trip_dto;
pub mod vehicle_dto;

pub use api_response::ApiResponse;
