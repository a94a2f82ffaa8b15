//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle (camión o remolque) y sus enums.
//! Las marcas de mantenimiento solo existen para camiones.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;

/// Tipo de vehículo - mapea al ENUM vehicle_kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "vehicle_kind", rename_all = "lowercase")]
#[serde(rename_all = "PascalCase")]
pub enum VehicleKind {
    Truck,
    Trailer,
}

impl VehicleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleKind::Truck => "Truck",
            VehicleKind::Trailer => "Trailer",
        }
    }
}

/// Estado del vehículo - mapea al ENUM vehicle_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "vehicle_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Available,
    InUse,
    Maintenance,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "available",
            VehicleStatus::InUse => "in_use",
            VehicleStatus::Maintenance => "maintenance",
        }
    }
}

/// Marcas de mantenimiento de un camión: valores registrados en el último servicio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceWatermarks {
    pub last_oil_change_odometer: i64,
    pub last_oil_change_date: DateTime<Utc>,
    pub last_inspection_date: DateTime<Utc>,
}

/// Vehicle principal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Uuid,
    pub kind: VehicleKind,
    /// Matrícula, única en toda la flota
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub status: VehicleStatus,
    pub current_odometer: i64,
    pub initial_odometer: i64,
    pub acquired_at: NaiveDate,
    /// `None` para remolques
    pub watermarks: Option<MaintenanceWatermarks>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn is_truck(&self) -> bool {
        self.kind == VehicleKind::Truck
    }

    /// Kilómetros recorridos desde el último cambio de aceite
    pub fn km_since_oil_change(&self) -> Option<i64> {
        self.watermarks
            .as_ref()
            .map(|w| self.current_odometer - w.last_oil_change_odometer)
    }

    /// Marca el registro como modificado para el próximo commit
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = now;
    }
}

/// Datos necesarios para registrar un vehículo nuevo
#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub kind: VehicleKind,
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub initial_odometer: i64,
    pub current_odometer: Option<i64>,
    pub acquired_at: NaiveDate,
    pub last_oil_change_date: Option<DateTime<Utc>>,
    pub last_inspection_date: Option<DateTime<Utc>>,
}

/// Edición de datos descriptivos (admin)
#[derive(Debug, Clone, Default)]
pub struct VehicleDetailsUpdate {
    pub brand: Option<String>,
    pub model: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_status_names() {
        assert_eq!(VehicleStatus::InUse.as_str(), "in_use");
        assert_eq!(
            serde_json::to_value(VehicleStatus::Maintenance).unwrap(),
            serde_json::json!("maintenance")
        );
        assert_eq!(
            serde_json::from_value::<VehicleKind>(serde_json::json!("Trailer")).unwrap(),
            VehicleKind::Trailer
        );
    }
}
