//! Modelo de Trip
//!
//! Contiene el struct Trip, la máquina de estados de su ciclo de vida
//! y la ventana de disponibilidad que reclama sobre sus vehículos.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;

use crate::models::auth::UserRole;

/// Estado del viaje - mapea al ENUM trip_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "trip_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Pending => "pending",
            TripStatus::InProgress => "in_progress",
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
        }
    }

    /// Estados que reclaman el vehículo durante su ventana
    pub fn is_active(&self) -> bool {
        matches!(self, TripStatus::Pending | TripStatus::InProgress)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TripStatus::Completed | TripStatus::Cancelled)
    }

    /// Aristas permitidas de la máquina de estados.
    /// `in_progress -> cancelled` solo lo puede hacer un admin.
    pub fn can_transition_to(&self, next: TripStatus, role: UserRole) -> bool {
        match (self, next) {
            (TripStatus::Pending, TripStatus::InProgress) => true,
            (TripStatus::Pending, TripStatus::Cancelled) => true,
            (TripStatus::InProgress, TripStatus::Completed) => true,
            (TripStatus::InProgress, TripStatus::Cancelled) => role == UserRole::Admin,
            _ => false,
        }
    }
}

/// Ventana `[start, end]` con semántica de solapamiento inclusiva
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TripWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn overlaps(&self, other: &TripWindow) -> bool {
        self.start <= other.end && self.end >= other.start
    }
}

/// Trip principal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: Uuid,
    pub truck_id: Uuid,
    pub trailer_id: Option<Uuid>,
    pub driver_id: Uuid,
    pub start_location: String,
    pub end_location: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: TripStatus,
    pub start_odometer: Option<i64>,
    pub end_odometer: Option<i64>,
    pub fuel_used: Option<f64>,
    pub fuel_cost: Option<Decimal>,
    pub notes: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    /// Distancia recorrida; 0 mientras falte alguno de los odómetros
    pub fn distance(&self) -> i64 {
        match (self.start_odometer, self.end_odometer) {
            (Some(start), Some(end)) => end - start,
            _ => 0,
        }
    }

    /// `None` cuando la ventana está abierta (sin `end_date`)
    pub fn window(&self) -> Option<TripWindow> {
        self.end_date
            .and_then(|end| TripWindow::new(self.start_date, end))
    }

    /// Vehículos reclamados por el viaje: camión y, si existe, remolque
    pub fn vehicle_ids(&self) -> Vec<Uuid> {
        let mut ids = vec![self.truck_id];
        ids.extend(self.trailer_id);
        ids
    }

    pub fn uses_vehicle(&self, vehicle_id: Uuid) -> bool {
        self.truck_id == vehicle_id || self.trailer_id == Some(vehicle_id)
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = now;
    }
}

/// Datos para crear un viaje
#[derive(Debug, Clone)]
pub struct NewTrip {
    pub truck_id: Uuid,
    pub trailer_id: Option<Uuid>,
    pub driver_id: Uuid,
    pub start_location: String,
    pub end_location: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub start_odometer: Option<i64>,
    pub notes: Option<String>,
    /// Arranca directamente en `in_progress`
    pub start_immediately: bool,
}

/// Datos que el conductor reporta durante el viaje
#[derive(Debug, Clone, Default)]
pub struct TripDataUpdate {
    pub start_odometer: Option<i64>,
    pub end_odometer: Option<i64>,
    pub fuel_used: Option<f64>,
    pub fuel_cost: Option<Decimal>,
    pub notes: Option<String>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Edición completa por parte de un admin
#[derive(Debug, Clone, Default)]
pub struct TripEdit {
    pub truck_id: Option<Uuid>,
    pub trailer_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    pub start_location: Option<String>,
    pub end_location: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub fuel_cost: Option<Decimal>,
    pub notes: Option<String>,
}

impl TripEdit {
    /// La edición cambia vehículos, conductor o ventana
    pub fn touches_assignment(&self) -> bool {
        self.truck_id.is_some()
            || self.trailer_id.is_some()
            || self.driver_id.is_some()
            || self.start_date.is_some()
            || self.end_date.is_some()
    }
}
