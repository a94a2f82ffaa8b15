//! Modelo de Maintenance
//!
//! Obligaciones de mantenimiento ligadas a un camión o remolque y las
//! alertas que produce el reporte de mantenimiento.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;

use crate::models::vehicle::{Vehicle, VehicleKind};

/// Tipo de mantenimiento - mapea al ENUM maintenance_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "maintenance_type", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum MaintenanceType {
    OilChange,
    TireReplacement,
    Inspection,
    Other,
}

impl MaintenanceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceType::OilChange => "oil-change",
            MaintenanceType::TireReplacement => "tire-replacement",
            MaintenanceType::Inspection => "inspection",
            MaintenanceType::Other => "other",
        }
    }
}

/// Estado de la obligación - mapea al ENUM maintenance_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "maintenance_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl MaintenanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceStatus::Scheduled => "scheduled",
            MaintenanceStatus::InProgress => "in_progress",
            MaintenanceStatus::Completed => "completed",
            MaintenanceStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, MaintenanceStatus::Scheduled | MaintenanceStatus::InProgress)
    }
}

/// Obligación de mantenimiento
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceObligation {
    pub id: Uuid,
    pub target_id: Uuid,
    pub target_model: VehicleKind,
    pub maintenance_type: MaintenanceType,
    pub status: MaintenanceStatus,
    pub scheduled_date: DateTime<Utc>,
    pub completed_date: Option<DateTime<Utc>>,
    pub cost: Option<Decimal>,
    pub notes: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MaintenanceObligation {
    /// Obligación nueva en estado `scheduled`
    pub fn scheduled(
        vehicle: &Vehicle,
        maintenance_type: MaintenanceType,
        scheduled_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            target_id: vehicle.id,
            target_model: vehicle.kind,
            maintenance_type,
            status: MaintenanceStatus::Scheduled,
            scheduled_date,
            completed_date: None,
            cost: None,
            notes: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = now;
    }
}

/// Solicitud de mantenimiento manual (admin)
#[derive(Debug, Clone)]
pub struct NewMaintenance {
    pub target_id: Uuid,
    pub maintenance_type: MaintenanceType,
    pub scheduled_date: DateTime<Utc>,
    pub cost: Option<Decimal>,
    pub notes: Option<String>,
}

/// Datos de cierre de un mantenimiento
#[derive(Debug, Clone, Default)]
pub struct MaintenanceCompletion {
    pub completed_date: Option<DateTime<Utc>>,
    pub cost: Option<Decimal>,
    pub notes: Option<String>,
    /// Odómetro al momento del servicio; por defecto el actual del vehículo
    pub odometer: Option<i64>,
}

/// Urgencia de una alerta de mantenimiento
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Medium,
    High,
}

/// Alerta producida por el reporte de mantenimiento
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceAlert {
    #[serde(rename = "type")]
    pub maintenance_type: MaintenanceType,
    pub message: String,
    pub urgency: Urgency,
}

/// Vehículo con sus alertas pendientes
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleMaintenanceReport {
    pub vehicle: Vehicle,
    pub vehicle_type: VehicleKind,
    pub alerts: Vec<MaintenanceAlert>,
}
