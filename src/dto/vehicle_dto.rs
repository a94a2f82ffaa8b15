use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    MaintenanceObligation, NewVehicle, Vehicle, VehicleDetailsUpdate, VehicleKind, VehicleStatus,
};
use crate::utils::validation::{validate_not_empty, validate_plate};

// Request para registrar un vehículo
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterVehicleRequest {
    pub kind: VehicleKind,
    #[validate(custom = "validate_plate")]
    pub plate: String,
    #[validate(custom = "validate_not_empty", length(max = 100))]
    pub brand: String,
    #[validate(custom = "validate_not_empty", length(max = 100))]
    pub model: String,
    #[validate(range(min = 0))]
    pub initial_odometer: i64,
    #[validate(range(min = 0))]
    pub current_odometer: Option<i64>,
    pub acquired_at: NaiveDate,
    pub last_oil_change_date: Option<DateTime<Utc>>,
    pub last_inspection_date: Option<DateTime<Utc>>,
}

impl From<RegisterVehicleRequest> for NewVehicle {
    fn from(r: RegisterVehicleRequest) -> Self {
        Self {
            kind: r.kind,
            plate: r.plate,
            brand: r.brand,
            model: r.model,
            initial_odometer: r.initial_odometer,
            current_odometer: r.current_odometer,
            acquired_at: r.acquired_at,
            last_oil_change_date: r.last_oil_change_date,
            last_inspection_date: r.last_inspection_date,
        }
    }
}

// Request para actualizar datos descriptivos
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVehicleRequest {
    #[validate(custom = "validate_not_empty", length(max = 100))]
    pub brand: Option<String>,
    #[validate(custom = "validate_not_empty", length(max = 100))]
    pub model: Option<String>,
}

impl From<UpdateVehicleRequest> for VehicleDetailsUpdate {
    fn from(r: UpdateVehicleRequest) -> Self {
        Self {
            brand: r.brand,
            model: r.model,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateVehicleStatusRequest {
    pub status: VehicleStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOdometerRequest {
    #[validate(range(min = 0))]
    pub odometer: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct VehicleListQuery {
    pub kind: Option<VehicleKind>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

// Response de disponibilidad
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub vehicle_id: Uuid,
    pub available: bool,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

// Response de actualización de odómetro
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OdometerResponse {
    pub vehicle: Vehicle,
    pub maintenance_scheduled: Option<MaintenanceObligation>,
}
