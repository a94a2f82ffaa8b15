use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{NewTrip, Trip, TripDataUpdate, TripEdit, TripStatus};
use crate::utils::validation::validate_not_empty;

// Request para crear un viaje
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTripRequest {
    pub truck_id: Uuid,
    pub trailer_id: Option<Uuid>,
    pub driver_id: Uuid,
    #[validate(custom = "validate_not_empty", length(max = 200))]
    pub start_location: String,
    #[validate(custom = "validate_not_empty", length(max = 200))]
    pub end_location: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    #[validate(range(min = 0))]
    pub start_odometer: Option<i64>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[serde(default)]
    pub start_immediately: bool,
}

impl From<CreateTripRequest> for NewTrip {
    fn from(r: CreateTripRequest) -> Self {
        Self {
            truck_id: r.truck_id,
            trailer_id: r.trailer_id,
            driver_id: r.driver_id,
            start_location: r.start_location,
            end_location: r.end_location,
            start_date: r.start_date,
            end_date: r.end_date,
            start_odometer: r.start_odometer,
            notes: r.notes,
            start_immediately: r.start_immediately,
        }
    }
}

// Request para cambiar el estado
#[derive(Debug, Deserialize)]
pub struct UpdateTripStatusRequest {
    pub status: TripStatus,
}

// Request del conductor con los datos del viaje
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTripDataRequest {
    #[validate(range(min = 0))]
    pub start_odometer: Option<i64>,
    #[validate(range(min = 0))]
    pub end_odometer: Option<i64>,
    #[validate(range(min = 0.0))]
    pub fuel_used: Option<f64>,
    pub fuel_cost: Option<Decimal>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub end_date: Option<DateTime<Utc>>,
}

impl From<UpdateTripDataRequest> for TripDataUpdate {
    fn from(r: UpdateTripDataRequest) -> Self {
        Self {
            start_odometer: r.start_odometer,
            end_odometer: r.end_odometer,
            fuel_used: r.fuel_used,
            fuel_cost: r.fuel_cost,
            notes: r.notes,
            end_date: r.end_date,
        }
    }
}

// Request de edición completa (admin)
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EditTripRequest {
    pub truck_id: Option<Uuid>,
    pub trailer_id: Option<Uuid>,
    pub driver_id: Option<Uuid>,
    #[validate(custom = "validate_not_empty", length(max = 200))]
    pub start_location: Option<String>,
    #[validate(custom = "validate_not_empty", length(max = 200))]
    pub end_location: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub fuel_cost: Option<Decimal>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl From<EditTripRequest> for TripEdit {
    fn from(r: EditTripRequest) -> Self {
        Self {
            truck_id: r.truck_id,
            trailer_id: r.trailer_id,
            driver_id: r.driver_id,
            start_location: r.start_location,
            end_location: r.end_location,
            start_date: r.start_date,
            end_date: r.end_date,
            fuel_cost: r.fuel_cost,
            notes: r.notes,
        }
    }
}

// Response de viaje con la distancia derivada
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripResponse {
    #[serde(flatten)]
    pub trip: Trip,
    pub distance: i64,
}

impl From<Trip> for TripResponse {
    fn from(trip: Trip) -> Self {
        let distance = trip.distance();
        Self { trip, distance }
    }
}
