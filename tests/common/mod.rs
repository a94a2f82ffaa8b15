#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use fleet_manager::config::FleetPolicies;
use fleet_manager::models::{Actor, NewTrip, NewVehicle, Vehicle, VehicleKind};
use fleet_manager::repositories::InMemoryFleetRepository;
use fleet_manager::services::FleetServices;
use uuid::Uuid;

pub fn services() -> FleetServices {
    FleetServices::new(Arc::new(InMemoryFleetRepository::new()), FleetPolicies::default())
}

pub fn jan(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
}

pub fn admin() -> Actor {
    Actor::admin(Uuid::new_v4())
}

pub async fn register(services: &FleetServices, kind: VehicleKind, odometer: i64) -> Vehicle {
    services
        .vehicles
        .register_vehicle(
            &admin(),
            NewVehicle {
                kind,
                plate: format!("FL-{}", &Uuid::new_v4().simple().to_string()[..8]),
                brand: "Volvo".to_string(),
                model: "FH16".to_string(),
                initial_odometer: odometer,
                current_odometer: None,
                acquired_at: NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
                last_oil_change_date: None,
                last_inspection_date: None,
            },
        )
        .await
        .unwrap()
}

pub fn trip_request(truck_id: Uuid, driver_id: Uuid, start: u32, end: u32) -> NewTrip {
    NewTrip {
        truck_id,
        trailer_id: None,
        driver_id,
        start_location: "Lyon".to_string(),
        end_location: "Marseille".to_string(),
        start_date: jan(start),
        end_date: Some(jan(end)),
        start_odometer: None,
        notes: None,
        start_immediately: false,
    }
}
