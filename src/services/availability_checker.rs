//! Verificación de disponibilidad
//!
//! Comprobación pura, sin efectos: un vehículo está libre en una ventana si
//! existe, no está en mantenimiento y ningún viaje activo suyo se solapa.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::models::{Trip, TripStatus, TripWindow, Vehicle, VehicleKind, VehicleStatus};
use crate::repositories::{FleetRepository, TripFilter};
use crate::utils::errors::{AppError, AppResult};

pub struct AvailabilityChecker {
    repository: Arc<dyn FleetRepository>,
}

/// Ventana ocupada por un viaje existente; sin `end_date` queda abierta
fn claims(trip: &Trip, window: &TripWindow) -> bool {
    match trip.window() {
        Some(existing) => existing.overlaps(window),
        None => trip.start_date <= window.end,
    }
}

/// Valida la ventana solicitada
pub fn resolve_window(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> AppResult<TripWindow> {
    let end = end.ok_or_else(|| {
        AppError::IncompleteWindow("an end date is required to check availability".to_string())
    })?;
    TripWindow::new(start, end).ok_or_else(|| {
        AppError::IncompleteWindow(format!("end date {} precedes start date {}", end, start))
    })
}

impl AvailabilityChecker {
    pub fn new(repository: Arc<dyn FleetRepository>) -> Self {
        Self { repository }
    }

    /// `Ok(())` si el vehículo está libre en `[start, end]`
    pub async fn check_available(
        &self,
        vehicle_id: Uuid,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        self.check_excluding(vehicle_id, start, end, None).await.map(|_| ())
    }

    pub async fn check_truck_available(
        &self,
        truck_id: Uuid,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> AppResult<Vehicle> {
        let vehicle = self.check_excluding(truck_id, start, end, None).await?;
        expect_kind(&vehicle, VehicleKind::Truck)?;
        Ok(vehicle)
    }

    pub async fn check_trailer_available(
        &self,
        trailer_id: Uuid,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> AppResult<Vehicle> {
        let vehicle = self.check_excluding(trailer_id, start, end, None).await?;
        expect_kind(&vehicle, VehicleKind::Trailer)?;
        Ok(vehicle)
    }

    /// Igual que `check_available` ignorando un viaje (edición de ese viaje)
    pub async fn check_excluding(
        &self,
        vehicle_id: Uuid,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
        exclude_trip: Option<Uuid>,
    ) -> AppResult<Vehicle> {
        let vehicle = self
            .repository
            .find_vehicle(vehicle_id)
            .await?
            .ok_or(AppError::VehicleNotFound(vehicle_id))?;
        let window = resolve_window(start, end)?;

        if vehicle.status == VehicleStatus::Maintenance {
            return Err(AppError::VehicleUnderMaintenance(vehicle_id));
        }

        let active = self
            .repository
            .list_trips(
                &TripFilter::by_vehicle(vehicle_id)
                    .with_statuses(&[TripStatus::Pending, TripStatus::InProgress]),
            )
            .await?;
        let conflict = active
            .iter()
            .filter(|trip| Some(trip.id) != exclude_trip)
            .find(|trip| claims(trip, &window));
        if let Some(trip) = conflict {
            debug!(
                "📅 Vehículo {} ocupado por el viaje {} ({} - {:?})",
                vehicle.plate, trip.id, trip.start_date, trip.end_date
            );
            return Err(AppError::OverlappingAssignment(vehicle_id));
        }

        Ok(vehicle)
    }
}

pub(crate) fn expect_kind(vehicle: &Vehicle, kind: VehicleKind) -> AppResult<()> {
    if vehicle.kind != kind {
        return Err(AppError::BadRequest(format!(
            "vehicle {} is a {}, expected a {}",
            vehicle.plate,
            vehicle.kind.as_str(),
            kind.as_str()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{ChangeSet, InMemoryFleetRepository};
    use chrono::{NaiveDate, TimeZone};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn vehicle(kind: VehicleKind, status: VehicleStatus) -> Vehicle {
        let now = Utc::now();
        Vehicle {
            id: Uuid::new_v4(),
            kind,
            plate: format!("V-{}", Uuid::new_v4().simple()),
            brand: "Renault".to_string(),
            model: "T480".to_string(),
            status,
            current_odometer: 0,
            initial_odometer: 0,
            acquired_at: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            watermarks: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    fn trip(truck_id: Uuid, start: DateTime<Utc>, end: Option<DateTime<Utc>>, status: TripStatus) -> Trip {
        let now = Utc::now();
        Trip {
            id: Uuid::new_v4(),
            truck_id,
            trailer_id: None,
            driver_id: Uuid::new_v4(),
            start_location: "Tanger".to_string(),
            end_location: "Agadir".to_string(),
            start_date: start,
            end_date: end,
            status,
            start_odometer: None,
            end_odometer: None,
            fuel_used: None,
            fuel_cost: None,
            notes: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    async fn setup(vehicle: &Vehicle, trips: Vec<Trip>) -> AvailabilityChecker {
        let repo = Arc::new(InMemoryFleetRepository::new());
        let mut changes = ChangeSet::new();
        changes.insert_vehicle(vehicle.clone());
        for t in trips {
            changes.insert_trip(t);
        }
        repo.commit(changes).await.unwrap();
        AvailabilityChecker::new(repo)
    }

    #[tokio::test]
    async fn test_overlap_is_inclusive() {
        let truck = vehicle(VehicleKind::Truck, VehicleStatus::Available);
        let existing = trip(truck.id, day(10), Some(day(15)), TripStatus::Pending);
        let checker = setup(&truck, vec![existing]).await;

        assert!(matches!(
            checker.check_available(truck.id, day(12), Some(day(20))).await,
            Err(AppError::OverlappingAssignment(_))
        ));
        assert!(matches!(
            checker.check_available(truck.id, day(15), Some(day(20))).await,
            Err(AppError::OverlappingAssignment(_))
        ));
        checker.check_available(truck.id, day(16), Some(day(20))).await.unwrap();
    }

    #[tokio::test]
    async fn test_finished_trips_do_not_block() {
        let truck = vehicle(VehicleKind::Truck, VehicleStatus::Available);
        let done = trip(truck.id, day(10), Some(day(15)), TripStatus::Completed);
        let cancelled = trip(truck.id, day(10), Some(day(15)), TripStatus::Cancelled);
        let checker = setup(&truck, vec![done, cancelled]).await;

        checker.check_available(truck.id, day(11), Some(day(12))).await.unwrap();
    }

    #[tokio::test]
    async fn test_open_ended_request_is_rejected() {
        let truck = vehicle(VehicleKind::Truck, VehicleStatus::Available);
        let checker = setup(&truck, vec![]).await;

        assert!(matches!(
            checker.check_available(truck.id, day(10), None).await,
            Err(AppError::IncompleteWindow(_))
        ));
        assert!(matches!(
            checker.check_available(truck.id, day(10), Some(day(9))).await,
            Err(AppError::IncompleteWindow(_))
        ));
    }

    #[tokio::test]
    async fn test_open_ended_existing_trip_claims_the_future() {
        let truck = vehicle(VehicleKind::Truck, VehicleStatus::Available);
        let open = trip(truck.id, day(10), None, TripStatus::InProgress);
        let checker = setup(&truck, vec![open]).await;

        checker.check_available(truck.id, day(1), Some(day(9))).await.unwrap();
        assert!(matches!(
            checker.check_available(truck.id, day(20), Some(day(25))).await,
            Err(AppError::OverlappingAssignment(_))
        ));
    }

    #[tokio::test]
    async fn test_maintenance_and_missing_vehicle() {
        let truck = vehicle(VehicleKind::Truck, VehicleStatus::Maintenance);
        let checker = setup(&truck, vec![]).await;

        assert!(matches!(
            checker.check_available(truck.id, day(1), Some(day(2))).await,
            Err(AppError::VehicleUnderMaintenance(_))
        ));
        assert!(matches!(
            checker.check_available(Uuid::new_v4(), day(1), Some(day(2))).await,
            Err(AppError::VehicleNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_trailer_check_requires_a_trailer() {
        let trailer = vehicle(VehicleKind::Trailer, VehicleStatus::Available);
        let checker = setup(&trailer, vec![]).await;

        checker
            .check_trailer_available(trailer.id, day(1), Some(day(2)))
            .await
            .unwrap();
        assert!(matches!(
            checker.check_truck_available(trailer.id, day(1), Some(day(2))).await,
            Err(AppError::BadRequest(_))
        ));
    }
}
