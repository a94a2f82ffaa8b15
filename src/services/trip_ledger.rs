//! Libro de viajes
//!
//! Dueño de los registros `Trip` y de su máquina de estados. Cada operación
//! toma los bloqueos del conductor y de los vehículos implicados, verifica
//! las invariantes y confirma viaje, vehículos y obligaciones en un único
//! `ChangeSet`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::availability_checker::{expect_kind, AvailabilityChecker};
use super::ensure_admin;
use super::events::{EventPublisher, FleetEvent};
use super::keyed_locks::{KeyedLocks, LockKey};
use super::maintenance_scheduler::MaintenanceScheduler;
use super::vehicle_registry::VehicleRegistry;
use crate::config::{FuelPlausibilityPolicy, TripCreationPolicy};
use crate::models::{
    Actor, MaintenanceObligation, NewTrip, Trip, TripDataUpdate, TripEdit, TripStatus, Vehicle,
    VehicleKind, VehicleStatus,
};
use crate::repositories::{ChangeSet, FleetRepository, TripFilter};
use crate::utils::errors::{forbidden_error, not_found_error, AppError, AppResult};

pub struct TripLedger {
    repository: Arc<dyn FleetRepository>,
    locks: KeyedLocks,
    availability: Arc<AvailabilityChecker>,
    scheduler: Arc<MaintenanceScheduler>,
    events: EventPublisher,
    fuel_policy: FuelPlausibilityPolicy,
    creation_policy: TripCreationPolicy,
}

fn trip_keys(trip: &Trip) -> Vec<LockKey> {
    let mut keys = vec![LockKey::Driver(trip.driver_id)];
    keys.extend(trip.vehicle_ids().into_iter().map(LockKey::Vehicle));
    keys
}

/// Salida a ruta: un vehículo ya `in_use` pertenece a otro viaje en curso
fn dispatch(vehicle: &mut Vehicle) -> AppResult<()> {
    if vehicle.status == VehicleStatus::InUse {
        return Err(AppError::InvalidTransition(format!(
            "vehicle {} is already in use on another trip",
            vehicle.plate
        )));
    }
    VehicleRegistry::transition(vehicle, VehicleStatus::InUse)
}

fn require_location(value: &str, field: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(value.to_string())
}

impl TripLedger {
    pub fn new(
        repository: Arc<dyn FleetRepository>,
        locks: KeyedLocks,
        availability: Arc<AvailabilityChecker>,
        scheduler: Arc<MaintenanceScheduler>,
        events: EventPublisher,
        fuel_policy: FuelPlausibilityPolicy,
        creation_policy: TripCreationPolicy,
    ) -> Self {
        Self {
            repository,
            locks,
            availability,
            scheduler,
            events,
            fuel_policy,
            creation_policy,
        }
    }

    /// Viaje visible para el actor: admin ve todos, el conductor solo los suyos
    pub async fn get_trip(&self, actor: &Actor, id: Uuid) -> AppResult<Trip> {
        let trip = self.load_trip(id).await?;
        if !actor.is_admin() && trip.driver_id != actor.user_id {
            return Err(forbidden_error("view trip", "trip is assigned to another driver"));
        }
        Ok(trip)
    }

    pub async fn list_trips(&self, actor: &Actor) -> AppResult<Vec<Trip>> {
        let filter = if actor.is_admin() {
            TripFilter::default()
        } else {
            TripFilter::by_driver(actor.user_id)
        };
        self.repository.list_trips(&filter).await
    }

    /// Crea un viaje tras verificar la disponibilidad del camión
    /// (y del remolque si la política lo exige)
    pub async fn create_trip(&self, actor: &Actor, new: NewTrip) -> AppResult<Trip> {
        ensure_admin(actor, "create trip")?;
        let start_location = require_location(&new.start_location, "startLocation")?;
        let end_location = require_location(&new.end_location, "endLocation")?;
        if new.trailer_id == Some(new.truck_id) {
            return Err(AppError::BadRequest(
                "truck and trailer must be different vehicles".to_string(),
            ));
        }

        let mut keys = vec![LockKey::Driver(new.driver_id), LockKey::Vehicle(new.truck_id)];
        keys.extend(new.trailer_id.map(LockKey::Vehicle));
        let _guard = self.locks.acquire(keys).await;

        let mut truck = self
            .availability
            .check_truck_available(new.truck_id, new.start_date, new.end_date)
            .await?;
        let mut trailer = match new.trailer_id {
            Some(trailer_id) => Some(
                self.resolve_trailer(trailer_id, new.start_date, new.end_date, None)
                    .await?,
            ),
            None => None,
        };

        let start_odometer = new.start_odometer.unwrap_or(truck.current_odometer);
        if start_odometer < 0 {
            return Err(AppError::InvalidOdometer(
                "start odometer must be non-negative".to_string(),
            ));
        }

        let now = Utc::now();
        let mut trip = Trip {
            id: Uuid::new_v4(),
            truck_id: new.truck_id,
            trailer_id: new.trailer_id,
            driver_id: new.driver_id,
            start_location,
            end_location,
            start_date: new.start_date,
            end_date: new.end_date,
            status: TripStatus::Pending,
            start_odometer: Some(start_odometer),
            end_odometer: None,
            fuel_used: None,
            fuel_cost: None,
            notes: new.notes,
            version: 1,
            created_at: now,
            updated_at: now,
        };

        let mut changes = ChangeSet::new();
        if new.start_immediately {
            self.ensure_driver_free(new.driver_id, None).await?;
            dispatch(&mut truck)?;
            truck.touch(now);
            changes.update_vehicle(truck);
            if let Some(mut trailer) = trailer.take() {
                dispatch(&mut trailer)?;
                trailer.touch(now);
                changes.update_vehicle(trailer);
            }
            trip.status = TripStatus::InProgress;
        }
        changes.insert_trip(trip.clone());
        self.repository.commit(changes).await?;

        info!(
            "🆕 Viaje {} creado: {} -> {} ({})",
            trip.id,
            trip.start_location,
            trip.end_location,
            trip.status.as_str()
        );
        Ok(trip)
    }

    /// Transición de estado pedida por el conductor asignado o por un admin
    pub async fn transition_status(
        &self,
        actor: &Actor,
        trip_id: Uuid,
        next: TripStatus,
    ) -> AppResult<Trip> {
        let snapshot = self.load_trip(trip_id).await?;
        self.authorize(actor, &snapshot, "change trip status")?;
        let _guard = self.locks.acquire(trip_keys(&snapshot)).await;
        let mut trip = self.reload_locked(&snapshot).await?;

        if trip.status == TripStatus::Completed {
            return Err(AppError::InvalidTransition(format!(
                "trip {} is completed; its status can no longer change",
                trip.id
            )));
        }
        if !trip.status.can_transition_to(next, actor.role) {
            warn!(
                "⚠️ Transición rechazada para el viaje {}: {} -> {}",
                trip.id,
                trip.status.as_str(),
                next.as_str()
            );
            return Err(AppError::InvalidTransition(format!(
                "{} -> {} is not allowed",
                trip.status.as_str(),
                next.as_str()
            )));
        }

        let now = Utc::now();
        let previous = trip.status;
        let originals = self.load_vehicles(&trip).await?;
        let mut vehicles = originals.clone();
        let mut obligation: Option<MaintenanceObligation> = None;

        match next {
            TripStatus::InProgress => {
                if let Err(e) = self.ensure_driver_free(trip.driver_id, Some(trip.id)).await {
                    warn!("⚠️ Conductor {} ya tiene un viaje en curso", trip.driver_id);
                    return Err(e);
                }
                for vehicle in vehicles.iter_mut() {
                    if let Err(e) = dispatch(vehicle) {
                        warn!("⚠️ Vehículo {} ya está en ruta", vehicle.plate);
                        return Err(e);
                    }
                }
                if trip.start_odometer.is_none() {
                    trip.start_odometer = vehicles
                        .iter()
                        .find(|v| v.id == trip.truck_id)
                        .map(|v| v.current_odometer);
                }
                trip.status = TripStatus::InProgress;
            }
            TripStatus::Completed => {
                trip.status = TripStatus::Completed;
                if trip.end_date.is_none() {
                    trip.end_date = Some(now);
                }
                self.release(&trip, &mut vehicles).await?;
                if let Some(truck) = vehicles.iter_mut().find(|v| v.id == trip.truck_id) {
                    if let Some(end) = trip.end_odometer {
                        if end > truck.current_odometer {
                            VehicleRegistry::apply_odometer(truck, end)?;
                        }
                    }
                    obligation = self.scheduler.evaluate(truck, now)?;
                }
            }
            TripStatus::Cancelled => {
                trip.status = TripStatus::Cancelled;
                if previous == TripStatus::InProgress {
                    self.release(&trip, &mut vehicles).await?;
                }
            }
            TripStatus::Pending => {
                return Err(AppError::InvalidTransition(
                    "a trip cannot return to pending".to_string(),
                ))
            }
        }

        trip.touch(now);
        let mut changes = ChangeSet::new();
        changes.update_trip(trip.clone());
        for (mut vehicle, original) in vehicles.into_iter().zip(originals.iter()) {
            if &vehicle != original {
                vehicle.touch(now);
                changes.update_vehicle(vehicle);
            }
        }
        if let Some(obligation) = &obligation {
            changes.insert_maintenance(obligation.clone());
        }
        self.repository.commit(changes).await?;

        info!(
            "🚚 Viaje {}: {} -> {}",
            trip.id,
            previous.as_str(),
            trip.status.as_str()
        );
        if let Some(obligation) = &obligation {
            self.scheduler.announce(obligation);
        }
        if trip.status == TripStatus::Completed {
            self.events.publish(FleetEvent::TripCompleted {
                trip_id: trip.id,
                driver_id: trip.driver_id,
                truck_id: trip.truck_id,
                distance: trip.distance(),
            });
        }
        Ok(trip)
    }

    /// Datos reportados por el conductor: odómetros, combustible, notas, fecha de fin
    pub async fn update_trip_data(
        &self,
        actor: &Actor,
        trip_id: Uuid,
        update: TripDataUpdate,
    ) -> AppResult<Trip> {
        let snapshot = self.load_trip(trip_id).await?;
        if snapshot.driver_id != actor.user_id {
            return Err(forbidden_error(
                "update trip data",
                "only the assigned driver can report trip data",
            ));
        }
        let _guard = self.locks.acquire(trip_keys(&snapshot)).await;
        let mut trip = self.reload_locked(&snapshot).await?;

        match trip.status {
            TripStatus::Completed => return Err(AppError::TripAlreadyCompleted(trip.id)),
            TripStatus::Cancelled => {
                return Err(AppError::InvalidTransition(format!(
                    "trip {} is cancelled",
                    trip.id
                )))
            }
            TripStatus::Pending | TripStatus::InProgress => {}
        }

        let start = update.start_odometer.or(trip.start_odometer);
        let end = update.end_odometer.or(trip.end_odometer);
        if start.map_or(false, |s| s < 0) || end.map_or(false, |e| e < 0) {
            return Err(AppError::InvalidOdometer(
                "odometer readings must be non-negative".to_string(),
            ));
        }
        if let (Some(start), Some(end)) = (start, end) {
            if end <= start {
                return Err(AppError::InvalidOdometerRange { start, end });
            }
        }

        let fuel_used = update.fuel_used.or(trip.fuel_used);
        if let (Some(fuel), Some(start), Some(end)) = (fuel_used, start, end) {
            let consumption = fuel / (end - start) as f64 * 100.0;
            if !self.fuel_policy.contains(consumption) {
                warn!(
                    "⛽ Consumo implausible en el viaje {}: {:.1} L/100km",
                    trip.id, consumption
                );
                return Err(AppError::ImplausibleFuelConsumption {
                    consumption,
                    min: self.fuel_policy.min_l_per_100km,
                    max: self.fuel_policy.max_l_per_100km,
                });
            }
        }
        if let Some(end_date) = update.end_date {
            if end_date < trip.start_date {
                return Err(AppError::BadRequest(
                    "endDate must not precede startDate".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let mut changes = ChangeSet::new();
        let mut obligation = None;
        if let Some(end_odometer) = update.end_odometer {
            let mut truck = self.load_vehicle(trip.truck_id).await?;
            let original = truck.clone();
            VehicleRegistry::apply_odometer(&mut truck, end_odometer)?;
            obligation = self.scheduler.evaluate(&mut truck, now)?;
            if truck != original {
                truck.touch(now);
                changes.update_vehicle(truck);
            }
        }

        trip.start_odometer = start;
        trip.end_odometer = end;
        trip.fuel_used = fuel_used;
        if update.fuel_cost.is_some() {
            trip.fuel_cost = update.fuel_cost;
        }
        if update.notes.is_some() {
            trip.notes = update.notes;
        }
        if update.end_date.is_some() {
            trip.end_date = update.end_date;
        }
        trip.touch(now);
        changes.update_trip(trip.clone());
        if let Some(obligation) = &obligation {
            changes.insert_maintenance(obligation.clone());
        }
        self.repository.commit(changes).await?;

        info!("📝 Datos del viaje {} actualizados (distancia {} km)", trip.id, trip.distance());
        if let Some(obligation) = &obligation {
            self.scheduler.announce(obligation);
        }
        Ok(trip)
    }

    /// Edición completa (admin). Reasignar o mover la ventana solo en `pending`.
    pub async fn edit_trip(&self, actor: &Actor, trip_id: Uuid, edit: TripEdit) -> AppResult<Trip> {
        ensure_admin(actor, "edit trip")?;
        let snapshot = self.load_trip(trip_id).await?;

        let mut keys = trip_keys(&snapshot);
        keys.extend(edit.driver_id.map(LockKey::Driver));
        keys.extend(edit.truck_id.map(LockKey::Vehicle));
        keys.extend(edit.trailer_id.map(LockKey::Vehicle));
        let _guard = self.locks.acquire(keys).await;
        let mut trip = self.reload_locked(&snapshot).await?;

        if trip.status.is_terminal() {
            return Err(AppError::InvalidTransition(format!(
                "trip {} is {} and cannot be edited",
                trip.id,
                trip.status.as_str()
            )));
        }
        let reassigning = edit.touches_assignment();
        if reassigning && trip.status != TripStatus::Pending {
            return Err(AppError::InvalidTransition(
                "only pending trips can be reassigned or rescheduled".to_string(),
            ));
        }

        if let Some(location) = edit.start_location {
            trip.start_location = require_location(&location, "startLocation")?;
        }
        if let Some(location) = edit.end_location {
            trip.end_location = require_location(&location, "endLocation")?;
        }
        if let Some(notes) = edit.notes {
            trip.notes = Some(notes);
        }
        if edit.fuel_cost.is_some() {
            trip.fuel_cost = edit.fuel_cost;
        }

        if reassigning {
            trip.truck_id = edit.truck_id.unwrap_or(trip.truck_id);
            trip.trailer_id = edit.trailer_id.or(trip.trailer_id);
            trip.driver_id = edit.driver_id.unwrap_or(trip.driver_id);
            trip.start_date = edit.start_date.unwrap_or(trip.start_date);
            trip.end_date = edit.end_date.or(trip.end_date);
            if trip.trailer_id == Some(trip.truck_id) {
                return Err(AppError::BadRequest(
                    "truck and trailer must be different vehicles".to_string(),
                ));
            }

            let truck = self
                .availability
                .check_excluding(trip.truck_id, trip.start_date, trip.end_date, Some(trip.id))
                .await?;
            expect_kind(&truck, VehicleKind::Truck)?;
            if let Some(trailer_id) = trip.trailer_id {
                self.resolve_trailer(trailer_id, trip.start_date, trip.end_date, Some(trip.id))
                    .await?;
            }
        }

        trip.touch(Utc::now());
        let mut changes = ChangeSet::new();
        changes.update_trip(trip.clone());
        self.repository.commit(changes).await?;

        info!("✏️ Viaje {} editado", trip.id);
        Ok(trip)
    }

    /// Borrado (admin) de un viaje terminado
    pub async fn delete_trip(&self, actor: &Actor, trip_id: Uuid) -> AppResult<()> {
        ensure_admin(actor, "delete trip")?;
        let snapshot = self.load_trip(trip_id).await?;
        let _guard = self.locks.acquire(trip_keys(&snapshot)).await;
        let trip = self.reload_locked(&snapshot).await?;

        if trip.status.is_active() {
            return Err(AppError::InvalidTransition(
                "Cannot delete a trip that is pending or in progress".to_string(),
            ));
        }

        let mut changes = ChangeSet::new();
        changes.delete_trip(trip.id);
        self.repository.commit(changes).await?;
        info!("🗑️ Viaje {} eliminado", trip.id);
        Ok(())
    }

    fn authorize(&self, actor: &Actor, trip: &Trip, operation: &str) -> AppResult<()> {
        if actor.is_admin() || trip.driver_id == actor.user_id {
            Ok(())
        } else {
            Err(forbidden_error(operation, "trip is assigned to another driver"))
        }
    }

    /// Remolque para un viaje: disponibilidad completa si la política lo pide,
    /// si no solo existencia y tipo
    async fn resolve_trailer(
        &self,
        trailer_id: Uuid,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
        exclude_trip: Option<Uuid>,
    ) -> AppResult<Vehicle> {
        let trailer = if self.creation_policy.check_trailer_availability {
            self.availability
                .check_excluding(trailer_id, start, end, exclude_trip)
                .await?
        } else {
            self.load_vehicle(trailer_id).await?
        };
        expect_kind(&trailer, VehicleKind::Trailer)?;
        Ok(trailer)
    }

    /// Devuelve a `available` los vehículos del viaje que ningún otro viaje
    /// en curso retiene
    async fn release(&self, trip: &Trip, vehicles: &mut [Vehicle]) -> AppResult<()> {
        for vehicle in vehicles.iter_mut() {
            if vehicle.status != VehicleStatus::InUse {
                continue;
            }
            let held_elsewhere = self
                .repository
                .list_trips(
                    &TripFilter::by_vehicle(vehicle.id).with_statuses(&[TripStatus::InProgress]),
                )
                .await?
                .iter()
                .any(|other| other.id != trip.id);
            if held_elsewhere {
                debug!("🔒 Vehículo {} sigue en ruta con otro viaje", vehicle.plate);
                continue;
            }
            VehicleRegistry::transition(vehicle, VehicleStatus::Available)?;
        }
        Ok(())
    }

    async fn ensure_driver_free(&self, driver_id: Uuid, exclude: Option<Uuid>) -> AppResult<()> {
        let active = self
            .repository
            .list_trips(&TripFilter::by_driver(driver_id).with_statuses(&[TripStatus::InProgress]))
            .await?;
        if active.iter().any(|t| Some(t.id) != exclude) {
            return Err(AppError::DriverAlreadyActive(driver_id));
        }
        Ok(())
    }

    async fn load_trip(&self, id: Uuid) -> AppResult<Trip> {
        self.repository
            .find_trip(id)
            .await?
            .ok_or_else(|| not_found_error("Trip", id))
    }

    /// Relee el viaje bajo los bloqueos; si cambió de conductor o vehículos
    /// entretanto, los bloqueos ya no lo cubren
    async fn reload_locked(&self, snapshot: &Trip) -> AppResult<Trip> {
        let trip = self.load_trip(snapshot.id).await?;
        if trip_keys(&trip) != trip_keys(snapshot) {
            return Err(AppError::Conflict(format!(
                "trip {} was reassigned concurrently, retry the operation",
                trip.id
            )));
        }
        Ok(trip)
    }

    async fn load_vehicle(&self, id: Uuid) -> AppResult<Vehicle> {
        self.repository
            .find_vehicle(id)
            .await?
            .ok_or(AppError::VehicleNotFound(id))
    }

    async fn load_vehicles(&self, trip: &Trip) -> AppResult<Vec<Vehicle>> {
        let mut vehicles = Vec::new();
        for id in trip.vehicle_ids() {
            vehicles.push(self.load_vehicle(id).await?);
        }
        Ok(vehicles)
    }
}
