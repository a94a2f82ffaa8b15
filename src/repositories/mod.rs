//! Repositorios
//!
//! Puerto de persistencia del núcleo de flota. Las lecturas son directas;
//! todas las escrituras de una operación viajan juntas en un `ChangeSet`
//! que el adaptador aplica de forma atómica, con control de versión
//! optimista sobre cada registro actualizado.

pub mod memory_fleet_repository;
pub mod pg_fleet_repository;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    MaintenanceObligation, MaintenanceStatus, Trip, TripStatus, Vehicle, VehicleKind,
};
use crate::utils::errors::AppResult;

pub use memory_fleet_repository::InMemoryFleetRepository;
pub use pg_fleet_repository::PgFleetRepository;

/// Escritura pendiente sobre un registro
#[derive(Debug, Clone)]
pub enum Staged<T> {
    /// Registro nuevo; falla si el id ya existe
    Insert(T),
    /// Registro existente; `version` ya fue incrementada por el servicio
    /// y el adaptador exige que la almacenada sea `version - 1`
    Update(T),
}

impl<T> Staged<T> {
    pub fn record(&self) -> &T {
        match self {
            Staged::Insert(r) | Staged::Update(r) => r,
        }
    }
}

/// Unidad de trabajo: todo o nada
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub vehicles: Vec<Staged<Vehicle>>,
    pub trips: Vec<Staged<Trip>>,
    pub maintenance: Vec<Staged<MaintenanceObligation>>,
    pub deleted_vehicles: Vec<Uuid>,
    pub deleted_trips: Vec<Uuid>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_vehicle(&mut self, vehicle: Vehicle) -> &mut Self {
        self.vehicles.push(Staged::Insert(vehicle));
        self
    }

    pub fn update_vehicle(&mut self, vehicle: Vehicle) -> &mut Self {
        self.vehicles.push(Staged::Update(vehicle));
        self
    }

    pub fn insert_trip(&mut self, trip: Trip) -> &mut Self {
        self.trips.push(Staged::Insert(trip));
        self
    }

    pub fn update_trip(&mut self, trip: Trip) -> &mut Self {
        self.trips.push(Staged::Update(trip));
        self
    }

    pub fn insert_maintenance(&mut self, obligation: MaintenanceObligation) -> &mut Self {
        self.maintenance.push(Staged::Insert(obligation));
        self
    }

    pub fn update_maintenance(&mut self, obligation: MaintenanceObligation) -> &mut Self {
        self.maintenance.push(Staged::Update(obligation));
        self
    }

    pub fn delete_vehicle(&mut self, id: Uuid) -> &mut Self {
        self.deleted_vehicles.push(id);
        self
    }

    pub fn delete_trip(&mut self, id: Uuid) -> &mut Self {
        self.deleted_trips.push(id);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
            && self.trips.is_empty()
            && self.maintenance.is_empty()
            && self.deleted_vehicles.is_empty()
            && self.deleted_trips.is_empty()
    }
}

/// Filtros para listar viajes
#[derive(Debug, Clone, Default)]
pub struct TripFilter {
    pub driver_id: Option<Uuid>,
    /// Coincide con el camión o con el remolque
    pub vehicle_id: Option<Uuid>,
    /// Vacío = cualquier estado
    pub statuses: Vec<TripStatus>,
}

impl TripFilter {
    pub fn by_driver(driver_id: Uuid) -> Self {
        Self { driver_id: Some(driver_id), ..Self::default() }
    }

    pub fn by_vehicle(vehicle_id: Uuid) -> Self {
        Self { vehicle_id: Some(vehicle_id), ..Self::default() }
    }

    pub fn with_statuses(mut self, statuses: &[TripStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    pub fn matches(&self, trip: &Trip) -> bool {
        self.driver_id.map_or(true, |d| trip.driver_id == d)
            && self.vehicle_id.map_or(true, |v| trip.uses_vehicle(v))
            && (self.statuses.is_empty() || self.statuses.contains(&trip.status))
    }
}

/// Filtros para listar obligaciones de mantenimiento
#[derive(Debug, Clone, Default)]
pub struct MaintenanceFilter {
    pub target_id: Option<Uuid>,
    pub statuses: Vec<MaintenanceStatus>,
}

impl MaintenanceFilter {
    pub fn matches(&self, obligation: &MaintenanceObligation) -> bool {
        self.target_id.map_or(true, |t| obligation.target_id == t)
            && (self.statuses.is_empty() || self.statuses.contains(&obligation.status))
    }
}

/// Puerto de persistencia de la flota
#[async_trait]
pub trait FleetRepository: Send + Sync {
    async fn find_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>>;

    async fn find_vehicle_by_plate(&self, plate: &str) -> AppResult<Option<Vehicle>>;

    async fn list_vehicles(&self, kind: Option<VehicleKind>) -> AppResult<Vec<Vehicle>>;

    async fn find_trip(&self, id: Uuid) -> AppResult<Option<Trip>>;

    async fn list_trips(&self, filter: &TripFilter) -> AppResult<Vec<Trip>>;

    async fn find_maintenance(&self, id: Uuid) -> AppResult<Option<MaintenanceObligation>>;

    async fn list_maintenance(
        &self,
        filter: &MaintenanceFilter,
    ) -> AppResult<Vec<MaintenanceObligation>>;

    /// Aplica todas las escrituras o ninguna
    async fn commit(&self, changes: ChangeSet) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn trip(driver_id: Uuid, truck_id: Uuid, trailer_id: Option<Uuid>, status: TripStatus) -> Trip {
        let now = Utc::now();
        Trip {
            id: Uuid::new_v4(),
            truck_id,
            trailer_id,
            driver_id,
            start_location: "Casablanca".to_string(),
            end_location: "Rabat".to_string(),
            start_date: now,
            end_date: Some(now),
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

    #[test]
    fn test_trip_filter_matches_trailer_and_status() {
        let driver = Uuid::new_v4();
        let truck = Uuid::new_v4();
        let trailer = Uuid::new_v4();
        let t = trip(driver, truck, Some(trailer), TripStatus::Pending);

        assert!(TripFilter::by_vehicle(trailer).matches(&t));
        assert!(TripFilter::by_vehicle(truck).matches(&t));
        assert!(!TripFilter::by_vehicle(Uuid::new_v4()).matches(&t));
        assert!(TripFilter::by_driver(driver)
            .with_statuses(&[TripStatus::Pending, TripStatus::InProgress])
            .matches(&t));
        assert!(!TripFilter::by_driver(driver)
            .with_statuses(&[TripStatus::Completed])
            .matches(&t));
    }

    #[test]
    fn test_change_set_builder() {
        let mut changes = ChangeSet::new();
        assert!(changes.is_empty());
        changes.delete_trip(Uuid::new_v4()).delete_vehicle(Uuid::new_v4());
        assert!(!changes.is_empty());
        assert_eq!(changes.deleted_trips.len(), 1);
    }
}
