//! Services module
//!
//! Este módulo contiene el núcleo de reglas de la flota: registro de
//! vehículos, planificación de mantenimiento, disponibilidad y el libro de
//! viajes con su máquina de estados.

pub mod availability_checker;
pub mod events;
pub mod keyed_locks;
pub mod maintenance_scheduler;
pub mod maintenance_service;
pub mod trip_ledger;
pub mod vehicle_registry;

use std::sync::Arc;

pub use availability_checker::AvailabilityChecker;
pub use events::{EventPublisher, FleetEvent};
pub use keyed_locks::{KeyedLocks, LockKey};
pub use maintenance_scheduler::{MaintenanceScheduler, OdometerUpdate};
pub use maintenance_service::MaintenanceService;
pub use trip_ledger::TripLedger;
pub use vehicle_registry::VehicleRegistry;

use crate::config::FleetPolicies;
use crate::models::Actor;
use crate::repositories::FleetRepository;
use crate::utils::errors::{forbidden_error, AppResult};

/// Operaciones reservadas a administradores
pub(crate) fn ensure_admin(actor: &Actor, operation: &str) -> AppResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(forbidden_error(operation, "admin role required"))
    }
}

/// Servicios del núcleo construidos sobre un mismo repositorio y una misma
/// tabla de bloqueos
#[derive(Clone)]
pub struct FleetServices {
    pub vehicles: Arc<VehicleRegistry>,
    pub scheduler: Arc<MaintenanceScheduler>,
    pub maintenance: Arc<MaintenanceService>,
    pub availability: Arc<AvailabilityChecker>,
    pub trips: Arc<TripLedger>,
    pub events: EventPublisher,
}

impl FleetServices {
    pub fn new(repository: Arc<dyn FleetRepository>, policies: FleetPolicies) -> Self {
        let locks = KeyedLocks::new();
        let events = EventPublisher::default();

        let vehicles = Arc::new(VehicleRegistry::new(repository.clone(), locks.clone()));
        let scheduler = Arc::new(MaintenanceScheduler::new(
            repository.clone(),
            locks.clone(),
            events.clone(),
            policies.auto_scheduling,
            policies.alert_reporting,
        ));
        let maintenance = Arc::new(MaintenanceService::new(
            repository.clone(),
            locks.clone(),
            events.clone(),
        ));
        let availability = Arc::new(AvailabilityChecker::new(repository.clone()));
        let trips = Arc::new(TripLedger::new(
            repository,
            locks,
            availability.clone(),
            scheduler.clone(),
            events.clone(),
            policies.fuel_plausibility,
            policies.trip_creation,
        ));

        Self {
            vehicles,
            scheduler,
            maintenance,
            availability,
            trips,
            events,
        }
    }
}
