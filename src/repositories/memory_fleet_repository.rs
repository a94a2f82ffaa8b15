//! Repositorio en memoria
//!
//! Implementación de `FleetRepository` sobre mapas protegidos por un único
//! `RwLock`. Se usa en tests y con `STORAGE_BACKEND=memory`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{ChangeSet, FleetRepository, MaintenanceFilter, Staged, TripFilter};
use crate::models::{MaintenanceObligation, Trip, Vehicle, VehicleKind};
use crate::utils::errors::{AppError, AppResult};

#[derive(Debug, Default)]
struct Tables {
    vehicles: HashMap<Uuid, Vehicle>,
    trips: HashMap<Uuid, Trip>,
    maintenance: HashMap<Uuid, MaintenanceObligation>,
}

#[derive(Clone, Default)]
pub struct InMemoryFleetRepository {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryFleetRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Comprueba una escritura contra la versión almacenada
fn check_staged<T>(
    staged: &Staged<T>,
    id: Uuid,
    version: i64,
    stored: Option<i64>,
    resource: &str,
) -> AppResult<()> {
    match (staged, stored) {
        (Staged::Insert(_), Some(_)) => Err(AppError::Conflict(format!(
            "{} '{}' already exists",
            resource, id
        ))),
        (Staged::Update(_), None) => Err(AppError::NotFound(format!(
            "{} with id '{}' not found",
            resource, id
        ))),
        (Staged::Update(_), Some(current)) if current != version - 1 => {
            Err(AppError::Conflict(format!(
                "{} '{}' was modified concurrently (stored version {}, expected {})",
                resource,
                id,
                current,
                version - 1
            )))
        }
        _ => Ok(()),
    }
}

impl Tables {
    fn validate(&self, changes: &ChangeSet) -> AppResult<()> {
        for staged in &changes.vehicles {
            let v = staged.record();
            check_staged(
                staged,
                v.id,
                v.version,
                self.vehicles.get(&v.id).map(|s| s.version),
                "Vehicle",
            )?;
            let plate_taken = self
                .vehicles
                .values()
                .any(|other| other.id != v.id && other.plate == v.plate);
            if plate_taken {
                return Err(AppError::Conflict(format!(
                    "Vehicle with plate '{}' already exists",
                    v.plate
                )));
            }
        }
        for staged in &changes.trips {
            let t = staged.record();
            check_staged(
                staged,
                t.id,
                t.version,
                self.trips.get(&t.id).map(|s| s.version),
                "Trip",
            )?;
        }
        for staged in &changes.maintenance {
            let m = staged.record();
            check_staged(
                staged,
                m.id,
                m.version,
                self.maintenance.get(&m.id).map(|s| s.version),
                "Maintenance",
            )?;
        }
        for id in &changes.deleted_vehicles {
            let assigned = self.trips.values().any(|t| {
                t.uses_vehicle(*id) && t.status.is_active() && !changes.deleted_trips.contains(&t.id)
            });
            if assigned {
                return Err(AppError::Conflict(format!(
                    "Vehicle {} is still assigned to active trips",
                    id
                )));
            }
        }
        Ok(())
    }

    fn apply(&mut self, changes: ChangeSet) {
        for staged in changes.vehicles {
            let (Staged::Insert(v) | Staged::Update(v)) = staged;
            self.vehicles.insert(v.id, v);
        }
        for staged in changes.trips {
            let (Staged::Insert(t) | Staged::Update(t)) = staged;
            self.trips.insert(t.id, t);
        }
        for staged in changes.maintenance {
            let (Staged::Insert(m) | Staged::Update(m)) = staged;
            self.maintenance.insert(m.id, m);
        }
        for id in changes.deleted_trips {
            self.trips.remove(&id);
        }
        for id in changes.deleted_vehicles {
            self.vehicles.remove(&id);
            self.maintenance.retain(|_, m| m.target_id != id);
        }
    }
}

#[async_trait]
impl FleetRepository for InMemoryFleetRepository {
    async fn find_vehicle(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        Ok(self.tables.read().await.vehicles.get(&id).cloned())
    }

    async fn find_vehicle_by_plate(&self, plate: &str) -> AppResult<Option<Vehicle>> {
        let tables = self.tables.read().await;
        Ok(tables.vehicles.values().find(|v| v.plate == plate).cloned())
    }

    async fn list_vehicles(&self, kind: Option<VehicleKind>) -> AppResult<Vec<Vehicle>> {
        let tables = self.tables.read().await;
        let mut vehicles: Vec<Vehicle> = tables
            .vehicles
            .values()
            .filter(|v| kind.map_or(true, |k| v.kind == k))
            .cloned()
            .collect();
        vehicles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(vehicles)
    }

    async fn find_trip(&self, id: Uuid) -> AppResult<Option<Trip>> {
        Ok(self.tables.read().await.trips.get(&id).cloned())
    }

    async fn list_trips(&self, filter: &TripFilter) -> AppResult<Vec<Trip>> {
        let tables = self.tables.read().await;
        let mut trips: Vec<Trip> = tables
            .trips
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        trips.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(trips)
    }

    async fn find_maintenance(&self, id: Uuid) -> AppResult<Option<MaintenanceObligation>> {
        Ok(self.tables.read().await.maintenance.get(&id).cloned())
    }

    async fn list_maintenance(
        &self,
        filter: &MaintenanceFilter,
    ) -> AppResult<Vec<MaintenanceObligation>> {
        let tables = self.tables.read().await;
        let mut obligations: Vec<MaintenanceObligation> = tables
            .maintenance
            .values()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        obligations.sort_by(|a, b| b.scheduled_date.cmp(&a.scheduled_date));
        Ok(obligations)
    }

    async fn commit(&self, changes: ChangeSet) -> AppResult<()> {
        if changes.is_empty() {
            return Ok(());
        }
        let mut tables = self.tables.write().await;
        tables.validate(&changes)?;
        debug!(
            "💾 Commit en memoria: {} vehículos, {} viajes, {} mantenimientos",
            changes.vehicles.len(),
            changes.trips.len(),
            changes.maintenance.len()
        );
        tables.apply(changes);
        Ok(())
    }
}
