//! Registro de vehículos
//!
//! Dueño exclusivo de los registros `Vehicle`. Los demás componentes piden
//! cambios de estado, odómetro y marcas de mantenimiento a través de las
//! funciones de este módulo; nunca mutan los campos directamente.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use super::ensure_admin;
use super::keyed_locks::{KeyedLocks, LockKey};
use crate::models::{
    Actor, MaintenanceType, MaintenanceWatermarks, NewVehicle, TripStatus, Vehicle,
    VehicleDetailsUpdate, VehicleKind, VehicleStatus,
};
use crate::repositories::{ChangeSet, FleetRepository, TripFilter};
use crate::utils::errors::{conflict_error, AppError, AppResult};

pub struct VehicleRegistry {
    repository: Arc<dyn FleetRepository>,
    locks: KeyedLocks,
}

impl VehicleRegistry {
    pub fn new(repository: Arc<dyn FleetRepository>, locks: KeyedLocks) -> Self {
        Self { repository, locks }
    }

    pub async fn get_vehicle(&self, id: Uuid) -> AppResult<Vehicle> {
        self.repository
            .find_vehicle(id)
            .await?
            .ok_or(AppError::VehicleNotFound(id))
    }

    pub async fn list_vehicles(&self, kind: Option<VehicleKind>) -> AppResult<Vec<Vehicle>> {
        self.repository.list_vehicles(kind).await
    }

    /// Registrar un camión o remolque nuevo, siempre `available`
    pub async fn register_vehicle(&self, actor: &Actor, new: NewVehicle) -> AppResult<Vehicle> {
        ensure_admin(actor, "register vehicle")?;

        let plate = new.plate.trim().to_uppercase();
        if plate.is_empty() {
            return Err(AppError::BadRequest("Plate must not be empty".to_string()));
        }
        let current_odometer = new.current_odometer.unwrap_or(new.initial_odometer);
        if new.initial_odometer < 0 {
            return Err(AppError::InvalidOdometer(
                "initial odometer must be non-negative".to_string(),
            ));
        }
        if current_odometer < new.initial_odometer {
            return Err(AppError::InvalidOdometer(format!(
                "current odometer {} is below initial odometer {}",
                current_odometer, new.initial_odometer
            )));
        }
        if self.repository.find_vehicle_by_plate(&plate).await?.is_some() {
            return Err(conflict_error("Vehicle", "plate", &plate));
        }

        let now = Utc::now();
        let watermarks = (new.kind == VehicleKind::Truck).then(|| MaintenanceWatermarks {
            last_oil_change_odometer: current_odometer,
            last_oil_change_date: new.last_oil_change_date.unwrap_or(now),
            last_inspection_date: new.last_inspection_date.unwrap_or(now),
        });
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            kind: new.kind,
            plate,
            brand: new.brand.trim().to_string(),
            model: new.model.trim().to_string(),
            status: VehicleStatus::Available,
            current_odometer,
            initial_odometer: new.initial_odometer,
            acquired_at: new.acquired_at,
            watermarks,
            version: 1,
            created_at: now,
            updated_at: now,
        };

        let mut changes = ChangeSet::new();
        changes.insert_vehicle(vehicle.clone());
        self.repository.commit(changes).await?;

        info!(
            "🚛 Vehículo registrado: {} ({}) {}",
            vehicle.plate,
            vehicle.kind.as_str(),
            vehicle.id
        );
        Ok(vehicle)
    }

    /// Cambio de estado con las reglas de transición del registro
    pub async fn set_status(&self, id: Uuid, status: VehicleStatus) -> AppResult<Vehicle> {
        let _guard = self.locks.acquire([LockKey::Vehicle(id)]).await;
        let mut vehicle = self.get_vehicle(id).await?;
        if vehicle.status == status {
            return Ok(vehicle);
        }

        let previous = vehicle.status;
        if let Err(e) = Self::transition(&mut vehicle, status) {
            warn!("⚠️ Cambio de estado rechazado para {}: {}", vehicle.plate, e);
            return Err(e);
        }
        self.save(&mut vehicle).await?;

        info!(
            "🔄 Vehículo {}: {} -> {}",
            vehicle.plate,
            previous.as_str(),
            status.as_str()
        );
        Ok(vehicle)
    }

    /// Avance de odómetro sin evaluación de mantenimiento. El camino con
    /// programación automática es `MaintenanceScheduler::record_odometer`.
    #[cfg(test)]
    pub(crate) async fn advance_odometer(&self, id: Uuid, odometer: i64) -> AppResult<Vehicle> {
        let _guard = self.locks.acquire([LockKey::Vehicle(id)]).await;
        let mut vehicle = self.get_vehicle(id).await?;
        Self::apply_odometer(&mut vehicle, odometer)?;
        self.save(&mut vehicle).await?;
        Ok(vehicle)
    }

    /// Cierre de un servicio aplicado solo sobre el vehículo
    pub async fn record_maintenance_completion(
        &self,
        id: Uuid,
        maintenance_type: MaintenanceType,
        completed_at: DateTime<Utc>,
        odometer: Option<i64>,
    ) -> AppResult<Vehicle> {
        let _guard = self.locks.acquire([LockKey::Vehicle(id)]).await;
        let mut vehicle = self.get_vehicle(id).await?;
        Self::apply_maintenance_completion(
            &mut vehicle,
            maintenance_type,
            completed_at,
            odometer,
            false,
        )?;
        self.save(&mut vehicle).await?;
        Ok(vehicle)
    }

    pub async fn update_vehicle_details(
        &self,
        actor: &Actor,
        id: Uuid,
        update: VehicleDetailsUpdate,
    ) -> AppResult<Vehicle> {
        ensure_admin(actor, "update vehicle")?;
        let _guard = self.locks.acquire([LockKey::Vehicle(id)]).await;
        let mut vehicle = self.get_vehicle(id).await?;

        if let Some(brand) = update.brand {
            vehicle.brand = brand.trim().to_string();
        }
        if let Some(model) = update.model {
            vehicle.model = model.trim().to_string();
        }
        self.save(&mut vehicle).await?;
        Ok(vehicle)
    }

    /// Eliminar un vehículo que no esté en uso ni asignado a viajes activos.
    /// Los viajes terminados conservan la referencia como historial.
    pub async fn delete_vehicle(&self, actor: &Actor, id: Uuid) -> AppResult<()> {
        ensure_admin(actor, "delete vehicle")?;
        let _guard = self.locks.acquire([LockKey::Vehicle(id)]).await;
        let vehicle = self.get_vehicle(id).await?;

        if vehicle.status == VehicleStatus::InUse {
            return Err(AppError::InvalidTransition(format!(
                "vehicle {} is in use and cannot be deleted",
                vehicle.plate
            )));
        }
        let active = self
            .repository
            .list_trips(
                &TripFilter::by_vehicle(id)
                    .with_statuses(&[TripStatus::Pending, TripStatus::InProgress]),
            )
            .await?;
        if !active.is_empty() {
            return Err(AppError::InvalidTransition(format!(
                "vehicle {} is assigned to {} active trip(s)",
                vehicle.plate,
                active.len()
            )));
        }

        let mut changes = ChangeSet::new();
        changes.delete_vehicle(id);
        self.repository.commit(changes).await?;
        info!("🗑️ Vehículo eliminado: {} {}", vehicle.plate, id);
        Ok(())
    }

    async fn save(&self, vehicle: &mut Vehicle) -> AppResult<()> {
        vehicle.touch(Utc::now());
        let mut changes = ChangeSet::new();
        changes.update_vehicle(vehicle.clone());
        self.repository.commit(changes).await
    }

    /// Regla de transición: un vehículo en mantenimiento no sale a ruta y
    /// uno en ruta no entra a mantenimiento hasta terminar el viaje
    pub fn transition(vehicle: &mut Vehicle, next: VehicleStatus) -> AppResult<()> {
        match (vehicle.status, next) {
            (VehicleStatus::Maintenance, VehicleStatus::InUse) => {
                Err(AppError::InvalidTransition(format!(
                    "vehicle {} is under maintenance and cannot be dispatched",
                    vehicle.plate
                )))
            }
            (VehicleStatus::InUse, VehicleStatus::Maintenance) => {
                Err(AppError::InvalidTransition(format!(
                    "vehicle {} is in use and cannot go to maintenance before the trip ends",
                    vehicle.plate
                )))
            }
            _ => {
                vehicle.status = next;
                Ok(())
            }
        }
    }

    /// El odómetro nunca retrocede
    pub fn apply_odometer(vehicle: &mut Vehicle, odometer: i64) -> AppResult<()> {
        if odometer < vehicle.current_odometer {
            return Err(AppError::InvalidOdometer(format!(
                "new odometer {} is below current odometer {} of vehicle {}",
                odometer, vehicle.current_odometer, vehicle.plate
            )));
        }
        vehicle.current_odometer = odometer;
        Ok(())
    }

    /// Reinicia las marcas del tipo de servicio y libera el vehículo salvo
    /// que otra obligación lo siga reteniendo (`keep_blocked`).
    /// Un vehículo en ruta conserva `in_use`.
    pub fn apply_maintenance_completion(
        vehicle: &mut Vehicle,
        maintenance_type: MaintenanceType,
        completed_at: DateTime<Utc>,
        odometer: Option<i64>,
        keep_blocked: bool,
    ) -> AppResult<()> {
        let service_odometer = odometer.unwrap_or(vehicle.current_odometer);
        if service_odometer < vehicle.initial_odometer {
            return Err(AppError::InvalidOdometer(format!(
                "service odometer {} is below initial odometer {}",
                service_odometer, vehicle.initial_odometer
            )));
        }
        if service_odometer > vehicle.current_odometer {
            Self::apply_odometer(vehicle, service_odometer)?;
        }

        if let Some(watermarks) = vehicle.watermarks.as_mut() {
            match maintenance_type {
                MaintenanceType::OilChange => {
                    watermarks.last_oil_change_odometer = service_odometer;
                    watermarks.last_oil_change_date = completed_at;
                }
                MaintenanceType::Inspection => {
                    watermarks.last_inspection_date = completed_at;
                }
                MaintenanceType::TireReplacement | MaintenanceType::Other => {}
            }
        }

        if vehicle.status == VehicleStatus::Maintenance && !keep_blocked {
            vehicle.status = VehicleStatus::Available;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryFleetRepository;
    use chrono::{Duration, NaiveDate};

    fn registry() -> VehicleRegistry {
        VehicleRegistry::new(Arc::new(InMemoryFleetRepository::new()), KeyedLocks::new())
    }

    fn truck(plate: &str, odometer: i64) -> NewVehicle {
        NewVehicle {
            kind: VehicleKind::Truck,
            plate: plate.to_string(),
            brand: "Volvo".to_string(),
            model: "FH16".to_string(),
            initial_odometer: odometer,
            current_odometer: None,
            acquired_at: NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(),
            last_oil_change_date: None,
            last_inspection_date: None,
        }
    }

    #[tokio::test]
    async fn test_register_truck_sets_watermarks() {
        let registry = registry();
        let admin = Actor::admin(Uuid::new_v4());
        let vehicle = registry.register_vehicle(&admin, truck("ab-123-cd", 2_000)).await.unwrap();

        assert_eq!(vehicle.plate, "AB-123-CD");
        assert_eq!(vehicle.status, VehicleStatus::Available);
        assert_eq!(vehicle.watermarks.unwrap().last_oil_change_odometer, 2_000);
    }

    #[tokio::test]
    async fn test_register_requires_admin_and_unique_plate() {
        let registry = registry();
        let driver = Actor::driver(Uuid::new_v4());
        let admin = Actor::admin(Uuid::new_v4());

        assert!(matches!(
            registry.register_vehicle(&driver, truck("X-1", 0)).await,
            Err(AppError::Forbidden(_))
        ));
        registry.register_vehicle(&admin, truck("X-1", 0)).await.unwrap();
        assert!(matches!(
            registry.register_vehicle(&admin, truck("x-1", 0)).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_odometer_is_monotonic() {
        let registry = registry();
        let admin = Actor::admin(Uuid::new_v4());
        let vehicle = registry.register_vehicle(&admin, truck("M-1", 0)).await.unwrap();

        registry.advance_odometer(vehicle.id, 500).await.unwrap();
        let err = registry.advance_odometer(vehicle.id, 400).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidOdometer(_)));
        assert_eq!(registry.get_vehicle(vehicle.id).await.unwrap().current_odometer, 500);
    }

    #[tokio::test]
    async fn test_maintenance_vehicle_cannot_be_dispatched() {
        let registry = registry();
        let admin = Actor::admin(Uuid::new_v4());
        let vehicle = registry.register_vehicle(&admin, truck("G-1", 0)).await.unwrap();

        registry.set_status(vehicle.id, VehicleStatus::Maintenance).await.unwrap();
        let err = registry.set_status(vehicle.id, VehicleStatus::InUse).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
        assert_eq!(
            registry.get_vehicle(vehicle.id).await.unwrap().status,
            VehicleStatus::Maintenance
        );
    }

    #[tokio::test]
    async fn test_in_use_vehicle_cannot_go_to_maintenance() {
        let registry = registry();
        let admin = Actor::admin(Uuid::new_v4());
        let vehicle = registry.register_vehicle(&admin, truck("G-2", 0)).await.unwrap();

        registry.set_status(vehicle.id, VehicleStatus::InUse).await.unwrap();
        assert!(matches!(
            registry.set_status(vehicle.id, VehicleStatus::Maintenance).await,
            Err(AppError::InvalidTransition(_))
        ));
        assert!(matches!(
            registry.delete_vehicle(&admin, vehicle.id).await,
            Err(AppError::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn test_oil_change_completion_resets_watermark() {
        let registry = registry();
        let admin = Actor::admin(Uuid::new_v4());
        let vehicle = registry.register_vehicle(&admin, truck("W-1", 0)).await.unwrap();
        registry.advance_odometer(vehicle.id, 12_000).await.unwrap();
        registry.set_status(vehicle.id, VehicleStatus::Maintenance).await.unwrap();

        let done_at = Utc::now() - Duration::days(1);
        let vehicle = registry
            .record_maintenance_completion(vehicle.id, MaintenanceType::OilChange, done_at, None)
            .await
            .unwrap();
        let watermarks = vehicle.watermarks.unwrap();
        assert_eq!(watermarks.last_oil_change_odometer, 12_000);
        assert_eq!(watermarks.last_oil_change_date, done_at);
        assert_eq!(vehicle.status, VehicleStatus::Available);
    }

    #[tokio::test]
    async fn test_missing_vehicle() {
        let registry = registry();
        let id = Uuid::new_v4();
        assert!(matches!(
            registry.get_vehicle(id).await,
            Err(AppError::VehicleNotFound(missing)) if missing == id
        ));
    }
}
