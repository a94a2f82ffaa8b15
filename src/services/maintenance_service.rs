//! Servicio de obligaciones de mantenimiento
//!
//! Ciclo de vida manual: programar, iniciar, completar y cancelar. El
//! estado del vehículo acompaña cada paso dentro del mismo commit.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use super::ensure_admin;
use super::events::{EventPublisher, FleetEvent};
use super::keyed_locks::{KeyedLocks, LockKey};
use super::vehicle_registry::VehicleRegistry;
use crate::models::{
    Actor, MaintenanceCompletion, MaintenanceObligation, MaintenanceStatus, NewMaintenance,
    Vehicle, VehicleStatus,
};
use crate::repositories::{ChangeSet, FleetRepository, MaintenanceFilter};
use crate::utils::errors::{not_found_error, AppError, AppResult};

pub struct MaintenanceService {
    repository: Arc<dyn FleetRepository>,
    locks: KeyedLocks,
    events: EventPublisher,
}

impl MaintenanceService {
    pub fn new(repository: Arc<dyn FleetRepository>, locks: KeyedLocks, events: EventPublisher) -> Self {
        Self {
            repository,
            locks,
            events,
        }
    }

    pub async fn get_maintenance(&self, id: Uuid) -> AppResult<MaintenanceObligation> {
        self.repository
            .find_maintenance(id)
            .await?
            .ok_or_else(|| not_found_error("Maintenance", id))
    }

    pub async fn list_maintenance(
        &self,
        filter: &MaintenanceFilter,
    ) -> AppResult<Vec<MaintenanceObligation>> {
        self.repository.list_maintenance(filter).await
    }

    /// Obligaciones programadas que vencen dentro de los próximos `days` días
    pub async fn upcoming_maintenance(&self, days: i64) -> AppResult<Vec<MaintenanceObligation>> {
        let now = Utc::now();
        let horizon = now + Duration::days(days.max(0));
        let filter = MaintenanceFilter {
            statuses: vec![MaintenanceStatus::Scheduled],
            ..MaintenanceFilter::default()
        };
        let mut upcoming: Vec<MaintenanceObligation> = self
            .repository
            .list_maintenance(&filter)
            .await?
            .into_iter()
            .filter(|m| m.scheduled_date >= now && m.scheduled_date <= horizon)
            .collect();
        upcoming.sort_by_key(|m| m.scheduled_date);
        Ok(upcoming)
    }

    /// Programación manual. Con fecha vencida el vehículo pasa a `maintenance`.
    pub async fn schedule_maintenance(
        &self,
        actor: &Actor,
        request: NewMaintenance,
    ) -> AppResult<MaintenanceObligation> {
        ensure_admin(actor, "schedule maintenance")?;
        let _guard = self.locks.acquire([LockKey::Vehicle(request.target_id)]).await;
        let mut vehicle = self.load_vehicle(request.target_id).await?;

        let now = Utc::now();
        let mut obligation = MaintenanceObligation::scheduled(
            &vehicle,
            request.maintenance_type,
            request.scheduled_date,
            now,
        );
        obligation.cost = request.cost;
        obligation.notes = request.notes;

        let mut changes = ChangeSet::new();
        if request.scheduled_date <= now && vehicle.status != VehicleStatus::Maintenance {
            VehicleRegistry::transition(&mut vehicle, VehicleStatus::Maintenance)?;
            vehicle.touch(now);
            changes.update_vehicle(vehicle.clone());
        }
        changes.insert_maintenance(obligation.clone());
        self.repository.commit(changes).await?;

        info!(
            "📅 Mantenimiento {} programado para {} el {}",
            obligation.maintenance_type.as_str(),
            vehicle.plate,
            obligation.scheduled_date
        );
        self.events.publish(FleetEvent::MaintenanceScheduled {
            obligation_id: obligation.id,
            vehicle_id: vehicle.id,
            maintenance_type: obligation.maintenance_type,
            automatic: false,
        });
        Ok(obligation)
    }

    /// `scheduled -> in_progress`; el vehículo entra a `maintenance`
    pub async fn start_maintenance(&self, actor: &Actor, id: Uuid) -> AppResult<MaintenanceObligation> {
        ensure_admin(actor, "start maintenance")?;
        let target_id = self.get_maintenance(id).await?.target_id;
        let _guard = self.locks.acquire([LockKey::Vehicle(target_id)]).await;
        let mut obligation = self.get_maintenance(id).await?;

        if obligation.status != MaintenanceStatus::Scheduled {
            return Err(AppError::InvalidTransition(format!(
                "maintenance {} is {} and cannot be started",
                id,
                obligation.status.as_str()
            )));
        }

        let now = Utc::now();
        let mut vehicle = self.load_vehicle(obligation.target_id).await?;
        let mut changes = ChangeSet::new();
        if vehicle.status != VehicleStatus::Maintenance {
            VehicleRegistry::transition(&mut vehicle, VehicleStatus::Maintenance)?;
            vehicle.touch(now);
            changes.update_vehicle(vehicle);
        }
        obligation.status = MaintenanceStatus::InProgress;
        obligation.touch(now);
        changes.update_maintenance(obligation.clone());
        self.repository.commit(changes).await?;

        info!("🔧 Mantenimiento {} iniciado", id);
        Ok(obligation)
    }

    /// Cierra la obligación y reinicia las marcas del vehículo en un único commit
    pub async fn complete_maintenance(
        &self,
        actor: &Actor,
        id: Uuid,
        completion: MaintenanceCompletion,
    ) -> AppResult<MaintenanceObligation> {
        ensure_admin(actor, "complete maintenance")?;
        let target_id = self.get_maintenance(id).await?.target_id;
        let _guard = self.locks.acquire([LockKey::Vehicle(target_id)]).await;
        let mut obligation = self.get_maintenance(id).await?;

        if !obligation.status.is_open() {
            return Err(AppError::InvalidTransition(format!(
                "maintenance {} is already {}",
                id,
                obligation.status.as_str()
            )));
        }

        let now = Utc::now();
        let completed_at = completion.completed_date.unwrap_or(now);
        let keep_blocked = self.held_by_other_obligation(target_id, id, now).await?;
        let mut vehicle = self.load_vehicle(obligation.target_id).await?;
        VehicleRegistry::apply_maintenance_completion(
            &mut vehicle,
            obligation.maintenance_type,
            completed_at,
            completion.odometer,
            keep_blocked,
        )?;
        vehicle.touch(now);

        obligation.status = MaintenanceStatus::Completed;
        obligation.completed_date = Some(completed_at);
        if completion.cost.is_some() {
            obligation.cost = completion.cost;
        }
        if completion.notes.is_some() {
            obligation.notes = completion.notes;
        }
        obligation.touch(now);

        let mut changes = ChangeSet::new();
        changes
            .update_vehicle(vehicle.clone())
            .update_maintenance(obligation.clone());
        self.repository.commit(changes).await?;

        info!(
            "✅ Mantenimiento {} completado para {} ({})",
            obligation.maintenance_type.as_str(),
            vehicle.plate,
            vehicle.status.as_str()
        );
        self.events.publish(FleetEvent::MaintenanceCompleted {
            obligation_id: obligation.id,
            vehicle_id: vehicle.id,
            maintenance_type: obligation.maintenance_type,
        });
        Ok(obligation)
    }

    /// Cancela; el vehículo vuelve a `available` si ninguna otra obligación lo retiene
    pub async fn cancel_maintenance(&self, actor: &Actor, id: Uuid) -> AppResult<MaintenanceObligation> {
        ensure_admin(actor, "cancel maintenance")?;
        let target_id = self.get_maintenance(id).await?.target_id;
        let _guard = self.locks.acquire([LockKey::Vehicle(target_id)]).await;
        let mut obligation = self.get_maintenance(id).await?;

        if !obligation.status.is_open() {
            return Err(AppError::InvalidTransition(format!(
                "maintenance {} is already {}",
                id,
                obligation.status.as_str()
            )));
        }

        let now = Utc::now();
        obligation.status = MaintenanceStatus::Cancelled;
        obligation.touch(now);
        let mut changes = ChangeSet::new();
        changes.update_maintenance(obligation.clone());

        let others_open = self.held_by_other_obligation(target_id, id, now).await?;
        let mut vehicle = self.load_vehicle(target_id).await?;
        if !others_open && vehicle.status == VehicleStatus::Maintenance {
            VehicleRegistry::transition(&mut vehicle, VehicleStatus::Available)?;
            vehicle.touch(now);
            changes.update_vehicle(vehicle);
        }
        self.repository.commit(changes).await?;

        warn!("🚫 Mantenimiento {} cancelado", id);
        Ok(obligation)
    }

    /// Otra obligación retiene el vehículo si está en curso o ya vencida
    async fn held_by_other_obligation(
        &self,
        target_id: Uuid,
        except: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let open = self
            .repository
            .list_maintenance(&MaintenanceFilter {
                target_id: Some(target_id),
                statuses: vec![MaintenanceStatus::Scheduled, MaintenanceStatus::InProgress],
            })
            .await?;
        Ok(open.iter().filter(|m| m.id != except).any(|m| {
            m.status == MaintenanceStatus::InProgress || m.scheduled_date <= now
        }))
    }

    async fn load_vehicle(&self, id: Uuid) -> AppResult<Vehicle> {
        self.repository
            .find_vehicle(id)
            .await?
            .ok_or(AppError::VehicleNotFound(id))
    }
}
