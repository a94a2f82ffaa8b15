//! Planificador de mantenimiento
//!
//! Dos reglas independientes:
//! - camino automático (`AutoSchedulingPolicy`): cada avance de odómetro
//!   evalúa el intervalo de cambio de aceite y, si vence, crea la obligación
//!   y pasa el camión a `maintenance` en el mismo commit;
//! - reporte de alertas (`AlertReportingPolicy`): solo lectura, con niveles
//!   de urgencia por kilometraje y antigüedad.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::events::{EventPublisher, FleetEvent};
use super::keyed_locks::{KeyedLocks, LockKey};
use super::vehicle_registry::VehicleRegistry;
use crate::config::{AlertReportingPolicy, AutoSchedulingPolicy};
use crate::models::{
    MaintenanceAlert, MaintenanceObligation, MaintenanceType, Urgency, Vehicle, VehicleKind,
    VehicleMaintenanceReport, VehicleStatus,
};
use crate::repositories::{ChangeSet, FleetRepository};
use crate::utils::errors::{AppError, AppResult};

/// Resultado de registrar un odómetro
#[derive(Debug, Clone)]
pub struct OdometerUpdate {
    pub vehicle: Vehicle,
    pub obligation: Option<MaintenanceObligation>,
}

pub struct MaintenanceScheduler {
    repository: Arc<dyn FleetRepository>,
    locks: KeyedLocks,
    events: EventPublisher,
    auto_policy: AutoSchedulingPolicy,
    alert_policy: AlertReportingPolicy,
}

impl MaintenanceScheduler {
    pub fn new(
        repository: Arc<dyn FleetRepository>,
        locks: KeyedLocks,
        events: EventPublisher,
        auto_policy: AutoSchedulingPolicy,
        alert_policy: AlertReportingPolicy,
    ) -> Self {
        Self {
            repository,
            locks,
            events,
            auto_policy,
            alert_policy,
        }
    }

    /// Evalúa el umbral de cambio de aceite sobre un vehículo ya cargado.
    ///
    /// Si vence, pasa el vehículo a `maintenance`, mueve la marca de aceite
    /// al odómetro actual y devuelve la obligación a persistir junto con él.
    /// Un vehículo en ruta no se evalúa: se reevalúa al cerrar el viaje.
    pub fn evaluate(
        &self,
        vehicle: &mut Vehicle,
        now: DateTime<Utc>,
    ) -> AppResult<Option<MaintenanceObligation>> {
        if vehicle.kind != VehicleKind::Truck {
            return Ok(None);
        }
        let Some(delta) = vehicle.km_since_oil_change() else {
            return Ok(None);
        };
        if delta < self.auto_policy.oil_change_interval_km {
            return Ok(None);
        }
        if vehicle.status == VehicleStatus::InUse {
            debug!(
                "⏸️ Cambio de aceite de {} diferido hasta el fin del viaje ({} km)",
                vehicle.plate, delta
            );
            return Ok(None);
        }

        VehicleRegistry::transition(vehicle, VehicleStatus::Maintenance)?;
        let current = vehicle.current_odometer;
        if let Some(watermarks) = vehicle.watermarks.as_mut() {
            watermarks.last_oil_change_odometer = current;
        }

        let mut obligation =
            MaintenanceObligation::scheduled(vehicle, MaintenanceType::OilChange, now, now);
        obligation.notes = Some(format!(
            "Automatic oil change after {} km since last service",
            delta
        ));
        Ok(Some(obligation))
    }

    /// Avanza el odómetro y ejecuta el camino automático, todo o nada
    pub async fn record_odometer(&self, vehicle_id: Uuid, odometer: i64) -> AppResult<OdometerUpdate> {
        let _guard = self.locks.acquire([LockKey::Vehicle(vehicle_id)]).await;
        let mut vehicle = self
            .repository
            .find_vehicle(vehicle_id)
            .await?
            .ok_or(AppError::VehicleNotFound(vehicle_id))?;

        let now = Utc::now();
        VehicleRegistry::apply_odometer(&mut vehicle, odometer)?;
        let obligation = self.evaluate(&mut vehicle, now)?;

        vehicle.touch(now);
        let mut changes = ChangeSet::new();
        changes.update_vehicle(vehicle.clone());
        if let Some(obligation) = &obligation {
            changes.insert_maintenance(obligation.clone());
        }
        self.repository.commit(changes).await?;

        if let Some(obligation) = &obligation {
            self.announce(obligation);
        }
        Ok(OdometerUpdate { vehicle, obligation })
    }

    /// Notifica una obligación automática ya persistida
    pub(crate) fn announce(&self, obligation: &MaintenanceObligation) {
        info!(
            "🔧 Mantenimiento automático programado: {} para vehículo {}",
            obligation.maintenance_type.as_str(),
            obligation.target_id
        );
        self.events.publish(FleetEvent::MaintenanceScheduled {
            obligation_id: obligation.id,
            vehicle_id: obligation.target_id,
            maintenance_type: obligation.maintenance_type,
            automatic: true,
        });
    }

    /// Alertas pendientes de un vehículo; los remolques no generan alertas
    pub async fn check_maintenance_needed(&self, vehicle_id: Uuid) -> AppResult<Vec<MaintenanceAlert>> {
        let vehicle = self
            .repository
            .find_vehicle(vehicle_id)
            .await?
            .ok_or(AppError::VehicleNotFound(vehicle_id))?;
        Ok(self.alerts_for(&vehicle, Utc::now()))
    }

    /// Barrido de la flota: solo los camiones con alertas
    pub async fn vehicles_needing_maintenance(&self) -> AppResult<Vec<VehicleMaintenanceReport>> {
        let now = Utc::now();
        let trucks = self.repository.list_vehicles(Some(VehicleKind::Truck)).await?;
        let reports: Vec<VehicleMaintenanceReport> = trucks
            .into_iter()
            .filter_map(|vehicle| {
                let alerts = self.alerts_for(&vehicle, now);
                (!alerts.is_empty()).then(|| VehicleMaintenanceReport {
                    vehicle_type: vehicle.kind,
                    vehicle,
                    alerts,
                })
            })
            .collect();

        if !reports.is_empty() {
            warn!("⚠️ {} camiones requieren mantenimiento", reports.len());
        }
        Ok(reports)
    }

    pub fn alerts_for(&self, vehicle: &Vehicle, now: DateTime<Utc>) -> Vec<MaintenanceAlert> {
        let policy = &self.alert_policy;
        let Some(watermarks) = vehicle.watermarks.as_ref() else {
            return Vec::new();
        };
        let mut alerts = Vec::new();

        let km = vehicle.current_odometer - watermarks.last_oil_change_odometer;
        let oil_days = (now - watermarks.last_oil_change_date).num_days();
        if km >= policy.oil_change_km || oil_days >= policy.oil_change_days {
            let urgency = if km >= policy.oil_change_high_km || oil_days >= policy.oil_change_high_days {
                Urgency::High
            } else {
                Urgency::Medium
            };
            alerts.push(MaintenanceAlert {
                maintenance_type: MaintenanceType::OilChange,
                message: "Oil change needed".to_string(),
                urgency,
            });
        }

        let inspection_days = (now - watermarks.last_inspection_date).num_days();
        if inspection_days >= policy.inspection_days {
            let urgency = if inspection_days >= policy.inspection_high_days {
                Urgency::High
            } else {
                Urgency::Medium
            };
            alerts.push(MaintenanceAlert {
                maintenance_type: MaintenanceType::Inspection,
                message: "Annual inspection needed".to_string(),
                urgency,
            });
        }

        alerts
    }
}
