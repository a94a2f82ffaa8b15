//! Eventos de la flota
//!
//! Se publican después de un commit exitoso. La entrega (notificaciones,
//! reportes) es responsabilidad de los suscriptores.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::models::MaintenanceType;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FleetEvent {
    #[serde(rename_all = "camelCase")]
    MaintenanceScheduled {
        obligation_id: Uuid,
        vehicle_id: Uuid,
        maintenance_type: MaintenanceType,
        automatic: bool,
    },
    #[serde(rename_all = "camelCase")]
    MaintenanceCompleted {
        obligation_id: Uuid,
        vehicle_id: Uuid,
        maintenance_type: MaintenanceType,
    },
    #[serde(rename_all = "camelCase")]
    TripCompleted {
        trip_id: Uuid,
        driver_id: Uuid,
        truck_id: Uuid,
        distance: i64,
    },
}

#[derive(Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<FleetEvent>,
}

impl EventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FleetEvent> {
        self.sender.subscribe()
    }

    /// Publica el evento; sin suscriptores se descarta
    pub fn publish(&self, event: FleetEvent) {
        if let Err(broadcast::error::SendError(event)) = self.sender.send(event) {
            debug!("📭 Evento sin suscriptores: {:?}", event);
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(256)
    }
}
