use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::{MaintenanceCompletion, MaintenanceStatus, MaintenanceType, NewMaintenance};
use crate::repositories::MaintenanceFilter;

// Request para programar un mantenimiento
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleMaintenanceRequest {
    pub target_id: Uuid,
    pub maintenance_type: MaintenanceType,
    pub scheduled_date: DateTime<Utc>,
    pub cost: Option<Decimal>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl From<ScheduleMaintenanceRequest> for NewMaintenance {
    fn from(r: ScheduleMaintenanceRequest) -> Self {
        Self {
            target_id: r.target_id,
            maintenance_type: r.maintenance_type,
            scheduled_date: r.scheduled_date,
            cost: r.cost,
            notes: r.notes,
        }
    }
}

// Request para cerrar un mantenimiento
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompleteMaintenanceRequest {
    pub completed_date: Option<DateTime<Utc>>,
    pub cost: Option<Decimal>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[validate(range(min = 0))]
    pub odometer: Option<i64>,
}

impl From<CompleteMaintenanceRequest> for MaintenanceCompletion {
    fn from(r: CompleteMaintenanceRequest) -> Self {
        Self {
            completed_date: r.completed_date,
            cost: r.cost,
            notes: r.notes,
            odometer: r.odometer,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceListQuery {
    pub target_id: Option<Uuid>,
    pub status: Option<MaintenanceStatus>,
}

impl From<MaintenanceListQuery> for MaintenanceFilter {
    fn from(q: MaintenanceListQuery) -> Self {
        Self {
            target_id: q.target_id,
            statuses: q.status.into_iter().collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpcomingQuery {
    #[validate(range(min = 1, max = 365))]
    pub days: Option<i64>,
}
