use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::dto::maintenance_dto::{
    CompleteMaintenanceRequest, MaintenanceListQuery, ScheduleMaintenanceRequest, UpcomingQuery,
};
use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::{MaintenanceObligation, VehicleMaintenanceReport};
use crate::services::{FleetServices, MaintenanceScheduler, MaintenanceService};
use crate::utils::errors::AppResult;

const DEFAULT_UPCOMING_DAYS: i64 = 30;

pub struct MaintenanceController {
    service: Arc<MaintenanceService>,
    scheduler: Arc<MaintenanceScheduler>,
}

impl MaintenanceController {
    pub fn new(services: &FleetServices) -> Self {
        Self {
            service: services.maintenance.clone(),
            scheduler: services.scheduler.clone(),
        }
    }

    pub async fn list(&self, query: MaintenanceListQuery) -> AppResult<Vec<MaintenanceObligation>> {
        self.service.list_maintenance(&query.into()).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<MaintenanceObligation> {
        self.service.get_maintenance(id).await
    }

    pub async fn upcoming(
        &self,
        user: &AuthenticatedUser,
        query: UpcomingQuery,
    ) -> AppResult<Vec<MaintenanceObligation>> {
        user.require_admin()?;
        query.validate()?;
        self.service
            .upcoming_maintenance(query.days.unwrap_or(DEFAULT_UPCOMING_DAYS))
            .await
    }

    pub async fn needed(&self, user: &AuthenticatedUser) -> AppResult<Vec<VehicleMaintenanceReport>> {
        user.require_admin()?;
        self.scheduler.vehicles_needing_maintenance().await
    }

    pub async fn schedule(
        &self,
        user: &AuthenticatedUser,
        request: ScheduleMaintenanceRequest,
    ) -> AppResult<ApiResponse<MaintenanceObligation>> {
        request.validate()?;
        let obligation = self
            .service
            .schedule_maintenance(&user.actor(), request.into())
            .await?;
        Ok(ApiResponse::success_with_message(
            obligation,
            "Mantenimiento programado exitosamente",
        ))
    }

    pub async fn start(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
    ) -> AppResult<ApiResponse<MaintenanceObligation>> {
        let obligation = self.service.start_maintenance(&user.actor(), id).await?;
        Ok(ApiResponse::success(obligation))
    }

    pub async fn complete(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        request: CompleteMaintenanceRequest,
    ) -> AppResult<ApiResponse<MaintenanceObligation>> {
        request.validate()?;
        let obligation = self
            .service
            .complete_maintenance(&user.actor(), id, request.into())
            .await?;
        Ok(ApiResponse::success_with_message(
            obligation,
            "Mantenimiento completado",
        ))
    }

    pub async fn cancel(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
    ) -> AppResult<ApiResponse<MaintenanceObligation>> {
        let obligation = self.service.cancel_maintenance(&user.actor(), id).await?;
        Ok(ApiResponse::success_with_message(
            obligation,
            "Mantenimiento cancelado",
        ))
    }
}
