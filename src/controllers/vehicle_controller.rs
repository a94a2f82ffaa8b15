use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::dto::vehicle_dto::{
    AvailabilityQuery, AvailabilityResponse, OdometerResponse, RegisterVehicleRequest,
    UpdateOdometerRequest, UpdateVehicleRequest, UpdateVehicleStatusRequest, VehicleListQuery,
};
use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::{MaintenanceAlert, Vehicle};
use crate::services::availability_checker::resolve_window;
use crate::services::{AvailabilityChecker, FleetServices, MaintenanceScheduler, VehicleRegistry};
use crate::utils::errors::AppResult;

pub struct VehicleController {
    registry: Arc<VehicleRegistry>,
    scheduler: Arc<MaintenanceScheduler>,
    availability: Arc<AvailabilityChecker>,
}

impl VehicleController {
    pub fn new(services: &FleetServices) -> Self {
        Self {
            registry: services.vehicles.clone(),
            scheduler: services.scheduler.clone(),
            availability: services.availability.clone(),
        }
    }

    pub async fn register(
        &self,
        user: &AuthenticatedUser,
        request: RegisterVehicleRequest,
    ) -> AppResult<ApiResponse<Vehicle>> {
        request.validate()?;
        let vehicle = self.registry.register_vehicle(&user.actor(), request.into()).await?;
        Ok(ApiResponse::success_with_message(
            vehicle,
            "Vehículo registrado exitosamente",
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Vehicle> {
        self.registry.get_vehicle(id).await
    }

    pub async fn list(&self, query: VehicleListQuery) -> AppResult<Vec<Vehicle>> {
        self.registry.list_vehicles(query.kind).await
    }

    pub async fn update(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        request: UpdateVehicleRequest,
    ) -> AppResult<ApiResponse<Vehicle>> {
        request.validate()?;
        let vehicle = self
            .registry
            .update_vehicle_details(&user.actor(), id, request.into())
            .await?;
        Ok(ApiResponse::success_with_message(
            vehicle,
            "Vehículo actualizado exitosamente",
        ))
    }

    pub async fn delete(&self, user: &AuthenticatedUser, id: Uuid) -> AppResult<ApiResponse<()>> {
        self.registry.delete_vehicle(&user.actor(), id).await?;
        Ok(ApiResponse::message("Vehículo eliminado exitosamente"))
    }

    pub async fn set_status(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        request: UpdateVehicleStatusRequest,
    ) -> AppResult<ApiResponse<Vehicle>> {
        user.require_admin()?;
        let vehicle = self.registry.set_status(id, request.status).await?;
        Ok(ApiResponse::success(vehicle))
    }

    /// Avanza el odómetro y deja que el planificador decida si toca mantenimiento
    pub async fn update_odometer(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        request: UpdateOdometerRequest,
    ) -> AppResult<ApiResponse<OdometerResponse>> {
        user.require_admin()?;
        request.validate()?;
        let update = self.scheduler.record_odometer(id, request.odometer).await?;
        let message = match &update.obligation {
            Some(_) => "Odómetro actualizado; mantenimiento programado",
            None => "Odómetro actualizado",
        };
        Ok(ApiResponse::success_with_message(
            OdometerResponse {
                vehicle: update.vehicle,
                maintenance_scheduled: update.obligation,
            },
            message,
        ))
    }

    /// Un vehículo inexistente responde 404 antes de validar la ventana;
    /// ocupado o en mantenimiento, con el error de negocio (400)
    pub async fn availability(
        &self,
        id: Uuid,
        query: AvailabilityQuery,
    ) -> AppResult<AvailabilityResponse> {
        self.availability
            .check_available(id, query.start, query.end)
            .await?;
        let window = resolve_window(query.start, query.end)?;

        Ok(AvailabilityResponse {
            vehicle_id: id,
            available: true,
            start: window.start,
            end: window.end,
        })
    }

    pub async fn maintenance_alerts(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
    ) -> AppResult<Vec<MaintenanceAlert>> {
        user.require_admin()?;
        self.scheduler.check_maintenance_needed(id).await
    }
}
