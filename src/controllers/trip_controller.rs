use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::dto::trip_dto::{
    CreateTripRequest, EditTripRequest, TripResponse, UpdateTripDataRequest,
    UpdateTripStatusRequest,
};
use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::services::{FleetServices, TripLedger};
use crate::utils::errors::{bad_request_error, AppError, AppResult};

pub struct TripController {
    ledger: Arc<TripLedger>,
}

impl TripController {
    pub fn new(services: &FleetServices) -> Self {
        Self {
            ledger: services.trips.clone(),
        }
    }

    /// Un camión o remolque inexistente en la petición es un error del cliente (400)
    pub async fn create(
        &self,
        user: &AuthenticatedUser,
        request: CreateTripRequest,
    ) -> AppResult<ApiResponse<TripResponse>> {
        request.validate()?;
        let trip = self
            .ledger
            .create_trip(&user.actor(), request.into())
            .await
            .map_err(|e| match e {
                AppError::VehicleNotFound(id) => {
                    bad_request_error(&format!("Vehicle {} does not exist", id))
                }
                other => other,
            })?;
        Ok(ApiResponse::success_with_message(
            trip.into(),
            "Viaje creado exitosamente",
        ))
    }

    pub async fn get_by_id(&self, user: &AuthenticatedUser, id: Uuid) -> AppResult<TripResponse> {
        let trip = self.ledger.get_trip(&user.actor(), id).await?;
        Ok(trip.into())
    }

    pub async fn list(&self, user: &AuthenticatedUser) -> AppResult<Vec<TripResponse>> {
        let trips = self.ledger.list_trips(&user.actor()).await?;
        Ok(trips.into_iter().map(TripResponse::from).collect())
    }

    pub async fn update_status(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        request: UpdateTripStatusRequest,
    ) -> AppResult<ApiResponse<TripResponse>> {
        let trip = self
            .ledger
            .transition_status(&user.actor(), id, request.status)
            .await?;
        let message = format!("Viaje en estado {}", trip.status.as_str());
        Ok(ApiResponse::success_with_message(trip.into(), message))
    }

    pub async fn update_data(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        request: UpdateTripDataRequest,
    ) -> AppResult<ApiResponse<TripResponse>> {
        request.validate()?;
        let trip = self
            .ledger
            .update_trip_data(&user.actor(), id, request.into())
            .await?;
        Ok(ApiResponse::success(trip.into()))
    }

    pub async fn edit(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        request: EditTripRequest,
    ) -> AppResult<ApiResponse<TripResponse>> {
        request.validate()?;
        let trip = self.ledger.edit_trip(&user.actor(), id, request.into()).await?;
        Ok(ApiResponse::success_with_message(
            trip.into(),
            "Viaje actualizado exitosamente",
        ))
    }

    pub async fn delete(&self, user: &AuthenticatedUser, id: Uuid) -> AppResult<ApiResponse<()>> {
        self.ledger.delete_trip(&user.actor(), id).await?;
        Ok(ApiResponse::message("Viaje eliminado exitosamente"))
    }
}
