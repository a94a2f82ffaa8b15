use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::vehicle_controller::VehicleController;
use crate::dto::vehicle_dto::{
    AvailabilityQuery, AvailabilityResponse, OdometerResponse, RegisterVehicleRequest,
    UpdateOdometerRequest, UpdateVehicleRequest, UpdateVehicleStatusRequest, VehicleListQuery,
};
use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::{MaintenanceAlert, Vehicle};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles).post(register_vehicle))
        .route(
            "/:id",
            get(get_vehicle).put(update_vehicle).delete(delete_vehicle),
        )
        .route("/:id/status", patch(update_vehicle_status))
        .route("/:id/odometer", patch(update_odometer))
        .route("/:id/availability", get(check_availability))
        .route("/:id/maintenance-alerts", get(maintenance_alerts))
}

async fn register_vehicle(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<RegisterVehicleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Vehicle>>), AppError> {
    let controller = VehicleController::new(&state.services);
    let response = controller.register(&user, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_vehicles(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<VehicleListQuery>,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    let controller = VehicleController::new(&state.services);
    Ok(Json(controller.list(query).await?))
}

async fn get_vehicle(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vehicle>, AppError> {
    let controller = VehicleController::new(&state.services);
    Ok(Json(controller.get_by_id(id).await?))
}

async fn update_vehicle(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVehicleRequest>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let controller = VehicleController::new(&state.services);
    Ok(Json(controller.update(&user, id, request).await?))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = VehicleController::new(&state.services);
    Ok(Json(controller.delete(&user, id).await?))
}

async fn update_vehicle_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVehicleStatusRequest>,
) -> Result<Json<ApiResponse<Vehicle>>, AppError> {
    let controller = VehicleController::new(&state.services);
    Ok(Json(controller.set_status(&user, id, request).await?))
}

async fn update_odometer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateOdometerRequest>,
) -> Result<Json<ApiResponse<OdometerResponse>>, AppError> {
    let controller = VehicleController::new(&state.services);
    Ok(Json(controller.update_odometer(&user, id, request).await?))
}

async fn check_availability(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let controller = VehicleController::new(&state.services);
    Ok(Json(controller.availability(id, query).await?))
}

async fn maintenance_alerts(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<MaintenanceAlert>>, AppError> {
    let controller = VehicleController::new(&state.services);
    Ok(Json(controller.maintenance_alerts(&user, id).await?))
}
