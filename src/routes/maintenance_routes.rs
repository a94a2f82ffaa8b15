use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::maintenance_controller::MaintenanceController;
use crate::dto::maintenance_dto::{
    CompleteMaintenanceRequest, MaintenanceListQuery, ScheduleMaintenanceRequest, UpcomingQuery,
};
use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::{MaintenanceObligation, VehicleMaintenanceReport};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_maintenance_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_maintenance).post(schedule_maintenance))
        .route("/needed", get(vehicles_needing_maintenance))
        .route("/upcoming", get(upcoming_maintenance))
        .route("/:id", get(get_maintenance))
        .route("/:id/start", patch(start_maintenance))
        .route("/:id/complete", patch(complete_maintenance))
        .route("/:id/cancel", patch(cancel_maintenance))
}

async fn list_maintenance(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<MaintenanceListQuery>,
) -> Result<Json<Vec<MaintenanceObligation>>, AppError> {
    let controller = MaintenanceController::new(&state.services);
    Ok(Json(controller.list(query).await?))
}

async fn schedule_maintenance(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<ScheduleMaintenanceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MaintenanceObligation>>), AppError> {
    let controller = MaintenanceController::new(&state.services);
    let response = controller.schedule(&user, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn vehicles_needing_maintenance(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<VehicleMaintenanceReport>>, AppError> {
    let controller = MaintenanceController::new(&state.services);
    Ok(Json(controller.needed(&user).await?))
}

async fn upcoming_maintenance(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<UpcomingQuery>,
) -> Result<Json<Vec<MaintenanceObligation>>, AppError> {
    let controller = MaintenanceController::new(&state.services);
    Ok(Json(controller.upcoming(&user, query).await?))
}

async fn get_maintenance(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MaintenanceObligation>, AppError> {
    let controller = MaintenanceController::new(&state.services);
    Ok(Json(controller.get_by_id(id).await?))
}

async fn start_maintenance(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MaintenanceObligation>>, AppError> {
    let controller = MaintenanceController::new(&state.services);
    Ok(Json(controller.start(&user, id).await?))
}

async fn complete_maintenance(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<CompleteMaintenanceRequest>,
) -> Result<Json<ApiResponse<MaintenanceObligation>>, AppError> {
    let controller = MaintenanceController::new(&state.services);
    Ok(Json(controller.complete(&user, id, request).await?))
}

async fn cancel_maintenance(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MaintenanceObligation>>, AppError> {
    let controller = MaintenanceController::new(&state.services);
    Ok(Json(controller.cancel(&user, id).await?))
}
