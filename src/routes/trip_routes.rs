use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::trip_controller::TripController;
use crate::dto::trip_dto::{
    CreateTripRequest, EditTripRequest, TripResponse, UpdateTripDataRequest,
    UpdateTripStatusRequest,
};
use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_trip_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_trips).post(create_trip))
        .route("/:id", get(get_trip).put(edit_trip).delete(delete_trip))
        .route("/:id/status", patch(update_trip_status))
        .route("/:id/data", patch(update_trip_data))
}

async fn create_trip(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateTripRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TripResponse>>), AppError> {
    let controller = TripController::new(&state.services);
    let response = controller.create(&user, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_trips(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<TripResponse>>, AppError> {
    let controller = TripController::new(&state.services);
    Ok(Json(controller.list(&user).await?))
}

async fn get_trip(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TripResponse>, AppError> {
    let controller = TripController::new(&state.services);
    Ok(Json(controller.get_by_id(&user, id).await?))
}

async fn edit_trip(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<EditTripRequest>,
) -> Result<Json<ApiResponse<TripResponse>>, AppError> {
    let controller = TripController::new(&state.services);
    Ok(Json(controller.edit(&user, id, request).await?))
}

async fn delete_trip(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = TripController::new(&state.services);
    Ok(Json(controller.delete(&user, id).await?))
}

async fn update_trip_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTripStatusRequest>,
) -> Result<Json<ApiResponse<TripResponse>>, AppError> {
    let controller = TripController::new(&state.services);
    Ok(Json(controller.update_status(&user, id, request).await?))
}

async fn update_trip_data(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTripDataRequest>,
) -> Result<Json<ApiResponse<TripResponse>>, AppError> {
    let controller = TripController::new(&state.services);
    Ok(Json(controller.update_data(&user, id, request).await?))
}
