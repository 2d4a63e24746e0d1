//! `GET/POST /program`, `GET/PUT/DELETE /program/{id}`,
//! `POST/PUT/DELETE /program/{id}/vehicles[/{vehicle_id}]` — program CRUD
//! (C4). Administrative rather than core scheduling, but still part of the
//! request surface C10 exposes, so it gets the same `RouteErrorResponse`
//! handling as every other route.

use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use model::{Program, ProgramInput, SchedulerError, Vehicle};

use crate::common::{RouteErrorResponse, RouteResult};
use crate::WebState;

pub(crate) fn routes() -> Router<WebState> {
    Router::new()
        .route("/program", get(get_programs).post(create_program))
        .route(
            "/program/:id",
            get(get_program).put(update_program).delete(delete_program),
        )
        .route(
            "/program/:id/vehicles",
            post(add_vehicle),
        )
        .route(
            "/program/:id/vehicles/:vehicle_id",
            put(update_vehicle).delete(remove_vehicle),
        )
}

async fn get_programs(State(state): State<WebState>) -> RouteResult<Json<Vec<Program>>> {
    let programs = state.programs.get_all().await.map_err(SchedulerError::from);
    programs
        .map(Json)
        .map_err(|why| route_error(why, &Method::GET, "/api/program"))
}

async fn get_program(State(state): State<WebState>, Path(id): Path<String>) -> RouteResult<Json<Program>> {
    state
        .programs
        .get(&id)
        .await
        .map_err(SchedulerError::from)
        .map(Json)
        .map_err(|why| route_error(why, &Method::GET, format!("/api/program/{id}")))
}

async fn create_program(
    State(state): State<WebState>,
    Json(input): Json<ProgramInput>,
) -> RouteResult<(StatusCode, Json<Program>)> {
    state
        .programs
        .create(input)
        .await
        .map_err(SchedulerError::from)
        .map(|program| (StatusCode::CREATED, Json(program)))
        .map_err(|why| route_error(why, &Method::POST, "/api/program"))
}

async fn update_program(
    State(state): State<WebState>,
    Path(id): Path<String>,
    Json(input): Json<ProgramInput>,
) -> RouteResult<Json<Program>> {
    state
        .programs
        .update(&id, input)
        .await
        .map_err(SchedulerError::from)
        .map(Json)
        .map_err(|why| route_error(why, &Method::PUT, format!("/api/program/{id}")))
}

async fn delete_program(State(state): State<WebState>, Path(id): Path<String>) -> RouteResult<StatusCode> {
    state
        .programs
        .delete(&id)
        .await
        .map_err(SchedulerError::from)
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|why| route_error(why, &Method::DELETE, format!("/api/program/{id}")))
}

async fn add_vehicle(
    State(state): State<WebState>,
    Path(id): Path<String>,
    Json(vehicle): Json<Vehicle>,
) -> RouteResult<(StatusCode, Json<Program>)> {
    state
        .programs
        .add_vehicle(&id, vehicle)
        .await
        .map_err(SchedulerError::from)
        .map(|program| (StatusCode::CREATED, Json(program)))
        .map_err(|why| route_error(why, &Method::POST, format!("/api/program/{id}/vehicles")))
}

async fn update_vehicle(
    State(state): State<WebState>,
    Path((id, vehicle_id)): Path<(String, String)>,
    Json(vehicle): Json<Vehicle>,
) -> RouteResult<Json<Program>> {
    state
        .programs
        .update_vehicle(&id, &vehicle_id, vehicle)
        .await
        .map_err(SchedulerError::from)
        .map(Json)
        .map_err(|why| {
            route_error(
                why,
                &Method::PUT,
                format!("/api/program/{id}/vehicles/{vehicle_id}"),
            )
        })
}

async fn remove_vehicle(
    State(state): State<WebState>,
    Path((id, vehicle_id)): Path<(String, String)>,
) -> RouteResult<Json<Program>> {
    state
        .programs
        .remove_vehicle(&id, &vehicle_id)
        .await
        .map_err(SchedulerError::from)
        .map(Json)
        .map_err(|why| {
            route_error(
                why,
                &Method::DELETE,
                format!("/api/program/{id}/vehicles/{vehicle_id}"),
            )
        })
}

fn route_error(why: SchedulerError, method: &Method, uri: impl Into<String>) -> RouteErrorResponse {
    RouteErrorResponse::from(why).with_method(method).with_uri(uri)
}
