//! `POST /task` / `GET /task/{id}` — the asynchronous task surface (C8).
//! Creation only validates and enqueues; the task executor (C9) runs the
//! actual C5->(C6|C7) pipeline later.

use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use model::{CreateTaskResponse, ScheduleRequest, SchedulerError, Task};

use crate::common::{RouteErrorResponse, RouteResult};
use crate::WebState;

pub(crate) fn routes() -> Router<WebState> {
    Router::new()
        .route("/task", post(create_task))
        .route("/task/:id", get(get_task))
}

async fn create_task(
    State(state): State<WebState>,
    Json(request): Json<ScheduleRequest>,
) -> RouteResult<(StatusCode, Json<CreateTaskResponse>)> {
    let id = state
        .tasks
        .create(request)
        .await
        .map_err(SchedulerError::from)
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::POST)
                .with_uri("/api/task")
        })?;
    Ok((StatusCode::CREATED, Json(CreateTaskResponse { id })))
}

async fn get_task(State(state): State<WebState>, Path(id): Path<String>) -> RouteResult<Json<Task>> {
    let task = state
        .tasks
        .get(&id)
        .await
        .map_err(SchedulerError::from)
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(format!("/api/task/{id}"))
        })?;
    Ok(Json(task))
}
