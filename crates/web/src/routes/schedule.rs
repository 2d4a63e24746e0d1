//! `POST /schedule` — synchronous scheduling: C5 -> (C6 | C7) -> response.
//! `NoSchedule` is not an HTTP error: it comes back as a 200 with an
//! error-shaped `ScheduleResponse` body.

use axum::extract::State;
use axum::http::Method;
use axum::routing::post;
use axum::{Json, Router};
use model::{ScheduleRequest, ScheduleResponse, SchedulerError};
use scheduling::CachedDirectionLookup;

use crate::common::{RouteErrorResponse, RouteResult};
use crate::WebState;

pub(crate) fn routes() -> Router<WebState> {
    Router::new().route("/schedule", post(create_schedule))
}

async fn create_schedule(
    State(state): State<WebState>,
    Json(request): Json<ScheduleRequest>,
) -> RouteResult<Json<ScheduleResponse>> {
    let directions = CachedDirectionLookup {
        cache: &state.directions,
        provider: state.provider.as_ref(),
    };

    match scheduling::run(&request, &directions, &state.programs, &state.defaults).await {
        Ok(shuttles) => Ok(Json(ScheduleResponse::success(shuttles))),
        Err(SchedulerError::NoSchedule(message)) => Ok(Json(ScheduleResponse::no_schedule(message))),
        Err(why) => Err(RouteErrorResponse::from(why)
            .with_method(&Method::POST)
            .with_uri("/api/schedule")),
    }
}
