//! `GET /direction` — a thin synchronous passthrough to C2's fetch, not
//! just a cache peek. Grounded on `app/routers/direction.py`, which calls
//! the same service the scheduler uses internally.

use axum::extract::{Query, State};
use axum::http::Method;
use axum::routing::get;
use axum::{Json, Router};
use model::{Direction, SchedulerError};
use scheduling::{CachedDirectionLookup, DirectionLookup};
use serde::Deserialize;

use crate::common::{RouteErrorResponse, RouteResult};
use crate::WebState;

pub(crate) fn routes() -> Router<WebState> {
    Router::new().route("/direction", get(get_direction))
}

#[derive(Deserialize)]
struct DirectionQuery {
    from: String,
    to: String,
}

async fn get_direction(
    Query(query): Query<DirectionQuery>,
    State(state): State<WebState>,
) -> RouteResult<Json<Direction>> {
    let lookup = CachedDirectionLookup {
        cache: &state.directions,
        provider: state.provider.as_ref(),
    };
    let outcome = lookup
        .fetch(&query.from, &query.to, None)
        .await
        .map_err(route_error)?;

    outcome.map(Json).ok_or_else(|| {
        route_error(SchedulerError::NoRoute {
            from: query.from.clone(),
            to: query.to.clone(),
        })
    })
}

fn route_error(why: SchedulerError) -> RouteErrorResponse {
    RouteErrorResponse::from(why)
        .with_method(&Method::GET)
        .with_uri("/api/direction")
}
