mod direction;
mod health;
mod program;
mod schedule;
mod task;

use axum::Router;

use crate::WebState;

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(direction::routes())
        .merge(schedule::routes())
        .merge(task::routes())
        .merge(program::routes())
        .with_state(state)
}
