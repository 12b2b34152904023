//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod health;
pub mod upload;

/// Creates the API router.
///
/// The upload body limit is sized from the state's limits, so the state is
/// needed while building the router.
pub fn api_routes_with_state(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(upload::routes(state.limits.max_file_size))
}
