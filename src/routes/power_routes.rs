use axum::{
    routing::{get, post},
    Router,
};

use crate::controllers::power_controller::{
    get_model_config, health, post_series, post_solar_position,
};
use crate::shared_state::AppState;

/// Build the `/api/*` sub-router.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health",         get(health))
        .route("/model/config",   get(get_model_config))
        .route("/solar-position", post(post_solar_position))
        .route("/series",         post(post_series))
        .with_state(state)
}
