use axum::{response::Html, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use utoipa::OpenApi;
use utoipa_scalar::Scalar;

use floating_pv_model::api_docs::ApiDoc;
use floating_pv_model::config::Config;
use floating_pv_model::routes::power_routes::api_routes;
use floating_pv_model::shared_state::AppState;
use floating_pv_model::telemetry::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // 1. Load configuration
    let path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config = Config::load(&path)?;
    info!(
        path = %path,
        latitude = config.model.site.latitude,
        longitude = config.model.site.longitude,
        sky_model = ?config.model.panel.sky_model,
        "configuration loaded"
    );

    // 2. Build the pipeline once, shared by all requests
    let state = AppState::new(config.model.clone())?;
    info!(
        total_area_m2 = state.pipeline.power_model().total_area_m2(),
        derating_product = state.pipeline.power_model().derating_product(),
        "pipeline ready"
    );

    // 3. Start Axum HTTP server
    let app = Router::new()
        .nest("/api", api_routes(state))
        .route("/scalar", get(|| async {
            Html(Scalar::new(ApiDoc::openapi()).to_html())
        }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.server.socket_addr()?;
    info!("API server listening on http://{addr}");
    info!("Scalar UI: http://{addr}/scalar");

    axum_server::bind(addr)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
