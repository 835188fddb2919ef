pub mod errors;
pub mod handlers;

pub use errors::MirrorError;

use axum::{Router, routing::get};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::app_state::AppState;
use crate::health::health_check;
use crate::mirror::handlers::{addon_page, home, package, proxy_asset, search};

/// The mirror's full HTTP surface.
pub fn router(state: AppState) -> Router {
    let static_files = ServeDir::new(state.config.template_dir());

    Router::new()
        .route("/", get(home))
        .route("/healthz", get(health_check))
        .route("/a/{addon}", get(addon_page))
        .route("/s", get(search))
        .route("/s/", get(search))
        .route("/p/{*path}", get(proxy_asset))
        .route("/g/{package}", get(package))
        .nest_service("/html", static_files)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state)
}
