use axum::{Router, middleware::from_fn_with_state, routing::get};
use tower_http::trace::TraceLayer;

use crate::{DeploymentImpl, routes};

pub mod auth;

pub fn router(deployment: DeploymentImpl) -> Router {
    let authed_routes = Router::new()
        .merge(routes::tasks::router(&deployment))
        .merge(routes::comments::router())
        .merge(routes::users::router(&deployment))
        .layer(from_fn_with_state(
            deployment.clone(),
            auth::require_api_auth,
        ));

    let api_routes = Router::new()
        .merge(routes::users::public_router())
        .merge(authed_routes);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(deployment)
}
