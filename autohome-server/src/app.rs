use std::sync::Arc;

use autohome_core::AutoHome;
use axum::Router;
use axum::routing::post;
use tower_http::trace::TraceLayer;

use crate::handles::*;

pub fn create_app(home: Arc<AutoHome>, prefix: &str) -> Router {
    let route = match prefix.trim_matches('/') {
        "" => String::from("/:action"),
        prefix => format!("/{prefix}/:action"),
    };

    Router::new()
        .route(&route, post(execute_action))
        .with_state(ActionState { home })
        .layer(TraceLayer::new_for_http())
}
