use axum::{middleware, Router};

pub mod auth;
pub mod binaries;
pub mod secrets;

use crate::auth::require_owner;
use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    let protected = Router::new()
        .nest("/secrets", secrets::router(state.clone()))
        .nest("/binaries", binaries::router(state.clone()))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_owner));

    Router::new()
        .nest("/auth", auth::router(state.clone()))
        .merge(protected)
        .with_state(state)
}
