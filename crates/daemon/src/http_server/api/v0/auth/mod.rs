use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};

use common::prelude::Owner;

use crate::ServiceState;

pub mod login;
pub mod register;

pub use login::LoginRequest;
pub use register::RegisterRequest;

/// Returned by both register and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub owner: Owner,
    pub token: String,
}

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/register", post(register::handler))
        .route("/login", post(login::handler))
        .with_state(state)
}
