use axum::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use http::header::AUTHORIZATION;
use http::request::Parts;
use http::HeaderMap;

use common::prelude::Owner;

use crate::error::VaultError;
use crate::ServiceState;

/// The owner resolved for this request. Handlers take this instead of
/// reading any client-supplied owner field.
#[derive(Debug, Clone, Copy)]
pub struct AuthOwner(pub Owner);

#[async_trait]
impl<S> FromRequestParts<S> for AuthOwner
where
    S: Send + Sync,
{
    type Rejection = VaultError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Owner>()
            .copied()
            .map(AuthOwner)
            .ok_or(VaultError::Unauthenticated)
    }
}

/// Resolve the caller once, before the handler runs. Streaming handlers
/// get the same owner for the life of the stream.
pub async fn require_owner(
    State(state): State<ServiceState>,
    mut request: Request,
    next: Next,
) -> Result<Response, VaultError> {
    let owner = resolve_owner(&state, request.headers()).await?;
    request.extensions_mut().insert(owner);
    Ok(next.run(request).await)
}

async fn resolve_owner(state: &ServiceState, headers: &HeaderMap) -> Result<Owner, VaultError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(VaultError::Unauthenticated)?;

    if let Some(token) = value.strip_prefix("Bearer ") {
        return state.auth().verify_token(token.trim());
    }

    if let Some(encoded) = value.strip_prefix("Basic ") {
        let (login, password) = decode_basic(encoded.trim()).ok_or(VaultError::Unauthenticated)?;
        return state
            .auth()
            .authenticate(state.database(), &login, &password)
            .await;
    }

    Err(VaultError::Unauthenticated)
}

fn decode_basic(encoded: &str) -> Option<(String, String)> {
    let raw = BASE64.decode(encoded).ok()?;
    let raw = String::from_utf8(raw).ok()?;
    let (login, password) = raw.split_once(':')?;
    Some((login.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_basic() {
        let encoded = BASE64.encode("alice:pa:ss");
        assert_eq!(
            decode_basic(&encoded),
            Some(("alice".to_string(), "pa:ss".to_string()))
        );
        assert_eq!(decode_basic("!!!"), None);
        assert_eq!(decode_basic(&BASE64.encode("nocolon")), None);
    }
}
