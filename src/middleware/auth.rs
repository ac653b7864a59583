//! Session authentication middleware for the portal routes.
//!
//! Portal requests (developer dashboard, admin actions) carry the opaque
//! session token from login as a bearer credential:
//!
//! ```text
//! Authorization: Bearer <session token>
//! ```
//!
//! The middleware resolves the token through the user store and injects a
//! [`CurrentUser`] extension; unauthenticated requests are rejected with
//! HTTP 401. Role checks happen in the handlers (admin routes return 403
//! for non-admins).

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::models::user::User;
use crate::state::AppState;

/// The authenticated user, available to handlers via `Extension`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Pull the bearer credential out of the Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Session authentication middleware.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <token>` from the request
/// 2. Resolve the token to a user through the store
/// 3. Inject `CurrentUser` into the request extensions and continue
/// 4. Reject with 401 if the header or session is missing/invalid
pub async fn session_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).ok_or(AppError::InvalidSessionToken)?;

    let user = state
        .store
        .user_by_session(token)
        .await?
        .ok_or(AppError::InvalidSessionToken)?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Peer address of the connection, when the listener provides one.
///
/// The address is read from the `ConnectInfo` extension populated by
/// `into_make_service_with_connect_info`; listeners without it (and plain
/// in-process requests) yield `None`. Extraction never fails.
#[derive(Debug, Clone, Copy)]
pub struct ClientAddr(pub Option<SocketAddr>);

impl<S> FromRequestParts<S> for ClientAddr
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
        ))
    }
}

/// Identify the caller of a public AI route for rate-limit keying.
///
/// Precedence: an `active` developer API key attributes the request to its
/// owner (`user:{id}`); otherwise the client address gets its own bucket
/// (`ip:{addr}`); only callers with neither share the `anonymous` bucket.
/// The public routes are never rejected on auth grounds; identification
/// only feeds the limiter.
pub async fn rate_limit_identity(
    state: &AppState,
    headers: &HeaderMap,
    client: Option<SocketAddr>,
) -> String {
    if let Some(key) = bearer_token(headers) {
        match state.store.user_by_api_key(key).await {
            Ok(Some(user))
                if user
                    .api_key(key)
                    .is_some_and(|k| k.status == crate::models::user::ApiKeyStatus::Active) =>
            {
                return format!("user:{}", user.id);
            }
            Ok(_) => {
                tracing::debug!("bearer credential did not match an active API key");
            }
            Err(err) => {
                tracing::warn!(error = %err, "API key lookup failed; identifying by address");
            }
        }
    }

    // Key by IP, not the full socket address: one host shares one window
    // across its ephemeral ports
    match client {
        Some(addr) => format!("ip:{}", addr.ip()),
        None => "anonymous".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[tokio::test]
    async fn client_addr_reads_the_connect_info_extension() {
        let addr: SocketAddr = "10.0.0.1:40000".parse().unwrap();
        let (mut parts, _) = axum::http::Request::builder()
            .extension(ConnectInfo(addr))
            .body(())
            .unwrap()
            .into_parts();
        let ClientAddr(found) = ClientAddr::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(found, Some(addr));
    }

    #[tokio::test]
    async fn client_addr_is_none_without_connect_info() {
        let (mut parts, _) = axum::http::Request::builder().body(()).unwrap().into_parts();
        let ClientAddr(found) = ClientAddr::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn bearer_token_requires_the_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert("Authorization", HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);

        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
