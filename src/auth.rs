use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::decode;

use crate::{
    error::ApiError,
    token::{Claims, TokenKeys},
};

/// The single privileged role. Every registered account receives it.
pub const ADMIN_ROLE: &str = "Admin";

/// Shared, read-only signing key material as stored in the application state.
pub type KeysState = Arc<TokenKeys>;

/// AuthUser
///
/// The resolved identity of a request that passed the gate. Attached to the request
/// extensions by the router's gate middleware, so handlers behind it extract it without re-validating.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: i32,
    pub role: String,
}

/// GateRejection
///
/// Terminal failure states of the gate. The first three are "unauthenticated" (401),
/// `InsufficientRole` is "forbidden" (403).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    MissingToken,
    InvalidSignature,
    Expired,
    InsufficientRole,
}

impl GateRejection {
    pub fn is_forbidden(self) -> bool {
        matches!(self, GateRejection::InsufficientRole)
    }
}

impl From<GateRejection> for ApiError {
    fn from(rejection: GateRejection) -> Self {
        if rejection.is_forbidden() {
            ApiError::Forbidden
        } else {
            ApiError::Unauthorized
        }
    }
}

/// AuthorizationGate
///
/// Per-request policy evaluator:
/// `NoToken -> signature -> expiry -> role (if required) -> Authorized`.
/// Every state is terminal for the request; nothing is retried.
#[derive(Clone)]
pub struct AuthorizationGate {
    keys: KeysState,
}

impl AuthorizationGate {
    pub fn new(keys: KeysState) -> Self {
        Self { keys }
    }

    /// evaluate
    ///
    /// `authorization` is the raw `Authorization` header value, if any. An empty
    /// `required_roles` means any valid token passes. `now` is seconds since the epoch.
    pub fn evaluate(
        &self,
        authorization: Option<&str>,
        required_roles: &[&str],
        now: i64,
    ) -> Result<AuthUser, GateRejection> {
        let token = authorization
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(GateRejection::MissingToken)?;

        let claims = decode::<Claims>(token, self.keys.decoding_key(), self.keys.validation())
            .map_err(|e| {
                tracing::debug!("token rejected: {:?}", e.kind());
                GateRejection::InvalidSignature
            })?
            .claims;

        if claims.exp <= now {
            return Err(GateRejection::Expired);
        }

        // A correctly signed token with a non-numeric subject was not issued by us.
        let id = claims
            .sub
            .parse::<i32>()
            .map_err(|_| GateRejection::InvalidSignature)?;

        check_role(&claims.role, required_roles)?;

        Ok(AuthUser {
            id,
            role: claims.role,
        })
    }
}

/// authorize_request
///
/// Runs the gate against the request's `Authorization` header at the current time.
/// Rejections are logged and mapped to 401 or 403.
pub fn authorize_request(
    keys: KeysState,
    headers: &HeaderMap,
    required_roles: &[&str],
) -> Result<AuthUser, ApiError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    AuthorizationGate::new(keys)
        .evaluate(authorization, required_roles, Utc::now().timestamp())
        .map_err(|rejection| {
            tracing::info!(?rejection, "request rejected by authorization gate");
            ApiError::from(rejection)
        })
}

fn check_role(role: &str, allowed_roles: &[&str]) -> Result<(), GateRejection> {
    if allowed_roles.is_empty() || allowed_roles.contains(&role) {
        Ok(())
    } else {
        Err(GateRejection::InsufficientRole)
    }
}

/// AuthUser Extractor Implementation
///
/// Reuses the identity attached by the router's gate middleware when present; otherwise runs the
/// gate (any role) against the `Authorization` header and the shared `TokenKeys`.
///
/// Rejection: `ApiError::Unauthorized` (401) for any token failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    KeysState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let user = authorize_request(KeysState::from_ref(state), &parts.headers, &[])?;

        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
