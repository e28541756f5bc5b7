//! Bearer-token validation and tenant context resolution.
//!
//! Token issuance lives in a separate login service; this module only
//! validates tokens and turns their claims into a [`TenantContext`]
//! capability that every store and service takes explicitly. Queries that
//! cross tenants are defects, so nothing here exposes a "no company"
//! escape hatch outside the system jobs.

use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::EnumString;

use crate::errors::ServiceError;

/// Administrative role carried by the token. Ordering of the variants is
/// meaningful: anything at or above `Director` may bypass edit windows.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    Staff,
    Supervisor,
    Manager,
    Director,
    Admin,
    Boss,
    SuperAdmin,
}

impl AdminRole {
    /// Elevated roles may edit any schedule date and see every outlet.
    pub fn is_elevated(self) -> bool {
        self >= AdminRole::Director
    }

    pub fn is_super_admin(self) -> bool {
        self == AdminRole::SuperAdmin
    }
}

/// Role attached to the caller's position row (crew builds nothing,
/// supervisors get the T+3 window, managers edit freely).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PositionRole {
    Manager,
    Supervisor,
    Crew,
}

/// JWT claims issued by the login service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i64,
    /// Tenant
    pub company_id: i64,
    /// Optional outlet scope
    #[serde(default)]
    pub outlet_id: Option<i64>,
    pub role: AdminRole,
    #[serde(default)]
    pub position_role: Option<PositionRole>,
    pub exp: usize,
    pub iat: usize,
}

/// Per-request tenant capability. Passed explicitly into every service
/// call; holding one proves the request was authenticated and scoped.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub user_id: i64,
    pub company_id: i64,
    pub outlet_id: Option<i64>,
    pub role: AdminRole,
    pub position_role: Option<PositionRole>,
}

impl TenantContext {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            company_id: claims.company_id,
            outlet_id: claims.outlet_id,
            role: claims.role,
            position_role: claims.position_role,
        }
    }

    /// Context used by cron jobs acting on behalf of a single tenant.
    pub fn system(company_id: i64) -> Self {
        Self {
            user_id: 0,
            company_id,
            outlet_id: None,
            role: AdminRole::SuperAdmin,
            position_role: None,
        }
    }

    pub fn is_elevated(&self) -> bool {
        self.role.is_elevated()
    }
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .ok_or_else(|| ServiceError::Unauthorized("missing tenant context".into()))
    }
}

/// Validates bearer tokens. Shared via `Arc` in request extensions.
pub struct AuthService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthService {
    pub fn new(jwt_secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Self {
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| ServiceError::JwtError(e.to_string()))
    }
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Resolves the tenant context for the request or rejects with 401.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let Some(auth) = request.extensions().get::<Arc<AuthService>>().cloned() else {
        return ServiceError::InternalError("auth service not configured".into()).into_response();
    };

    let Some(token) = bearer_token(&request) else {
        return ServiceError::Unauthorized("missing bearer token".into()).into_response();
    };

    match auth.validate_token(token) {
        Ok(claims) => {
            request
                .extensions_mut()
                .insert(TenantContext::from_claims(&claims));
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

async fn role_middleware(
    axum::extract::State(min_role): axum::extract::State<AdminRole>,
    request: Request,
    next: Next,
) -> Response {
    match request.extensions().get::<TenantContext>() {
        Some(ctx) if ctx.role >= min_role => next.run(request).await,
        Some(_) => ServiceError::Forbidden(format!("requires {:?} role", min_role)).into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_role(self, min_role: AdminRole) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_role(self, min_role: AdminRole) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            min_role,
            role_middleware,
        ))
        .with_auth()
    }
}
