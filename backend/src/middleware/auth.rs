//! Authentication middleware
//!
//! JWT authentication and permission checks. Every token carries the tenant
//! the caller acts for; all cost queries are scoped to it.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult, ErrorDetail, ErrorResponse};
use crate::AppState;

/// Permission to run cost composition
pub const COSTING_WRITE: (&str, &str) = ("costing", "write");
/// Permission to track budgets and run the plan pipeline
pub const BUDGET_WRITE: (&str, &str) = ("budget", "write");
/// Permission to read cost, budget and reconciliation reports
pub const REPORTS_READ: (&str, &str) = ("reports", "read");

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub role_id: Uuid,
    pub permissions: Vec<String>,
}

impl AuthUser {
    pub fn has_permission(&self, resource: &str, action: &str) -> bool {
        let permission = format!("{}:{}", resource, action);
        self.permissions.contains(&permission)
    }
}

/// JWT claims structure
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub sub: String,
    pub tenant_id: String,
    pub role_id: String,
    pub permissions: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

/// Validates the bearer token against `jwt.secret` and stores the
/// [`AuthUser`] in request extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => return unauthorized_response("Missing or invalid Authorization header"),
    };

    let claims = match decode_jwt(token, &state.config.jwt.secret) {
        Ok(claims) => claims,
        Err(msg) => return unauthorized_response(&msg),
    };

    let auth_user = match auth_user_from_claims(claims) {
        Ok(user) => user,
        Err(msg) => return unauthorized_response(msg),
    };

    request.extensions_mut().insert(auth_user);

    next.run(request).await
}

fn auth_user_from_claims(claims: Claims) -> Result<AuthUser, &'static str> {
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| "Invalid user ID in token")?;
    let tenant_id = Uuid::parse_str(&claims.tenant_id).map_err(|_| "Invalid tenant ID in token")?;
    let role_id = Uuid::parse_str(&claims.role_id).map_err(|_| "Invalid role ID in token")?;

    Ok(AuthUser {
        user_id,
        tenant_id,
        role_id,
        permissions: claims.permissions,
    })
}

/// Decode and validate JWT token
fn decode_jwt(token: &str, secret: &str) -> Result<Claims, String> {
    use jsonwebtoken::{decode, DecodingKey, Validation};

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}

fn unauthorized_body(message: &str) -> Json<ErrorResponse> {
    Json(ErrorResponse {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message_en: message.to_string(),
            message_local: "Tidak terautentikasi".to_string(),
            field: None,
        },
    })
}

fn unauthorized_response(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, unauthorized_body(message)).into_response()
}

/// Extractor for the authenticated user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| (StatusCode::UNAUTHORIZED, unauthorized_body("Authentication required")))
    }
}

/// Permission guard for handlers
pub fn check_permission(user: &AuthUser, (resource, action): (&str, &str)) -> AppResult<()> {
    if user.has_permission(resource, action) {
        Ok(())
    } else {
        tracing::warn!("User {} lacks {}:{}", user.user_id, resource, action);
        Err(AppError::InsufficientPermissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(tenant_id: &str) -> Claims {
        Claims {
            sub: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            role_id: Uuid::new_v4().to_string(),
            permissions: vec!["reports:read".to_string()],
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn test_claims_carry_tenant() {
        let tenant = Uuid::new_v4();
        let user = auth_user_from_claims(claims(&tenant.to_string())).unwrap();
        assert_eq!(user.tenant_id, tenant);
        assert!(check_permission(&user, REPORTS_READ).is_ok());
        assert!(check_permission(&user, BUDGET_WRITE).is_err());
    }

    #[test]
    fn test_malformed_tenant_rejected() {
        assert_eq!(
            auth_user_from_claims(claims("not-a-uuid")).unwrap_err(),
            "Invalid tenant ID in token"
        );
    }

    #[test]
    fn test_round_trip_token() {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let mut c = claims(&Uuid::new_v4().to_string());
        c.exp = chrono::Utc::now().timestamp() + 3600;
        let token = encode(&Header::default(), &c, &EncodingKey::from_secret(b"s3cret")).unwrap();

        assert!(decode_jwt(&token, "s3cret").is_ok());
        assert!(decode_jwt(&token, "other").is_err());
    }
}
