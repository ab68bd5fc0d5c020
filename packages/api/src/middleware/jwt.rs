use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use hyper::header::AUTHORIZATION;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    /// Seconds since the epoch
    pub exp: u64,
}

impl Claims {
    pub fn is_expired(&self) -> bool {
        self.exp <= chrono::Utc::now().timestamp().max(0) as u64
    }
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub sub: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub enum AppUser {
    Authenticated(AuthUser),
    Unauthorized,
}

impl AppUser {
    pub fn sub(&self) -> Result<String, ApiError> {
        match self {
            AppUser::Authenticated(user) => Ok(user.sub.clone()),
            AppUser::Unauthorized => Err(ApiError::UNAUTHORIZED),
        }
    }

    pub fn require_admin(&self) -> Result<String, ApiError> {
        match self {
            AppUser::Authenticated(AuthUser {
                sub,
                role: Role::Admin,
            }) => Ok(sub.clone()),
            AppUser::Authenticated(_) => Err(ApiError::forbidden("Admin role required")),
            AppUser::Unauthorized => Err(ApiError::UNAUTHORIZED),
        }
    }
}

/// Signs a token for `sub`. Used by tooling and tests; production tokens come
/// from the identity service sharing `JWT_SECRET`.
pub fn issue_token(
    secret: &str,
    sub: &str,
    role: Role,
    ttl: chrono::Duration,
) -> Result<String, ApiError> {
    let exp = (chrono::Utc::now() + ttl).timestamp().max(0) as u64;
    let claims = Claims {
        sub: sub.to_string(),
        role,
        exp,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

pub async fn jwt_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response<Body>, ApiError> {
    let mut request = request;
    if let Some(auth_header) = request.headers().get(AUTHORIZATION)
        && let Ok(token) = auth_header.to_str()
    {
        let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();
        let claims = state.validate_token(token)?;
        let user = AppUser::Authenticated(AuthUser {
            sub: claims.sub,
            role: claims.role,
        });
        request.extensions_mut().insert::<AppUser>(user);
        return Ok(next.run(request).await);
    }

    request
        .extensions_mut()
        .insert::<AppUser>(AppUser::Unauthorized);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ApiConfig, State};
    use axum::http::StatusCode;
    use sea_orm::DatabaseConnection;

    fn state() -> State {
        State::with_gateway(
            DatabaseConnection::Disconnected,
            ApiConfig {
                jwt_secret: "test-secret".into(),
                currency: "INR".into(),
                payment: None,
            },
            None,
        )
    }

    #[test]
    fn test_issued_token_validates_and_is_cached() {
        let state = state();
        let token =
            issue_token("test-secret", "admin-1", Role::Admin, chrono::Duration::hours(1)).unwrap();

        let claims = state.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "admin-1");
        assert_eq!(claims.role, Role::Admin);

        state.auth_cache.run_pending_tasks();
        assert_eq!(state.auth_cache.entry_count(), 1);
        assert_eq!(state.validate_token(&token).unwrap(), claims);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let state = state();
        let token =
            issue_token("other-secret", "s1", Role::Student, chrono::Duration::hours(1)).unwrap();

        let err = state.validate_token(&token).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert!(state.validate_token(&token).is_err());
    }

    #[test]
    fn test_roles() {
        let student = AppUser::Authenticated(AuthUser {
            sub: "s1".into(),
            role: Role::Student,
        });
        assert_eq!(student.sub().unwrap(), "s1");
        assert_eq!(
            student.require_admin().unwrap_err().status(),
            StatusCode::FORBIDDEN
        );

        let admin = AppUser::Authenticated(AuthUser {
            sub: "a1".into(),
            role: Role::Admin,
        });
        assert_eq!(admin.require_admin().unwrap(), "a1");

        assert_eq!(
            AppUser::Unauthorized.sub().unwrap_err().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
