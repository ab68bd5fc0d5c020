use std::sync::Arc;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use middleware::{error_reporting::error_reporting_middleware, jwt::jwt_middleware};
use state::State;
use tower::ServiceBuilder;
use tower_http::{
    compression::{CompressionLayer, DefaultPredicate, Predicate, predicate::NotForContentType},
    cors::CorsLayer,
    decompression::RequestDecompressionLayer,
};

pub mod entity;
mod middleware;
mod routes;

pub mod error;
pub mod payment;
pub mod schema;
pub mod state;
pub mod store;

#[cfg(test)]
mod testing;

pub use axum;
pub mod auth {
    use crate::middleware;
    pub use middleware::jwt::{AppUser, Claims, Role, issue_token};
}

pub use sea_orm;

pub fn construct_router(state: Arc<State>) -> Router {
    let router = Router::new()
        .nest("/health", routes::health::routes())
        .nest("/catalogue", routes::catalogue::routes())
        .nest("/admin", routes::admin::routes())
        .nest("/student", routes::student::routes())
        .nest("/webhook", routes::webhook::routes())
        .with_state(state.clone())
        .route("/version", get(|| async { env!("CARGO_PKG_VERSION") }))
        .layer(from_fn(error_reporting_middleware))
        .layer(from_fn_with_state(state.clone(), jwt_middleware))
        .layer(CorsLayer::permissive())
        .layer(
            ServiceBuilder::new()
                .layer(RequestDecompressionLayer::new())
                .layer(CompressionLayer::new().compress_when(
                    DefaultPredicate::new().and(NotForContentType::new("text/event-stream")),
                )),
        );

    Router::new().nest("/api/v1", router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Role, issue_token};
    use crate::state::ApiConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header::AUTHORIZATION};
    use sea_orm::DatabaseConnection;
    use tower::ServiceExt;

    const SECRET: &str = "router-secret";

    fn router() -> Router {
        let state = State::with_gateway(
            DatabaseConnection::Disconnected,
            ApiConfig {
                jwt_secret: SECRET.into(),
                currency: "INR".into(),
                payment: None,
            },
            None,
        );
        construct_router(Arc::new(state))
    }

    fn request(method: &str, uri: &str, role: Option<Role>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(role) = role {
            let token = issue_token(SECRET, "user-1", role, chrono::Duration::hours(1)).unwrap();
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(request("GET", "/api/v1/health", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_routes_require_admin_role() {
        let response = router()
            .oneshot(request("GET", "/api/v1/admin/course-types", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router()
            .oneshot(request("GET", "/api/v1/admin/course-types", Some(Role::Student)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_invalid_token_is_rejected() {
        let request = Request::builder()
            .uri("/api/v1/student/subscriptions")
            .header(AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_webhook_without_gateway_is_unavailable() {
        let response = router()
            .oneshot(request("POST", "/api/v1/webhook/payment", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
