use axum::{
    Json,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use eduhub::EduError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportPolicy {
    Ignore,
    Report,
}

/// Attached to reportable responses and picked up by the error reporting
/// middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub id: String,
    pub status_code: u16,
    pub public_code: String,
    pub summary: String,
    pub details: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    public_code: String,
    public_message: Option<String>,
    details: Vec<String>,
    report_policy: ReportPolicy,
    report_summary: Option<String>,
    report_details: Option<String>,
}

impl ApiError {
    pub const UNAUTHORIZED: ApiError = ApiError {
        status: StatusCode::UNAUTHORIZED,
        public_code: String::new(),
        public_message: None,
        details: Vec::new(),
        report_policy: ReportPolicy::Ignore,
        report_summary: None,
        report_details: None,
    };

    fn new(
        status: StatusCode,
        public_code: impl Into<String>,
        public_message: Option<String>,
        report_policy: ReportPolicy,
    ) -> Self {
        Self {
            status,
            public_code: public_code.into(),
            public_message,
            details: Vec::new(),
            report_policy,
            report_summary: None,
            report_details: None,
        }
    }

    fn with_report(mut self, summary: impl Into<String>, details: Option<String>) -> Self {
        self.report_summary = Some(summary.into());
        self.report_details = details;
        self
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &str {
        &self.public_code
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!("Internal error: {}", msg);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            None,
            ReportPolicy::Report,
        )
        .with_report(msg, None)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!("Not found: {}", msg);
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", Some(msg), ReportPolicy::Ignore)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!("Bad request: {}", msg);
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", Some(msg), ReportPolicy::Ignore)
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!("Validation failed: {}", msg);
        Self::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            Some(msg),
            ReportPolicy::Ignore,
        )
    }

    /// Payment signatures that do not verify. Never retried.
    pub fn invalid_signature(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!("Invalid signature: {}", msg);
        Self::new(
            StatusCode::BAD_REQUEST,
            "INVALID_SIGNATURE",
            Some(msg),
            ReportPolicy::Ignore,
        )
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!("Unauthorized: {}", msg);
        Self::new(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            Some(msg),
            ReportPolicy::Ignore,
        )
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!("Forbidden: {}", msg);
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", Some(msg), ReportPolicy::Ignore)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!("Conflict: {}", msg);
        Self::new(StatusCode::CONFLICT, "CONFLICT", Some(msg), ReportPolicy::Ignore)
    }

    pub fn unprocessable(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::warn!("Unprocessable entity: {}", msg);
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "UNPROCESSABLE_ENTITY",
            Some(msg),
            ReportPolicy::Ignore,
        )
    }

    pub fn bad_gateway(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!("Bad gateway: {}", msg);
        Self::new(
            StatusCode::BAD_GATEWAY,
            "PAYMENT_GATEWAY_ERROR",
            Some("Payment gateway request failed".to_string()),
            ReportPolicy::Report,
        )
        .with_report(msg, None)
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!("Service unavailable: {}", msg);
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            Some("Service unavailable".to_string()),
            ReportPolicy::Report,
        )
        .with_report(msg, None)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorBody<'a> {
            error: &'a str,
            message: &'a str,
            code: &'a str,
            timestamp: String,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            details: Vec<String>,
        }

        let reason = self.status.canonical_reason().unwrap_or("Error");

        let code = if self.public_code.is_empty() {
            match self.status {
                StatusCode::NOT_FOUND => "NOT_FOUND",
                StatusCode::FORBIDDEN => "FORBIDDEN",
                StatusCode::UNAUTHORIZED => "UNAUTHORIZED",
                StatusCode::BAD_REQUEST => "BAD_REQUEST",
                _ => "ERROR",
            }
        } else {
            self.public_code.as_str()
        };

        let public_message = self.public_message.as_deref().unwrap_or(reason);

        let error_id =
            (self.report_policy == ReportPolicy::Report).then(eduhub::create_id);

        let mut response = (
            self.status,
            Json(ErrorBody {
                error: reason,
                message: public_message,
                code,
                timestamp: chrono::Utc::now().to_rfc3339(),
                details: self.details,
            }),
        )
            .into_response();

        if let Some(id) = error_id.as_deref() {
            if let Ok(v) = HeaderValue::from_str(id) {
                response.headers_mut().insert("x-error-id", v);
            }

            let report = ErrorReport {
                id: id.to_string(),
                status_code: self.status.as_u16(),
                public_code: code.to_string(),
                summary: self
                    .report_summary
                    .clone()
                    .unwrap_or_else(|| public_message.to_string()),
                details: self.report_details.clone(),
            };
            response.extensions_mut().insert(report);
        }

        response
    }
}

impl From<EduError> for ApiError {
    fn from(err: EduError) -> Self {
        match err {
            EduError::Validation(msg) => Self::validation(msg),
            EduError::NotFound { .. } => Self::not_found(err.to_string()),
            EduError::InvalidTransition { .. } | EduError::Conflict(_) => {
                Self::conflict(err.to_string())
            }
            EduError::PricingNotSet(_) => Self::unprocessable(err.to_string()),
            EduError::Store(msg) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                None,
                ReportPolicy::Report,
            )
            .with_report(msg, None),
        }
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(err: sea_orm::DbErr) -> Self {
        tracing::error!("Database error: {:?}", err);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "DATABASE_ERROR",
            None,
            ReportPolicy::Report,
        )
        .with_report(format!("{:?}", err), Some(err.to_string()))
    }
}

impl From<sea_orm::TransactionError<ApiError>> for ApiError {
    fn from(err: sea_orm::TransactionError<ApiError>) -> Self {
        match err {
            sea_orm::TransactionError::Connection(db_err) => db_err.into(),
            sea_orm::TransactionError::Transaction(api_err) => api_err,
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    // struct-level validators report under `__all__`, keyed by code
                    let name: &str = if field == "__all__" { &e.code } else { &field };
                    match &e.message {
                        Some(msg) => format!("{name}: {msg}"),
                        None => format!("{name}: {}", e.code),
                    }
                })
            })
            .collect();
        details.sort();
        Self::validation("Request validation failed").with_details(details)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        Self::bad_request(format!("JSON error: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        tracing::warn!("JWT error: {:?}", err);
        Self::unauthorized(format!("JWT error: {}", err))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::bad_gateway(format!("{:?}", err))
    }
}

impl std::error::Error for ApiError {}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.public_code.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use eduhub::model::PaymentStatus;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError::not_found("exam missing not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get("x-error-id").is_none());

        let body = body_json(response).await;
        assert_eq!(body["error"], "Not Found");
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["message"], "exam missing not found");
        assert!(body["timestamp"].is_string());
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_internal_errors_are_reported_without_leaking() {
        let response = ApiError::internal("connection refused at db:5432").into_response();
        assert!(response.headers().get("x-error-id").is_some());
        assert!(response.extensions().get::<ErrorReport>().is_some());

        let body = body_json(response).await;
        assert_eq!(body["message"], "Internal Server Error");
    }

    #[test]
    fn test_core_error_mapping() {
        let cases = [
            (EduError::validation("bad"), StatusCode::BAD_REQUEST),
            (EduError::not_found("class", "x"), StatusCode::NOT_FOUND),
            (EduError::Conflict("dup".into()), StatusCode::CONFLICT),
            (
                EduError::InvalidTransition {
                    from: PaymentStatus::Paid,
                    to: PaymentStatus::Failed,
                },
                StatusCode::CONFLICT,
            ),
            (
                EduError::PricingNotSet("no price".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (EduError::store("down"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[tokio::test]
    async fn test_signature_error_code() {
        let err = ApiError::invalid_signature("mismatch");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let body = body_json(err.into_response()).await;
        assert_eq!(body["code"], "INVALID_SIGNATURE");
    }
}
