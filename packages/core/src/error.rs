//! Error type shared by the pricing, catalogue and subscription logic

use crate::model::PaymentStatus;

pub type Result<T, E = EduError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum EduError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid payment transition from {from:?} to {to:?}")]
    InvalidTransition { from: PaymentStatus, to: PaymentStatus },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Pricing not set: {0}")]
    PricingNotSet(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl EduError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn store(err: impl std::fmt::Display) -> Self {
        Self::Store(err.to_string())
    }
}
