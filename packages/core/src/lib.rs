pub mod catalogue;
pub mod error;
pub mod model;
pub mod pricing;
pub mod scoring;
pub mod store;
pub mod subscription;

#[cfg(test)]
pub(crate) mod fixtures;

pub use chrono;
pub use rust_decimal;

pub use error::{EduError, Result};

pub fn create_id() -> String {
    cuid2::create_id()
}
