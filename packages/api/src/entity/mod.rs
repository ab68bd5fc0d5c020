//! `SeaORM` entities for the catalogue, pricing, subscription and test tables

pub mod prelude;

pub mod chapter;
pub mod class;
pub mod course;
pub mod course_type;
pub mod exam;
pub mod gateway_event;
pub mod json_columns;
pub mod module;
pub mod online_test;
pub mod pricing_config;
pub mod question;
pub mod subject;
pub mod subscription;
pub mod test_attempt;
pub mod topic;
