pub mod admin;
pub mod catalogue;
pub mod health;
pub mod student;
pub mod webhook;
