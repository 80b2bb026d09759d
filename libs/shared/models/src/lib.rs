pub mod access;
pub mod appointment;
pub mod auth;
pub mod error;
