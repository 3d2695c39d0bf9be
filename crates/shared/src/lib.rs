//! Shared types, errors, and configuration for Neraca.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Amount helpers (display rounding, the 0.01 balance tolerance)
//! - Strict `YYYY-MM-DD` date parsing
//! - The error taxonomy every domain error maps onto
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::ErrorKind;
