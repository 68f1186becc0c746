//! Shared types, errors, and configuration for Sairex.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error types
//! - Configuration management
//! - Authenticated principal (JWT claims and roles)
//! - Pagination types for list endpoints

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;


pub use auth::{Claims, Role};
pub use config::{AppConfig, JwtConfig, OrchestratorConfig};
pub use error::AppError;
pub use jwt::{JwtError, JwtService};
