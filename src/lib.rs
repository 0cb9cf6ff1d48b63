//! SM Access Core - Secrets Manager access policy and porting backend
//!
//! Provides the access policy creation command, Secrets Manager
//! import/export, and the REST API exposing them.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod migration;
pub mod repository;
pub mod server;
pub mod service;
pub mod state;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, Result};
