//! Configuration module for personal-memory
//!
//! This module loads the application configuration and resolves storage paths.

pub mod app_config;
pub mod path_resolver;

pub use app_config::AppConfig;
