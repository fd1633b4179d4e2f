//! Anime catalog server
//!
//! A REST JSON API over a single `Anime` resource. Reads need the USER role,
//! writes the ADMIN role; every failure is returned as one JSON error shape.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

impl AppState {
    pub fn new(config: AppConfig, repository: repository::Repository) -> Self {
        let services = services::Services::new(repository, config.auth.clone());
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }
}
