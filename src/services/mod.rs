//! Business logic services

pub mod animes;
pub mod auth;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub animes: animes::AnimeService,
    pub auth: auth::AuthService,
}

impl Services {
    /// Create all services over the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        Self {
            animes: animes::AnimeService::new(repository.animes),
            auth: auth::AuthService::new(repository.users, auth_config),
        }
    }
}
