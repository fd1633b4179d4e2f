//! Entity store: persistence traits and their backends

pub mod animes;
pub mod memory;
pub mod users;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use std::{pin::Pin, sync::Arc};
use tokio_stream::Stream;

use crate::{
    error::AppResult,
    models::{user::NewCredential, Anime, Credential},
};

/// Lazy, finite sequence of stored anime in store order
pub type AnimeStream<'a> = Pin<Box<dyn Stream<Item = AppResult<Anime>> + Send + 'a>>;

/// Persistence for anime records
#[async_trait]
pub trait AnimeStore: Send + Sync {
    fn find_all(&self) -> AnimeStream<'_>;

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Anime>>;

    /// Insert when `id` is `None`, overwrite the row at `id` otherwise
    async fn save(&self, anime: Anime) -> AppResult<Anime>;

    /// Insert every record in one atomic unit
    async fn save_all(&self, animes: Vec<Anime>) -> AppResult<Vec<Anime>>;

    /// Returns whether a row was removed
    async fn delete_by_id(&self, id: i32) -> AppResult<bool>;

    async fn delete(&self, anime: &Anime) -> AppResult<bool> {
        match anime.id {
            Some(id) => self.delete_by_id(id).await,
            None => Ok(false),
        }
    }
}

/// Persistence for login credentials
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<Credential>>;

    async fn count(&self) -> AppResult<i64>;

    async fn save(&self, credential: NewCredential) -> AppResult<Credential>;
}

/// Store handles shared by the services
#[derive(Clone)]
pub struct Repository {
    pub animes: Arc<dyn AnimeStore>,
    pub users: Arc<dyn CredentialStore>,
}

impl Repository {
    /// Postgres-backed repository over the given pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            animes: Arc::new(animes::PgAnimeStore::new(pool.clone())),
            users: Arc::new(users::PgCredentialStore::new(pool)),
        }
    }

    /// Repository holding everything in process memory
    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::new());
        Self {
            animes: store.clone(),
            users: store,
        }
    }
}
