//! In-process store backing both traits
//!
//! Used by tests and by `database.backend = "memory"`. Each operation holds
//! the lock for its whole critical section and never across an await, so a
//! batch insert is never observed half-written.

use async_trait::async_trait;
use std::{
    collections::BTreeMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use super::{AnimeStore, AnimeStream, CredentialStore};
use crate::{
    error::{AppError, AppResult},
    models::{user::NewCredential, Anime, Credential},
};

#[derive(Default)]
struct Tables {
    animes: BTreeMap<i32, Anime>,
    next_anime_id: i32,
    users: BTreeMap<String, Credential>,
    next_user_id: i32,
}

impl Tables {
    fn insert_anime(&mut self, name: String) -> Anime {
        self.next_anime_id += 1;
        let anime = Anime {
            id: Some(self.next_anime_id),
            name,
        };
        self.animes.insert(self.next_anime_id, anime.clone());
        anime
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| AppError::Internal("Memory store lock poisoned".to_string()))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| AppError::Internal("Memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl AnimeStore for MemoryStore {
    fn find_all(&self) -> AnimeStream<'_> {
        let rows: Vec<AppResult<Anime>> = match self.read() {
            Ok(tables) => tables.animes.values().cloned().map(Ok).collect(),
            Err(e) => vec![Err(e)],
        };
        Box::pin(tokio_stream::iter(rows))
    }

    async fn find_by_id(&self, id: i32) -> AppResult<Option<Anime>> {
        Ok(self.read()?.animes.get(&id).cloned())
    }

    async fn save(&self, anime: Anime) -> AppResult<Anime> {
        let mut tables = self.write()?;
        match anime.id {
            None => Ok(tables.insert_anime(anime.name)),
            Some(id) => match tables.animes.get_mut(&id) {
                Some(stored) => {
                    stored.name = anime.name;
                    Ok(stored.clone())
                }
                None => Err(AppError::NotFound(format!("Anime {} not found", id))),
            },
        }
    }

    async fn save_all(&self, animes: Vec<Anime>) -> AppResult<Vec<Anime>> {
        let mut tables = self.write()?;
        Ok(animes
            .into_iter()
            .map(|anime| tables.insert_anime(anime.name))
            .collect())
    }

    async fn delete_by_id(&self, id: i32) -> AppResult<bool> {
        Ok(self.write()?.animes.remove(&id).is_some())
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<Credential>> {
        Ok(self.read()?.users.get(username).cloned())
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.read()?.users.len() as i64)
    }

    async fn save(&self, credential: NewCredential) -> AppResult<Credential> {
        let mut tables = self.write()?;
        if tables.users.contains_key(&credential.username) {
            return Err(AppError::Internal(format!(
                "Duplicate username {}",
                credential.username
            )));
        }
        tables.next_user_id += 1;
        let stored = Credential {
            id: tables.next_user_id,
            username: credential.username,
            password_hash: credential.password_hash,
            roles: credential.roles,
        };
        tables.users.insert(stored.username.clone(), stored.clone());
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn assigns_increasing_ids_and_lists_in_order() {
        let store = MemoryStore::new();
        let first = AnimeStore::save(&store, Anime::new("Naruto")).await.unwrap();
        let batch = store
            .save_all(vec![Anime::new("Bleach"), Anime::new("One Piece")])
            .await
            .unwrap();

        assert_eq!(first.id, Some(1));
        assert_eq!(batch[1].id, Some(3));

        let names: Vec<String> = store
            .find_all()
            .map(|row| row.unwrap().name)
            .collect()
            .await;
        assert_eq!(names, ["Naruto", "Bleach", "One Piece"]);
    }

    #[tokio::test]
    async fn overwriting_a_missing_id_is_not_found() {
        let store = MemoryStore::new();
        let err = AnimeStore::save(&store, Anime::new("Naruto").with_id(5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(!store.delete_by_id(5).await.unwrap());
    }
}
