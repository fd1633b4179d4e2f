//! Anime catalog service

use std::sync::Arc;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::Anime,
    repository::{AnimeStore, AnimeStream},
};

#[derive(Clone)]
pub struct AnimeService {
    store: Arc<dyn AnimeStore>,
}

impl AnimeService {
    pub fn new(store: Arc<dyn AnimeStore>) -> Self {
        Self { store }
    }

    /// Every stored anime, lazily, in store order
    pub fn find_all(&self) -> AnimeStream<'_> {
        self.store.find_all()
    }

    pub async fn find_by_id(&self, id: i32) -> AppResult<Anime> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(not_found)
    }

    /// Persist a new anime. Any id sent by the client is discarded.
    pub async fn save(&self, anime: Anime) -> AppResult<Anime> {
        anime.validate()?;
        let saved = self.store.save(anime.without_id()).await?;
        tracing::info!(id = ?saved.id, name = %saved.name, "Anime created");
        Ok(saved)
    }

    /// Persist a batch atomically: either every item is stored or none is.
    pub async fn save_all(&self, animes: Vec<Anime>) -> AppResult<Vec<Anime>> {
        for (index, anime) in animes.iter().enumerate() {
            anime.validate().map_err(|e| {
                AppError::Validation(format!("Batch aborted at item {}: {}", index, e))
            })?;
        }

        let batch = animes.into_iter().map(Anime::without_id).collect();
        let saved = self.store.save_all(batch).await?;
        tracing::info!(count = saved.len(), "Anime batch created");
        Ok(saved)
    }

    /// Replace the name of the anime at `id`, keeping its id
    pub async fn update(&self, id: i32, anime: Anime) -> AppResult<()> {
        anime.validate()?;
        let existing = self.find_by_id(id).await?;
        self.store.save(existing.with_name(anime.name)).await?;
        tracing::info!(id, "Anime updated");
        Ok(())
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let existing = self.find_by_id(id).await?;
        if !self.store.delete(&existing).await? {
            return Err(not_found());
        }
        tracing::info!(id, "Anime deleted");
        Ok(())
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Anime not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::MemoryStore;
    use tokio_stream::StreamExt;

    fn service() -> AnimeService {
        AnimeService::new(Arc::new(MemoryStore::new()))
    }

    async fn all(service: &AnimeService) -> Vec<Anime> {
        service
            .find_all()
            .collect::<AppResult<Vec<_>>>()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn find_all_on_empty_store_is_empty() {
        assert!(all(&service()).await.is_empty());
    }

    #[tokio::test]
    async fn saved_anime_can_be_found_by_id() {
        let service = service();
        let saved = service.save(Anime::new("Dragon Ball")).await.unwrap();
        let id = saved.id.expect("id assigned");

        let found = service.find_by_id(id).await.unwrap();
        assert_eq!(found.name, "Dragon Ball");
    }

    #[tokio::test]
    async fn save_discards_client_supplied_id() {
        let service = service();
        let saved = service
            .save(Anime::new("Dragon Ball").with_id(42))
            .await
            .unwrap();
        assert_eq!(saved.id, Some(1));
    }

    #[tokio::test]
    async fn save_rejects_empty_name_before_the_store() {
        let service = service();
        let err = service.save(Anime::new("")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(all(&service).await.is_empty());
    }

    #[tokio::test]
    async fn batch_with_one_blank_name_persists_nothing() {
        let service = service();
        let err = service
            .save_all(vec![
                Anime::new("Dragon Ball"),
                Anime::new(" "),
                Anime::new("Naruto"),
            ])
            .await
            .unwrap_err();

        match err {
            AppError::Validation(msg) => assert!(msg.contains("item 1"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(all(&service).await.is_empty());
    }

    #[tokio::test]
    async fn batch_saves_every_item_in_order() {
        let service = service();
        let saved = service
            .save_all(vec![Anime::new("Dragon Ball"), Anime::new("Naruto")])
            .await
            .unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(all(&service).await, saved);
    }

    #[tokio::test]
    async fn update_preserves_id_and_replaces_name() {
        let service = service();
        let id = service.save(Anime::new("Dragon Ball")).await.unwrap().id.unwrap();

        service
            .update(id, Anime::new("Dragon Ball 2").with_id(999))
            .await
            .unwrap();

        let found = service.find_by_id(id).await.unwrap();
        assert_eq!(found, Anime::new("Dragon Ball 2").with_id(id));
        assert!(service.find_by_id(999).await.is_err());
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let service = service();
        assert!(matches!(service.find_by_id(99).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            service.update(99, Anime::new("Naruto")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(service.delete(99).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_removes_the_record() {
        let service = service();
        let id = service.save(Anime::new("Dragon Ball")).await.unwrap().id.unwrap();
        service.delete(id).await.unwrap();
        assert!(matches!(service.find_by_id(id).await, Err(AppError::NotFound(_))));
    }
}
