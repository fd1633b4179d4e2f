//! Anime API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tokio_stream::StreamExt;

use super::extract::JsonBody;
use crate::{error::AppResult, models::Anime, AppState};

/// List all animes
#[utoipa::path(
    get,
    path = "/animes",
    tag = "animes",
    security(("basic_auth" = [])),
    responses(
        (status = 200, description = "Every stored anime", body = Vec<Anime>),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "USER role required", body = ErrorBody)
    )
)]
pub async fn find_all(State(state): State<AppState>) -> AppResult<Json<Vec<Anime>>> {
    let animes = state
        .services
        .animes
        .find_all()
        .collect::<AppResult<Vec<_>>>()
        .await?;
    Ok(Json(animes))
}

/// Get anime by ID
#[utoipa::path(
    get,
    path = "/animes/{id}",
    tag = "animes",
    security(("basic_auth" = [])),
    params(("id" = i32, Path, description = "Anime ID")),
    responses(
        (status = 200, description = "Anime details", body = Anime),
        (status = 404, description = "Anime not found", body = ErrorBody)
    )
)]
pub async fn find_by_id(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Anime>> {
    let anime = state.services.animes.find_by_id(id).await?;
    Ok(Json(anime))
}

/// Create anime
#[utoipa::path(
    post,
    path = "/animes",
    tag = "animes",
    security(("basic_auth" = [])),
    request_body = Anime,
    responses(
        (status = 201, description = "Anime created", body = Anime),
        (status = 400, description = "Empty name", body = ErrorBody),
        (status = 403, description = "ADMIN role required", body = ErrorBody)
    )
)]
pub async fn save(
    State(state): State<AppState>,
    JsonBody(anime): JsonBody<Anime>,
) -> AppResult<(StatusCode, Json<Anime>)> {
    let saved = state.services.animes.save(anime).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// Create several animes at once; nothing is stored if any item is invalid
#[utoipa::path(
    post,
    path = "/animes/batch",
    tag = "animes",
    security(("basic_auth" = [])),
    request_body = Vec<Anime>,
    responses(
        (status = 201, description = "Animes created", body = Vec<Anime>),
        (status = 400, description = "An item has an empty name", body = ErrorBody),
        (status = 403, description = "ADMIN role required", body = ErrorBody)
    )
)]
pub async fn save_batch(
    State(state): State<AppState>,
    JsonBody(animes): JsonBody<Vec<Anime>>,
) -> AppResult<(StatusCode, Json<Vec<Anime>>)> {
    let saved = state.services.animes.save_all(animes).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// Replace an anime's name
#[utoipa::path(
    put,
    path = "/animes/{id}",
    tag = "animes",
    security(("basic_auth" = [])),
    params(("id" = i32, Path, description = "Anime ID")),
    request_body = Anime,
    responses(
        (status = 204, description = "Anime updated"),
        (status = 400, description = "Empty name", body = ErrorBody),
        (status = 404, description = "Anime not found", body = ErrorBody)
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(anime): JsonBody<Anime>,
) -> AppResult<StatusCode> {
    state.services.animes.update(id, anime).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete anime
#[utoipa::path(
    delete,
    path = "/animes/{id}",
    tag = "animes",
    security(("basic_auth" = [])),
    params(("id" = i32, Path, description = "Anime ID")),
    responses(
        (status = 204, description = "Anime deleted"),
        (status = 404, description = "Anime not found", body = ErrorBody)
    )
)]
pub async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<StatusCode> {
    state.services.animes.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
