//! API handlers and router assembly

pub mod animes;
pub mod extract;
pub mod health;
pub mod login;
pub mod openapi;

use axum::{
    http::{Method, Uri},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::AppError,
    middleware::{enforce_access_policy, normalize_errors},
    AppState,
};

/// Create the application router with all routes and middleware
///
/// Layers, from outermost: CORS, tracing, error normalizer, panic catcher,
/// access policy.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/login", get(login::login_page).post(login::login))
        .route("/logout", post(login::logout))
        .route("/animes", get(animes::find_all).post(animes::save))
        .route("/animes/batch", post(animes::save_batch))
        .route(
            "/animes/:id",
            get(animes::find_by_id)
                .put(animes::update)
                .delete(animes::delete),
        )
        .with_state(state.clone());

    Router::new()
        .merge(routes)
        .merge(openapi::create_openapi_router())
        .fallback(no_route)
        .layer(from_fn_with_state(state, enforce_access_policy))
        .layer(CatchPanicLayer::new())
        .layer(from_fn(normalize_errors))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn no_route(method: Method, uri: Uri) -> AppError {
    AppError::NotFound(format!("No handler found for {} {}", method, uri.path()))
}
