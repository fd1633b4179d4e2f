//! OpenAPI documentation

use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{animes, health, login};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Anime API",
        version = "1.0.0",
        description = "Anime catalog REST API"
    ),
    paths(
        // Health
        health::health_check,
        // Auth
        login::login_page,
        login::login,
        login::logout,
        // Animes
        animes::find_all,
        animes::find_by_id,
        animes::save,
        animes::save_batch,
        animes::update,
        animes::delete,
    ),
    components(
        schemas(
            crate::models::anime::Anime,
            login::LoginForm,
            health::HealthResponse,
            crate::error::ErrorBody,
        )
    ),
    tags(
        (name = "health", description = "Service and catalog liveness"),
        (name = "auth", description = "Login form and session cookie"),
        (name = "animes", description = "Anime catalog management")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "basic_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Basic).build()),
        );
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
