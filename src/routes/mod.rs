use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

pub mod actor;
pub mod health;
pub mod team;

/// Compose all route trees, wiring in shared state and the Swagger UI.
///
/// The UI at `/docs` serves the same OpenAPI document the `openapi-generator`
/// bin prints.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router().merge(team::router());

    let swagger: Router<SharedState> = SwaggerUi::new("/docs")
        .url("/api-doc/openapi.json", ApiDoc::openapi())
        .into();

    api_router.merge(swagger).with_state(state)
}
