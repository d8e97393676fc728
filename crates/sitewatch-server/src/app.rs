use crate::state::AppState;
use crate::{api, identity, logging};
use axum::middleware;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "sitewatch API",
        description = "Construction-site safety alert engine REST API",
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Rules", description = "Alert rule management"),
        (name = "Alerts", description = "Alert lifecycle and history")
    )
)]
struct ApiDoc;

pub fn build_http_app(state: AppState) -> Router {
    let (router, spec) = api::api_routes().split_for_parts();

    let mut merged_spec = ApiDoc::openapi();
    merged_spec.merge(spec);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .layer(middleware::from_fn(identity::identity_middleware))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/v1/openapi.json", merged_spec))
        .layer(cors)
        .layer(middleware::from_fn(logging::request_logging))
}
