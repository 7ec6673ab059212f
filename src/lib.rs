use axum::{Router, extract::FromRef, http::HeaderName};
use std::sync::Arc;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;

// Routing split by access level (public, protected).
pub mod routes;
use routes::{protected, public};

// --- Public Re-exports ---

pub use auth::{AuthGate, GateState};
pub use config::AppConfig;
pub use error::ApiError;
pub use repository::{RepositoryState, SqliteRepository};

/// ApiDoc
///
/// Aggregates the `#[utoipa::path]` handlers and `ToSchema` models into the OpenAPI
/// document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_drinks, handlers::get_drinks_detail, handlers::create_drink,
        handlers::update_drink, handlers::delete_drink
    ),
    components(
        schemas(
            models::Drink, models::DrinkShort, models::Ingredient, models::IngredientShort,
            models::RecipeInput, models::CreateDrinkRequest, models::UpdateDrinkRequest,
            models::DrinkSummaryResponse, models::DrinkDetailResponse,
            models::DeleteDrinkResponse, models::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "drinks", description = "Coffee shop drink menu API")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by the protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// AppState
///
/// The single, cloneable container of everything a request may need. Shared by every
/// route; handlers pull individual parts through `FromRef`.
#[derive(Clone)]
pub struct AppState {
    /// Persistence behind the `Repository` trait.
    pub repo: RepositoryState,
    /// Authorization gate, owning the signing key cache.
    pub gate: GateState,
    pub config: AppConfig,
}

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for GateState {
    fn from_ref(app_state: &AppState) -> GateState {
        app_state.gate.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// build_gate
///
/// Wires the authorization chain for `config`: an empty key cache over `source`, a
/// verifier expecting the configured issuer and audience, and the gate around it.
pub fn build_gate(config: &AppConfig, source: Arc<dyn auth::KeySetSource>) -> GateState {
    let keys = auth::KeyStore::new(source, config.jwks_timeout);
    let verifier = auth::CredentialVerifier::new(keys, &config.issuer(), &config.api_audience);
    Arc::new(AuthGate::new(verifier))
}

/// create_router
///
/// Assembles the routing structure, applies global and per-route middleware, and
/// registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS: any origin, method and header.
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Routes. Protected routes carry their gate layers individually, so the two
    //    routers can share paths.
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(protected::protected_routes(&state.gate))
        .fallback(handlers::not_found)
        // Must follow every merge: it only reaches routes already registered.
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .with_state(state);

    // 3. Observability: request id, tracing span, id propagation back to the client.
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the `http_request` span for `TraceLayer`, tagging it with the request id so
/// every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
