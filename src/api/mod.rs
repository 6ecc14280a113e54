mod handlers;
pub mod middleware;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::client::BackendClient;
use crate::sessions::SessionStore;

pub use middleware::SecurityConfig;

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub backend: BackendClient,
}

impl AppState {
    pub fn new(sessions: SessionStore, backend: BackendClient) -> Self {
        Self { sessions, backend }
    }
}

pub fn create_router(state: AppState, security: SecurityConfig) -> Router {
    let protected = Router::new()
        // Sessions
        .route("/sessions", post(handlers::create_session))
        .route("/sessions/{id}", get(handlers::get_session))
        .route("/sessions/{id}", delete(handlers::delete_session))
        // Feature model intake
        .route("/sessions/{id}/tree", put(handlers::install_tree))
        .route("/sessions/{id}/document", post(handlers::upload_document))
        // Interaction
        .route("/sessions/{id}/toggle", post(handlers::toggle_feature))
        .route("/sessions/{id}/expand", post(handlers::toggle_expand))
        .route("/sessions/{id}/policy", put(handlers::set_policy))
        // Outputs and collaborators
        .route("/sessions/{id}/payload", get(handlers::get_payload))
        .route("/sessions/{id}/render", get(handlers::render_tree))
        .route("/sessions/{id}/validate", post(handlers::validate_selection))
        .route("/sessions/{id}/translate", post(handlers::translate))
        .route_layer(from_fn_with_state(
            security.clone(),
            middleware::auth_middleware,
        ));

    let api = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected);

    Router::new()
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::cors_layer(&security)),
        )
        .with_state(state)
}
