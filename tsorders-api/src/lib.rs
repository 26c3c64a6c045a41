use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod error;
pub mod extract;
pub mod health;
pub mod ledger;
pub mod middleware;
pub mod orders;
pub mod registration;
pub mod responses;
pub mod shipments;
pub mod state;
pub mod tokens;

pub use state::AppState;

fn cors(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .merge(auth::session_routes())
        .merge(orders::routes())
        .merge(shipments::routes())
        .merge(registration::routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_session,
        ));

    let mut router = Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected);
    if state.info.debug {
        router = router.layer(axum::middleware::from_fn(error::expose_error_detail));
    }

    router
        .layer(cors(&state.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
