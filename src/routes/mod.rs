pub mod health;
pub mod history;
pub mod login;
pub mod register;
pub mod user;
pub mod validation;

pub use health::health_check;
pub use history::{
    clear_annotations, clear_searches, list_annotations, list_searches, record_annotation,
    record_search,
};
pub use login::login_user;
pub use register::register_user;
pub use user::{delete_user, get_user, update_user};

use axum::http::header::{HeaderName, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::AppState;

const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");
const X_HTTP_METHOD_OVERRIDE: HeaderName = HeaderName::from_static("x-http-method-override");

/// CORS for the browser extension and web clients
///
/// Credentialed requests forbid the wildcard origin, so the layer mirrors
/// whatever origin the request carries.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::PUT, Method::POST, Method::DELETE])
        .allow_headers([
            X_REQUESTED_WITH,
            X_HTTP_METHOD_OVERRIDE,
            CONTENT_TYPE,
            ACCEPT,
            AUTHORIZATION,
        ])
        .expose_headers([
            X_REQUESTED_WITH,
            X_HTTP_METHOD_OVERRIDE,
            CONTENT_TYPE,
            ACCEPT,
            AUTHORIZATION,
        ])
}

/// Build the application router
///
/// The binary and the integration tests both serve exactly this, so every
/// route sits behind the same CORS layer in both.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/users", post(register_user))
        .route("/users/login", post(login_user))
        .route(
            "/user/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route(
            "/user/:id/searches",
            get(list_searches).post(record_search).delete(clear_searches),
        )
        .route(
            "/user/:id/annotations",
            get(list_annotations)
                .post(record_annotation)
                .delete(clear_annotations),
        )
        .layer(cors_layer())
        .with_state(state)
}
