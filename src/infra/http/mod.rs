mod auth;
mod error;
mod handlers;
mod middleware;
mod state;

pub use auth::{ACCESS_TOKEN_COOKIE, CookieBearer, HeaderBearer};
pub use middleware::RequestContext;
pub use state::HttpState;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};

use middleware::{log_responses, set_request_context};

pub fn build_router(state: HttpState) -> Router {
    let upload_body_limit = state.upload_limit_bytes;

    Router::new()
        .route("/api/books", get(handlers::list_books))
        .route("/api/books/activate", post(handlers::activate_book))
        .route("/api/books/{id}", get(handlers::get_book))
        .route("/api/menu-book", get(handlers::list_menu_book))
        .route("/api/menu-book/{id}", get(handlers::get_menu_entry))
        .route("/api/exams/{id}", get(handlers::get_exam))
        .route("/api/questions/{id}", get(handlers::get_question))
        .route("/api/search", get(handlers::search))
        .route(
            "/api/media/upload",
            post(handlers::upload_media).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
