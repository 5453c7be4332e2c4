use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any client.
/// The catalog has no per-row visibility rules; everything here is world-readable.
/// The two write paths (comment creation and deletion) carry their own protection:
/// creation requires the caller to set an owner password, deletion requires either
/// that password or an admin session.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // GET /products?category=...&search=...
        // Lists products, supporting category filtering and case-insensitive search.
        .route("/products", get(handlers::list_products))
        // GET /products/{id}
        // Retrieves the detailed view of a single product, counters included.
        .route("/products/{id}", get(handlers::get_product))
        // GET /categories
        // Lists all catalog categories in display order.
        .route("/categories", get(handlers::list_categories))
        // GET/POST /products/{id}/comments
        // Lists or posts anonymous comments. Posting stores only the Argon2 hash of
        // the caller-supplied owner password.
        .route(
            "/products/{id}/comments",
            get(handlers::list_comments).post(handlers::create_comment),
        )
        // DELETE /comments/{id}
        // The unified deletion endpoint: owner-password or admin-session authorized.
        .route("/comments/{id}", delete(handlers::delete_comment))
        // POST /products/{id}/track
        // Records one analytics increment (view / coupang / naver).
        .route("/products/{id}/track", post(handlers::track_click))
        // GET /carousel
        // Lists carousel entries; empty while the carousel is disabled in settings.
        .route("/carousel", get(handlers::get_carousel))
        // GET /banner
        // Retrieves the site banner state.
        .route("/banner", get(handlers::get_banner))
        // --- Admin Session Lifecycle ---
        // These live in the public router because they must be reachable without a
        // session: login creates one, logout clears one, and the check endpoint
        // reports status without ever rejecting.
        .route("/auth/login", post(handlers::admin_login))
        .route("/auth/logout", post(handlers::admin_logout))
        .route("/auth/session", get(handlers::session_check))
}
