use crate::{AppState, handlers};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

/// Admin Router Module
///
/// Defines the back-office routes, nested under `/admin`. This entire router is
/// wrapped in a layer that runs the `AdminSession` extractor before any handler:
/// a request without a verified, unexpired session token never reaches this module.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /admin/products, PUT/DELETE /admin/products/{id}
        // Product management. Creation validates required fields; updates are partial.
        .route("/products", post(handlers::create_product))
        .route(
            "/products/{id}",
            put(handlers::update_product).delete(handlers::delete_product),
        )
        // POST /admin/categories, PUT/DELETE /admin/categories/{id}
        // Category management.
        .route("/categories", post(handlers::create_category))
        .route(
            "/categories/{id}",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        // POST /admin/carousel, PUT/DELETE /admin/carousel/{id}
        // Home-page carousel management.
        .route("/carousel", post(handlers::create_carousel_item))
        .route(
            "/carousel/{id}",
            put(handlers::update_carousel_item).delete(handlers::delete_carousel_item),
        )
        // GET /admin/comments
        // Moderation view of the newest comments across all products. Deletion goes
        // through the unified public DELETE /comments/{id} endpoint.
        .route("/comments", get(handlers::list_recent_comments))
        // PUT /admin/settings
        // Updates the persisted site settings (carousel toggle, banner).
        .route("/settings", put(handlers::update_settings))
        // POST /admin/upload
        // Multipart image upload. Axum's default body limit (2 MB) would reject
        // legal 5 MB images, so this route gets a raised limit; the handler still
        // enforces the exact 5 MB cap itself.
        .route(
            "/upload",
            post(handlers::upload_image)
                .layer(DefaultBodyLimit::max(handlers::MAX_UPLOAD_BYTES + 64 * 1024)),
        )
}
