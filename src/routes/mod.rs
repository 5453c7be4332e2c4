//! Router Module Index
//!
//! Organizes the application's routing logic into security-segregated modules.
//! Access control is applied explicitly at the module level (via Axum layers),
//! preventing accidental exposure of protected endpoints.
//!
//! Two tiers exist: anonymous visitors and the authenticated back-office admin.

/// Routes accessible to all users (anonymous): catalog reads, comment posting,
/// password-authorized comment deletion, click tracking, and the auth endpoints
/// themselves (which must be reachable without a session).
pub mod public;

/// Routes restricted to the back-office, protected by the `AdminSession`
/// extractor layer: product/category/carousel/comment management, site settings,
/// and image upload.
pub mod admin;
