use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// Product
///
/// Represents a recommended product record from the `public.products` table, including
/// the embedded analytics counters. This is the primary data structure for the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Product {
    pub id: Uuid,
    // FK to public.categories.id.
    pub category_id: Uuid,
    pub name: String,
    pub brand: String,
    pub description: String,

    // Public URL of the product image in object storage.
    pub image_url: String,
    // Outbound shop links; either may be absent for a given product.
    pub coupang_url: Option<String>,
    pub naver_url: Option<String>,

    // Price in KRW. Informational only; no money arithmetic happens here.
    pub price: i64,

    // Analytics counters. Monotonically incremented by the tracking endpoint,
    // never decremented or reset by this code.
    pub view_count: i64,
    pub coupang_clicks: i64,
    pub naver_clicks: i64,
    // Aggregate of outbound clicks (coupang + naver). Views are not clicks.
    pub total_clicks: i64,

    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// ProductCounters
///
/// The counter slice of a product row. Used by the click-tracking fallback path,
/// which reads the current values and writes back the incremented ones.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct ProductCounters {
    pub view_count: i64,
    pub coupang_clicks: i64,
    pub naver_clicks: i64,
    pub total_clicks: i64,
}

/// Category
///
/// A catalog category from the `public.categories` table. `sort_order` drives the
/// display order on the site.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub sort_order: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Comment
///
/// A comment record from the `public.comments` table. Comments are anonymous and
/// password-owned: the stored Argon2 hash of the owner password is intentionally
/// absent from this struct so it can never leak into an API payload. The
/// authorization path fetches it separately via the repository.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Comment {
    // BigInt (i64) primary key due to the high volume potential.
    pub id: i64,
    pub product_id: Uuid,
    pub author: String,
    pub content: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// CarouselItem
///
/// A home-page carousel entry from the `public.carousel_items` table, pointing at a
/// product with its own display image and title.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct CarouselItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub title: String,
    pub image_url: String,
    pub sort_order: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// SiteSettings
///
/// The persisted single-row site configuration (`public.site_settings`, id = 1).
/// Lives in the database rather than process memory so toggles survive restarts
/// and scale-out.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct SiteSettings {
    pub carousel_enabled: bool,
    pub banner_text: Option<String>,
    pub banner_enabled: bool,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// CreateProductRequest
///
/// Input payload for creating a product (POST /admin/products). The image URL is
/// provided here after the admin completes the upload flow.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateProductRequest {
    pub category_id: Uuid,
    pub name: String,
    pub brand: String,
    pub description: String,
    pub image_url: String,
    pub coupang_url: Option<String>,
    pub naver_url: Option<String>,
    pub price: i64,
}

/// UpdateProductRequest
///
/// Partial update payload for modifying an existing product (PUT /admin/products/{id}).
/// Uses `Option<T>` for all fields and `#[serde(skip_serializing_if = "Option::is_none")]`
/// so only provided fields are touched.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateProductRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupang_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub naver_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
}

/// CreateCategoryRequest
///
/// Input payload for creating a category.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub sort_order: i32,
}

/// UpdateCategoryRequest
///
/// Partial update payload for a category.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCategoryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
}

/// CreateCommentRequest
///
/// Input payload for posting a new comment. The plaintext password is hashed on
/// arrival and never persisted or logged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCommentRequest {
    pub author: String,
    pub content: String,
    pub password: String,
}

/// DeleteCommentRequest
///
/// Input payload for the non-admin comment deletion path. The admin path omits the
/// body entirely; the owner path must carry the plaintext password for verification.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DeleteCommentRequest {
    pub password: Option<String>,
}

/// CreateCarouselItemRequest
///
/// Input payload for adding a carousel entry.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCarouselItemRequest {
    pub product_id: Uuid,
    pub title: String,
    pub image_url: String,
    pub sort_order: i32,
}

/// UpdateCarouselItemRequest
///
/// Partial update payload for a carousel entry.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCarouselItemRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
}

/// UpdateSettingsRequest
///
/// Partial update payload for the persisted site settings (carousel toggle, banner).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateSettingsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carousel_enabled: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_enabled: Option<bool>,
}

// --- Auth Payloads ---

/// AdminLoginRequest
///
/// Input payload for the back-office login endpoint (POST /auth/login).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminLoginRequest {
    pub password: String,
}

/// SessionStatus
///
/// Output schema for the session check endpoint (GET /auth/session).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SessionStatus {
    pub authenticated: bool,
}

// --- Upload & Tracking Payloads ---

/// UploadResponse
///
/// Output schema of the image upload endpoint: the public URL of the stored object.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UploadResponse {
    pub url: String,
}

/// BannerResponse
///
/// Output schema of the public banner endpoint, trimmed from the full settings row.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct BannerResponse {
    pub enabled: bool,
    pub text: Option<String>,
}

/// TrackClickRequest
///
/// Input payload for the click-tracking endpoint (POST /products/{id}/track).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TrackClickRequest {
    pub kind: crate::analytics::CounterKind,
}
