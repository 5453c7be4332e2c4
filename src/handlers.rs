use crate::{
    AppState, analytics, auth,
    auth::CommentDelete,
    error::{ApiError, ApiResponse},
    models::{
        AdminLoginRequest, BannerResponse, CarouselItem, Category, Comment,
        CreateCarouselItemRequest, CreateCategoryRequest, CreateCommentRequest,
        CreateProductRequest, DeleteCommentRequest, Product, SessionStatus, SiteSettings,
        TrackClickRequest, UpdateCarouselItemRequest, UpdateCategoryRequest,
        UpdateProductRequest, UpdateSettingsRequest, UploadResponse,
    },
};
use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, header},
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

// --- Upload Constraints ---

/// Server-side cap on uploaded image size.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Image MIME types accepted by the upload endpoint.
pub const ALLOWED_IMAGE_TYPES: [&str; 4] =
    ["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Moderation view size for the admin comment list.
const RECENT_COMMENTS_LIMIT: i64 = 50;

// --- Filter Structs ---

/// ProductFilter
///
/// Accepted query parameters for the public product listing endpoint (GET /products).
/// Used by Axum's Query extractor to safely bind HTTP query parameters.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct ProductFilter {
    /// Optional filter restricting the listing to one category.
    pub category: Option<Uuid>,
    /// Optional case-insensitive search over name/brand/description.
    pub search: Option<String>,
}

// --- Public Handlers: Catalog ---

/// list_products
///
/// [Public Route] Lists products with optional category filtering and search.
#[utoipa::path(
    get,
    path = "/products",
    params(ProductFilter),
    responses((status = 200, description = "Filtered product list", body = [Product]))
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<ApiResponse<Vec<Product>>>, ApiError> {
    let products = state
        .repo
        .list_products(filter.category, filter.search)
        .await?;
    Ok(Json(ApiResponse::ok(products)))
}

/// get_product
///
/// [Public Route] Retrieves a single product's details by ID.
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses((status = 200, description = "Found", body = Product))
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    match state.repo.get_product(id).await? {
        Some(product) => Ok(Json(ApiResponse::ok(product))),
        None => Err(ApiError::NotFound),
    }
}

/// list_categories
///
/// [Public Route] Lists all catalog categories in display order.
#[utoipa::path(
    get,
    path = "/categories",
    responses((status = 200, description = "Categories", body = [Category]))
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Category>>>, ApiError> {
    let categories = state.repo.list_categories().await?;
    Ok(Json(ApiResponse::ok(categories)))
}

// --- Public Handlers: Comments ---

/// list_comments
///
/// [Public Route] Retrieves all comments for a given product, newest first.
#[utoipa::path(
    get,
    path = "/products/{id}/comments",
    responses((status = 200, description = "Comments", body = [Comment]))
)]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Comment>>>, ApiError> {
    let comments = state.repo.list_comments(product_id).await?;
    Ok(Json(ApiResponse::ok(comments)))
}

/// create_comment
///
/// [Public Route] Posts a new anonymous comment on a product. The caller supplies an
/// owner password; only its Argon2 hash is stored, and knowing the plaintext is what
/// entitles the caller to delete the comment later.
#[utoipa::path(
    post,
    path = "/products/{id}/comments",
    request_body = CreateCommentRequest,
    responses(
        (status = 200, description = "Comment added", body = Comment),
        (status = 400, description = "Missing fields"),
        (status = 404, description = "Unknown product")
    )
)]
pub async fn create_comment(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<Json<ApiResponse<Comment>>, ApiError> {
    if payload.author.trim().is_empty() {
        return Err(ApiError::validation("author is required"));
    }
    if payload.content.trim().is_empty() {
        return Err(ApiError::validation("content is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("password is required"));
    }

    if state.repo.get_product(product_id).await?.is_none() {
        return Err(ApiError::NotFound);
    }

    let password_hash = auth::hash_password(&payload.password)?;
    let comment = state
        .repo
        .create_comment(product_id, payload, password_hash)
        .await?;
    Ok(Json(ApiResponse::ok(comment)))
}

/// delete_comment
///
/// [Public Route] Deletes a comment through the unified authorization capability:
/// an admin session deletes without a password; an anonymous caller must re-submit
/// the owner password for hash verification.
///
/// Ordering matters here: an empty owner password is rejected before any lookup, and
/// a missing comment 404s independently of password correctness.
#[utoipa::path(
    delete,
    path = "/comments/{id}",
    params(("id" = i64, Path, description = "Comment ID")),
    request_body = DeleteCommentRequest,
    responses(
        (status = 200, description = "Deleted"),
        (status = 401, description = "Wrong password"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    payload: Option<Json<DeleteCommentRequest>>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    // Resolve the capability: a verified admin session wins, otherwise the caller is
    // on the owner-password path.
    let capability = match auth::session_from_headers(&headers, &state.config) {
        Some(_) => CommentDelete::Admin,
        None => {
            let password = payload
                .and_then(|Json(body)| body.password)
                .unwrap_or_default();
            if password.is_empty() {
                // Rejected before any hashing or lookup happens.
                return Err(ApiError::validation("password is required"));
            }
            CommentDelete::Owner { password }
        }
    };

    let stored_hash = state
        .repo
        .get_comment_password_hash(id)
        .await?
        .ok_or(ApiError::NotFound)?;

    capability.authorize(&stored_hash)?;

    if state.repo.delete_comment(id).await? {
        // Audit line distinguishing admin deletes from owner deletes.
        tracing::info!(comment_id = id, strategy = capability.strategy(), "comment deleted");
        Ok(Json(ApiResponse::ok(())))
    } else {
        // Deleted concurrently between the hash fetch and the delete.
        Err(ApiError::NotFound)
    }
}

// --- Public Handlers: Analytics ---

/// track_click
///
/// [Public Route] Records one analytics increment (view / coupang / naver) for a
/// product. Atomic increment preferred; non-transactional fallback tolerated.
#[utoipa::path(
    post,
    path = "/products/{id}/track",
    request_body = TrackClickRequest,
    responses(
        (status = 200, description = "Recorded"),
        (status = 404, description = "Unknown product")
    )
)]
pub async fn track_click(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<TrackClickRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    analytics::record_click(state.repo.as_ref(), product_id, payload.kind).await?;
    Ok(Json(ApiResponse::ok(())))
}

// --- Public Handlers: Carousel & Banner ---

/// get_carousel
///
/// [Public Route] Lists the home-page carousel entries. While the carousel is
/// disabled in the persisted site settings, this returns an empty list rather than
/// an error, so the frontend needs no special case.
#[utoipa::path(
    get,
    path = "/carousel",
    responses((status = 200, description = "Carousel items", body = [CarouselItem]))
)]
pub async fn get_carousel(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CarouselItem>>>, ApiError> {
    let settings = state.repo.get_settings().await?;
    if !settings.carousel_enabled {
        return Ok(Json(ApiResponse::ok(vec![])));
    }
    let items = state.repo.list_carousel().await?;
    Ok(Json(ApiResponse::ok(items)))
}

/// get_banner
///
/// [Public Route] Retrieves the site banner state from the persisted settings.
#[utoipa::path(
    get,
    path = "/banner",
    responses((status = 200, description = "Banner", body = BannerResponse))
)]
pub async fn get_banner(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BannerResponse>>, ApiError> {
    let settings = state.repo.get_settings().await?;
    Ok(Json(ApiResponse::ok(BannerResponse {
        enabled: settings.banner_enabled,
        text: settings.banner_text,
    })))
}

// --- Auth Handlers ---

/// admin_login
///
/// [Public Route] Creates an admin session. The submitted password is verified
/// against the configured Argon2 hash; success issues a signed, expiring session
/// token in an HttpOnly cookie.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Session created", body = SessionStatus),
        (status = 401, description = "Wrong password")
    )
)]
pub async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.password.is_empty() {
        return Err(ApiError::validation("password is required"));
    }
    if !auth::verify_password(&payload.password, &state.config.admin_password_hash) {
        return Err(ApiError::Unauthorized);
    }

    let token = auth::issue_session_token(&state.config)?;
    tracing::info!("admin session created");

    Ok((
        [(header::SET_COOKIE, auth::session_set_cookie(&token))],
        Json(ApiResponse::ok(SessionStatus {
            authenticated: true,
        })),
    ))
}

/// admin_logout
///
/// [Public Route] Deletes the admin session by clearing the cookie. There is no
/// server-side session record to revoke.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 200, description = "Session cleared", body = SessionStatus))
)]
pub async fn admin_logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, auth::session_clear_cookie())],
        Json(ApiResponse::ok(SessionStatus {
            authenticated: false,
        })),
    )
}

/// session_check
///
/// [Public Route] Reports whether the request carries a currently valid admin
/// session. Never rejects; the back-office uses it to decide whether to show the
/// login screen.
#[utoipa::path(
    get,
    path = "/auth/session",
    responses((status = 200, description = "Session status", body = SessionStatus))
)]
pub async fn session_check(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<ApiResponse<SessionStatus>> {
    let authenticated = auth::session_from_headers(&headers, &state.config).is_some();
    Json(ApiResponse::ok(SessionStatus { authenticated }))
}

// --- Admin Handlers: Products ---

/// create_product
///
/// [Admin Route] Creates a product. Counters start at zero.
#[utoipa::path(
    post,
    path = "/admin/products",
    request_body = CreateProductRequest,
    responses((status = 200, description = "Created", body = Product))
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("name is required"));
    }
    let product = state.repo.create_product(payload).await?;
    Ok(Json(ApiResponse::ok(product)))
}

/// update_product
///
/// [Admin Route] Partially updates a product; only provided fields are touched.
#[utoipa::path(
    put,
    path = "/admin/products/{id}",
    request_body = UpdateProductRequest,
    responses((status = 200, description = "Updated", body = Product))
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    match state.repo.update_product(id, payload).await? {
        Some(product) => Ok(Json(ApiResponse::ok(product))),
        None => Err(ApiError::NotFound),
    }
}

/// delete_product
///
/// [Admin Route] Removes a product from the catalog.
#[utoipa::path(
    delete,
    path = "/admin/products/{id}",
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if state.repo.delete_product(id).await? {
        Ok(Json(ApiResponse::ok(())))
    } else {
        Err(ApiError::NotFound)
    }
}

// --- Admin Handlers: Categories ---

/// create_category
///
/// [Admin Route] Creates a catalog category.
#[utoipa::path(
    post,
    path = "/admin/categories",
    request_body = CreateCategoryRequest,
    responses((status = 200, description = "Created", body = Category))
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("name is required"));
    }
    let category = state.repo.create_category(payload).await?;
    Ok(Json(ApiResponse::ok(category)))
}

/// update_category
///
/// [Admin Route] Partially updates a category.
#[utoipa::path(
    put,
    path = "/admin/categories/{id}",
    request_body = UpdateCategoryRequest,
    responses((status = 200, description = "Updated", body = Category))
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    match state.repo.update_category(id, payload).await? {
        Some(category) => Ok(Json(ApiResponse::ok(category))),
        None => Err(ApiError::NotFound),
    }
}

/// delete_category
///
/// [Admin Route] Removes a category.
#[utoipa::path(
    delete,
    path = "/admin/categories/{id}",
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if state.repo.delete_category(id).await? {
        Ok(Json(ApiResponse::ok(())))
    } else {
        Err(ApiError::NotFound)
    }
}

// --- Admin Handlers: Carousel & Settings ---

/// create_carousel_item
///
/// [Admin Route] Adds a home-page carousel entry.
#[utoipa::path(
    post,
    path = "/admin/carousel",
    request_body = CreateCarouselItemRequest,
    responses((status = 200, description = "Created", body = CarouselItem))
)]
pub async fn create_carousel_item(
    State(state): State<AppState>,
    Json(payload): Json<CreateCarouselItemRequest>,
) -> Result<Json<ApiResponse<CarouselItem>>, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::validation("title is required"));
    }
    let item = state.repo.create_carousel_item(payload).await?;
    Ok(Json(ApiResponse::ok(item)))
}

/// update_carousel_item
///
/// [Admin Route] Partially updates a carousel entry.
#[utoipa::path(
    put,
    path = "/admin/carousel/{id}",
    request_body = UpdateCarouselItemRequest,
    responses((status = 200, description = "Updated", body = CarouselItem))
)]
pub async fn update_carousel_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCarouselItemRequest>,
) -> Result<Json<ApiResponse<CarouselItem>>, ApiError> {
    match state.repo.update_carousel_item(id, payload).await? {
        Some(item) => Ok(Json(ApiResponse::ok(item))),
        None => Err(ApiError::NotFound),
    }
}

/// delete_carousel_item
///
/// [Admin Route] Removes a carousel entry.
#[utoipa::path(
    delete,
    path = "/admin/carousel/{id}",
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_carousel_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if state.repo.delete_carousel_item(id).await? {
        Ok(Json(ApiResponse::ok(())))
    } else {
        Err(ApiError::NotFound)
    }
}

/// list_recent_comments
///
/// [Admin Route] Moderation view: the newest comments across all products.
#[utoipa::path(
    get,
    path = "/admin/comments",
    responses((status = 200, description = "Recent comments", body = [Comment]))
)]
pub async fn list_recent_comments(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Comment>>>, ApiError> {
    let comments = state.repo.list_recent_comments(RECENT_COMMENTS_LIMIT).await?;
    Ok(Json(ApiResponse::ok(comments)))
}

/// update_settings
///
/// [Admin Route] Updates the persisted site settings (carousel toggle, banner).
/// The settings live in the database, not process memory, so they survive restarts.
#[utoipa::path(
    put,
    path = "/admin/settings",
    request_body = UpdateSettingsRequest,
    responses((status = 200, description = "Updated", body = SiteSettings))
)]
pub async fn update_settings(
    State(state): State<AppState>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<Json<ApiResponse<SiteSettings>>, ApiError> {
    let settings = state.repo.update_settings(payload).await?;
    Ok(Json(ApiResponse::ok(settings)))
}

// --- Admin Handlers: Upload ---

/// upload_image
///
/// [Admin Route] Accepts a multipart image upload, validates MIME type and the 5 MB
/// size cap, stores the object under a fresh UUID key, and returns its public URL.
#[utoipa::path(
    post,
    path = "/admin/upload",
    responses(
        (status = 200, description = "Stored", body = UploadResponse),
        (status = 400, description = "Not an image or too large")
    )
)]
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadResponse>>, ApiError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("malformed multipart body: {e}")))?
        .ok_or_else(|| ApiError::validation("missing file field"))?;

    let file_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field
        .content_type()
        .map(str::to_string)
        .ok_or_else(|| ApiError::validation("missing content type"))?;

    if !ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
        return Err(ApiError::validation("only image uploads are allowed"));
    }

    let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::validation(format!("failed to read upload: {e}")))?;

    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ApiError::validation("image exceeds the 5MB limit"));
    }

    // Unique, structured object key (e.g. 'products/UUID.png').
    let extension = std::path::Path::new(&file_name)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("bin");
    let object_key = format!("products/{}.{}", Uuid::new_v4(), extension);

    match state
        .storage
        .upload(&object_key, &content_type, bytes.to_vec())
        .await
    {
        Ok(url) => Ok(Json(ApiResponse::ok(UploadResponse { url }))),
        Err(e) => {
            // Log the underlying storage error but return a generic internal error.
            tracing::error!("storage error: {}", e);
            Err(ApiError::Internal("storage upload failed".to_string()))
        }
    }
}
