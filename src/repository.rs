use crate::analytics::CounterKind;
use crate::error::RepoError;
use crate::models::{
    CarouselItem, Category, Comment, CreateCarouselItemRequest, CreateCategoryRequest,
    CreateCommentRequest, CreateProductRequest, Product, ProductCounters, SiteSettings,
    UpdateCarouselItemRequest, UpdateCategoryRequest, UpdateProductRequest,
    UpdateSettingsRequest,
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. This is the core of
/// the Repository Abstraction pattern, allowing the handlers to interact with the data
/// layer without knowing the specific implementation (Postgres, in-memory, etc.).
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's asynchronous task boundaries.
///
/// All methods surface data-store failures as `RepoError` so the handler boundary can
/// translate them into 500 responses; deletes follow the `rows_affected > 0` contract
/// (Ok(false) means the row did not exist).
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Products ---
    // Public listing with optional category filter and case-insensitive search.
    async fn list_products(
        &self,
        category_id: Option<Uuid>,
        search: Option<String>,
    ) -> Result<Vec<Product>, RepoError>;
    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, RepoError>;
    async fn create_product(&self, req: CreateProductRequest) -> Result<Product, RepoError>;
    // Partial update via COALESCE; None when the product does not exist.
    async fn update_product(
        &self,
        id: Uuid,
        req: UpdateProductRequest,
    ) -> Result<Option<Product>, RepoError>;
    async fn delete_product(&self, id: Uuid) -> Result<bool, RepoError>;

    // --- Categories ---
    async fn list_categories(&self) -> Result<Vec<Category>, RepoError>;
    async fn create_category(&self, req: CreateCategoryRequest) -> Result<Category, RepoError>;
    async fn update_category(
        &self,
        id: Uuid,
        req: UpdateCategoryRequest,
    ) -> Result<Option<Category>, RepoError>;
    async fn delete_category(&self, id: Uuid) -> Result<bool, RepoError>;

    // --- Comments ---
    async fn list_comments(&self, product_id: Uuid) -> Result<Vec<Comment>, RepoError>;
    // Moderation view: newest comments across all products.
    async fn list_recent_comments(&self, limit: i64) -> Result<Vec<Comment>, RepoError>;
    // The plaintext password never reaches this layer; handlers hash it first.
    async fn create_comment(
        &self,
        product_id: Uuid,
        req: CreateCommentRequest,
        password_hash: String,
    ) -> Result<Comment, RepoError>;
    /// Fetches only the stored owner-password hash. This is the single path by which
    /// the hash leaves the database; it never rides along on a Comment payload.
    async fn get_comment_password_hash(&self, id: i64) -> Result<Option<String>, RepoError>;
    async fn delete_comment(&self, id: i64) -> Result<bool, RepoError>;

    // --- Counters ---
    /// Primary path: atomic server-side increment via the `increment_product_counter`
    /// procedure. Ok(true) = incremented, Ok(false) = product not found,
    /// Err = the procedure failed (callers fall back to read-modify-write).
    async fn increment_counter_atomic(
        &self,
        product_id: Uuid,
        kind: CounterKind,
    ) -> Result<bool, RepoError>;
    async fn get_counters(&self, product_id: Uuid) -> Result<Option<ProductCounters>, RepoError>;
    async fn put_counters(
        &self,
        product_id: Uuid,
        counters: ProductCounters,
    ) -> Result<bool, RepoError>;

    // --- Carousel ---
    async fn list_carousel(&self) -> Result<Vec<CarouselItem>, RepoError>;
    async fn create_carousel_item(
        &self,
        req: CreateCarouselItemRequest,
    ) -> Result<CarouselItem, RepoError>;
    async fn update_carousel_item(
        &self,
        id: Uuid,
        req: UpdateCarouselItemRequest,
    ) -> Result<Option<CarouselItem>, RepoError>;
    async fn delete_carousel_item(&self, id: Uuid) -> Result<bool, RepoError>;

    // --- Site Settings ---
    // The persisted single-row config entry (id = 1). Missing row reads as defaults.
    async fn get_settings(&self) -> Result<SiteSettings, RepoError>;
    async fn update_settings(
        &self,
        req: UpdateSettingsRequest,
    ) -> Result<SiteSettings, RepoError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the PostgreSQL
/// database. Queries use sqlx's runtime API so the crate builds without a live
/// database connection.
pub struct PostgresRepository {
    pool: PgPool,
}

const PRODUCT_COLUMNS: &str = "id, category_id, name, brand, description, image_url, \
     coupang_url, naver_url, price, view_count, coupang_clicks, naver_clicks, \
     total_clicks, created_at, updated_at";

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// list_products
    ///
    /// Implements flexible filtering/search using QueryBuilder for safe
    /// parameterization (no SQL injection risk). Search is case-insensitive across
    /// name, brand, and description.
    async fn list_products(
        &self,
        category_id: Option<Uuid>,
        search: Option<String>,
    ) -> Result<Vec<Product>, RepoError> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE true "
        ));

        if let Some(cat) = category_id {
            builder.push(" AND category_id = ");
            builder.push_bind(cat);
        }

        if let Some(s) = search {
            let search_pattern = format!("%{}%", s);
            builder.push(" AND (name ILIKE ");
            builder.push_bind(search_pattern.clone());
            builder.push(" OR brand ILIKE ");
            builder.push_bind(search_pattern.clone());
            builder.push(" OR description ILIKE ");
            builder.push_bind(search_pattern);
            builder.push(")");
        }

        builder.push(" ORDER BY created_at DESC");

        let products = builder
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, RepoError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    /// create_product
    ///
    /// Inserts a new product with all counters starting at zero.
    async fn create_product(&self, req: CreateProductRequest) -> Result<Product, RepoError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products \
                 (id, category_id, name, brand, description, image_url, coupang_url, \
                  naver_url, price, view_count, coupang_clicks, naver_clicks, \
                  total_clicks, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0, 0, 0, 0, NOW(), NOW()) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(req.category_id)
        .bind(req.name)
        .bind(req.brand)
        .bind(req.description)
        .bind(req.image_url)
        .bind(req.coupang_url)
        .bind(req.naver_url)
        .bind(req.price)
        .fetch_one(&self.pool)
        .await?;
        Ok(product)
    }

    /// update_product
    ///
    /// Uses the PostgreSQL COALESCE function to handle `Option<T>` fields, only
    /// touching a column if the corresponding field in `req` is `Some`.
    async fn update_product(
        &self,
        id: Uuid,
        req: UpdateProductRequest,
    ) -> Result<Option<Product>, RepoError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET \
                 category_id = COALESCE($2, category_id), \
                 name = COALESCE($3, name), \
                 brand = COALESCE($4, brand), \
                 description = COALESCE($5, description), \
                 image_url = COALESCE($6, image_url), \
                 coupang_url = COALESCE($7, coupang_url), \
                 naver_url = COALESCE($8, naver_url), \
                 price = COALESCE($9, price), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(req.category_id)
        .bind(req.name)
        .bind(req.brand)
        .bind(req.description)
        .bind(req.image_url)
        .bind(req.coupang_url)
        .bind(req.naver_url)
        .bind(req.price)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- CATEGORIES ---

    async fn list_categories(&self) -> Result<Vec<Category>, RepoError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, sort_order, created_at FROM categories \
             ORDER BY sort_order ASC, created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    async fn create_category(&self, req: CreateCategoryRequest) -> Result<Category, RepoError> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, name, sort_order, created_at) \
             VALUES ($1, $2, $3, NOW()) \
             RETURNING id, name, sort_order, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(req.name)
        .bind(req.sort_order)
        .fetch_one(&self.pool)
        .await?;
        Ok(category)
    }

    async fn update_category(
        &self,
        id: Uuid,
        req: UpdateCategoryRequest,
    ) -> Result<Option<Category>, RepoError> {
        let category = sqlx::query_as::<_, Category>(
            "UPDATE categories SET \
                 name = COALESCE($2, name), \
                 sort_order = COALESCE($3, sort_order) \
             WHERE id = $1 \
             RETURNING id, name, sort_order, created_at",
        )
        .bind(id)
        .bind(req.name)
        .bind(req.sort_order)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- COMMENTS ---

    async fn list_comments(&self, product_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT id, product_id, author, content, created_at FROM comments \
             WHERE product_id = $1 ORDER BY created_at DESC",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    async fn list_recent_comments(&self, limit: i64) -> Result<Vec<Comment>, RepoError> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT id, product_id, author, content, created_at FROM comments \
             ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    /// create_comment
    ///
    /// Inserts a comment with its owner-password hash. The hash column is excluded
    /// from the RETURNING list on purpose.
    async fn create_comment(
        &self,
        product_id: Uuid,
        req: CreateCommentRequest,
        password_hash: String,
    ) -> Result<Comment, RepoError> {
        let comment = sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (product_id, author, content, password_hash, created_at) \
             VALUES ($1, $2, $3, $4, NOW()) \
             RETURNING id, product_id, author, content, created_at",
        )
        .bind(product_id)
        .bind(req.author)
        .bind(req.content)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn get_comment_password_hash(&self, id: i64) -> Result<Option<String>, RepoError> {
        let hash = sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(hash)
    }

    async fn delete_comment(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- COUNTERS ---

    /// increment_counter_atomic
    ///
    /// Primary analytics path: one server-side procedure call incrementing the
    /// specific counter and the aggregate total in a single statement. The procedure
    /// returns whether the product row existed.
    async fn increment_counter_atomic(
        &self,
        product_id: Uuid,
        kind: CounterKind,
    ) -> Result<bool, RepoError> {
        let found = sqlx::query_scalar::<_, bool>("SELECT increment_product_counter($1, $2)")
            .bind(product_id)
            .bind(kind.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(found)
    }

    async fn get_counters(&self, product_id: Uuid) -> Result<Option<ProductCounters>, RepoError> {
        let counters = sqlx::query_as::<_, ProductCounters>(
            "SELECT view_count, coupang_clicks, naver_clicks, total_clicks \
             FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(counters)
    }

    /// put_counters
    ///
    /// Fallback write of a full counter snapshot. Not guarded by any transaction or
    /// version check; the tracking layer tolerates lost updates here.
    async fn put_counters(
        &self,
        product_id: Uuid,
        counters: ProductCounters,
    ) -> Result<bool, RepoError> {
        let result = sqlx::query(
            "UPDATE products SET view_count = $2, coupang_clicks = $3, \
             naver_clicks = $4, total_clicks = $5 WHERE id = $1",
        )
        .bind(product_id)
        .bind(counters.view_count)
        .bind(counters.coupang_clicks)
        .bind(counters.naver_clicks)
        .bind(counters.total_clicks)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- CAROUSEL ---

    async fn list_carousel(&self) -> Result<Vec<CarouselItem>, RepoError> {
        let items = sqlx::query_as::<_, CarouselItem>(
            "SELECT id, product_id, title, image_url, sort_order, created_at \
             FROM carousel_items ORDER BY sort_order ASC, created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn create_carousel_item(
        &self,
        req: CreateCarouselItemRequest,
    ) -> Result<CarouselItem, RepoError> {
        let item = sqlx::query_as::<_, CarouselItem>(
            "INSERT INTO carousel_items (id, product_id, title, image_url, sort_order, created_at) \
             VALUES ($1, $2, $3, $4, $5, NOW()) \
             RETURNING id, product_id, title, image_url, sort_order, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(req.product_id)
        .bind(req.title)
        .bind(req.image_url)
        .bind(req.sort_order)
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    async fn update_carousel_item(
        &self,
        id: Uuid,
        req: UpdateCarouselItemRequest,
    ) -> Result<Option<CarouselItem>, RepoError> {
        let item = sqlx::query_as::<_, CarouselItem>(
            "UPDATE carousel_items SET \
                 title = COALESCE($2, title), \
                 image_url = COALESCE($3, image_url), \
                 sort_order = COALESCE($4, sort_order) \
             WHERE id = $1 \
             RETURNING id, product_id, title, image_url, sort_order, created_at",
        )
        .bind(id)
        .bind(req.title)
        .bind(req.image_url)
        .bind(req.sort_order)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    async fn delete_carousel_item(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM carousel_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- SITE SETTINGS ---

    async fn get_settings(&self) -> Result<SiteSettings, RepoError> {
        let settings = sqlx::query_as::<_, SiteSettings>(
            "SELECT carousel_enabled, banner_text, banner_enabled, updated_at \
             FROM site_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        // A fresh deployment has no settings row yet; defaults apply until the
        // back-office writes one.
        Ok(settings.unwrap_or_default())
    }

    /// update_settings
    ///
    /// Upserts the single settings row, COALESCE-merging provided fields over the
    /// stored ones.
    async fn update_settings(
        &self,
        req: UpdateSettingsRequest,
    ) -> Result<SiteSettings, RepoError> {
        let settings = sqlx::query_as::<_, SiteSettings>(
            "INSERT INTO site_settings (id, carousel_enabled, banner_text, banner_enabled, updated_at) \
             VALUES (1, COALESCE($1, false), $2, COALESCE($3, false), NOW()) \
             ON CONFLICT (id) DO UPDATE SET \
                 carousel_enabled = COALESCE($1, site_settings.carousel_enabled), \
                 banner_text = COALESCE($2, site_settings.banner_text), \
                 banner_enabled = COALESCE($3, site_settings.banner_enabled), \
                 updated_at = NOW() \
             RETURNING carousel_enabled, banner_text, banner_enabled, updated_at",
        )
        .bind(req.carousel_enabled)
        .bind(req.banner_text)
        .bind(req.banner_enabled)
        .fetch_one(&self.pool)
        .await?;
        Ok(settings)
    }
}
