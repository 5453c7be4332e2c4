#![allow(dead_code)]

use async_trait::async_trait;
use kukrule_api::{
    AppState,
    analytics::CounterKind,
    auth,
    config::AppConfig,
    error::RepoError,
    models::{
        CarouselItem, Category, Comment, CreateCarouselItemRequest, CreateCategoryRequest,
        CreateCommentRequest, CreateProductRequest, Product, ProductCounters, SiteSettings,
        UpdateCarouselItemRequest, UpdateCategoryRequest, UpdateProductRequest,
        UpdateSettingsRequest,
    },
    repository::{Repository, RepositoryState},
    storage::{MockStorageService, StorageState},
};
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};
use tokio::net::TcpListener;
use uuid::Uuid;

/// The admin password matching `AppConfig::default()`'s stored hash.
pub const TEST_ADMIN_PASSWORD: &str = "test-admin-password";

// --- In-Memory Repository ---

#[derive(Default)]
pub struct MemoryState {
    pub products: HashMap<Uuid, Product>,
    pub categories: HashMap<Uuid, Category>,
    // Comment plus its stored owner-password hash.
    pub comments: HashMap<i64, (Comment, String)>,
    pub carousel: HashMap<Uuid, CarouselItem>,
    pub settings: SiteSettings,
    pub next_comment_id: i64,
}

/// MemoryRepository
///
/// A stateful in-memory Repository implementation. It lets the integration tests
/// exercise the real router and handlers without a live Postgres, and it exposes
/// switches and call counters so tests can steer and observe the counter paths.
pub struct MemoryRepository {
    pub state: Mutex<MemoryState>,
    /// When false, the atomic increment path fails the way an undefined server-side
    /// procedure would, forcing callers onto the read-modify-write fallback.
    pub atomic_available: bool,
    pub atomic_calls: AtomicUsize,
    pub fallback_reads: AtomicUsize,
}

impl MemoryRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MemoryState::default()),
            atomic_available: true,
            atomic_calls: AtomicUsize::new(0),
            fallback_reads: AtomicUsize::new(0),
        })
    }

    /// A repository whose atomic counter procedure is "not defined on the backend".
    pub fn without_atomic_counters() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MemoryState::default()),
            atomic_available: false,
            atomic_calls: AtomicUsize::new(0),
            fallback_reads: AtomicUsize::new(0),
        })
    }

    pub fn seed_category(&self, name: &str) -> Category {
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            sort_order: 0,
            created_at: chrono::Utc::now(),
        };
        self.state
            .lock()
            .unwrap()
            .categories
            .insert(category.id, category.clone());
        category
    }

    pub fn seed_product(&self, name: &str) -> Product {
        let now = chrono::Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            name: name.to_string(),
            brand: "TestBrand".to_string(),
            description: "A seeded product".to_string(),
            image_url: "http://localhost:9000/mock-bucket/products/seed.png".to_string(),
            coupang_url: Some("https://coupang.example/item".to_string()),
            naver_url: Some("https://naver.example/item".to_string()),
            price: 12900,
            view_count: 0,
            coupang_clicks: 0,
            naver_clicks: 0,
            total_clicks: 0,
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .unwrap()
            .products
            .insert(product.id, product.clone());
        product
    }

    /// Seeds a comment whose owner password is `password` (stored hashed, as in
    /// production).
    pub fn seed_comment(&self, product_id: Uuid, password: &str) -> Comment {
        let hash = auth::hash_password(password).expect("hashing test password");
        let mut state = self.state.lock().unwrap();
        state.next_comment_id += 1;
        let comment = Comment {
            id: state.next_comment_id,
            product_id,
            author: "tester".to_string(),
            content: "seeded comment".to_string(),
            created_at: chrono::Utc::now(),
        };
        state.comments.insert(comment.id, (comment.clone(), hash));
        comment
    }

    pub fn counters_of(&self, product_id: Uuid) -> ProductCounters {
        let state = self.state.lock().unwrap();
        let product = state.products.get(&product_id).expect("seeded product");
        ProductCounters {
            view_count: product.view_count,
            coupang_clicks: product.coupang_clicks,
            naver_clicks: product.naver_clicks,
            total_clicks: product.total_clicks,
        }
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn list_products(
        &self,
        category_id: Option<Uuid>,
        search: Option<String>,
    ) -> Result<Vec<Product>, RepoError> {
        let state = self.state.lock().unwrap();
        let needle = search.map(|s| s.to_lowercase());
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| category_id.is_none_or(|c| p.category_id == c))
            .filter(|p| {
                needle.as_ref().is_none_or(|n| {
                    p.name.to_lowercase().contains(n)
                        || p.brand.to_lowercase().contains(n)
                        || p.description.to_lowercase().contains(n)
                })
            })
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, RepoError> {
        Ok(self.state.lock().unwrap().products.get(&id).cloned())
    }

    async fn create_product(&self, req: CreateProductRequest) -> Result<Product, RepoError> {
        let now = chrono::Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            category_id: req.category_id,
            name: req.name,
            brand: req.brand,
            description: req.description,
            image_url: req.image_url,
            coupang_url: req.coupang_url,
            naver_url: req.naver_url,
            price: req.price,
            view_count: 0,
            coupang_clicks: 0,
            naver_clicks: 0,
            total_clicks: 0,
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .unwrap()
            .products
            .insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: Uuid,
        req: UpdateProductRequest,
    ) -> Result<Option<Product>, RepoError> {
        let mut state = self.state.lock().unwrap();
        let Some(product) = state.products.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = req.category_id {
            product.category_id = v;
        }
        if let Some(v) = req.name {
            product.name = v;
        }
        if let Some(v) = req.brand {
            product.brand = v;
        }
        if let Some(v) = req.description {
            product.description = v;
        }
        if let Some(v) = req.image_url {
            product.image_url = v;
        }
        if let Some(v) = req.coupang_url {
            product.coupang_url = Some(v);
        }
        if let Some(v) = req.naver_url {
            product.naver_url = Some(v);
        }
        if let Some(v) = req.price {
            product.price = v;
        }
        product.updated_at = chrono::Utc::now();
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, RepoError> {
        Ok(self.state.lock().unwrap().products.remove(&id).is_some())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepoError> {
        let state = self.state.lock().unwrap();
        let mut categories: Vec<Category> = state.categories.values().cloned().collect();
        categories.sort_by_key(|c| (c.sort_order, c.created_at));
        Ok(categories)
    }

    async fn create_category(&self, req: CreateCategoryRequest) -> Result<Category, RepoError> {
        let category = Category {
            id: Uuid::new_v4(),
            name: req.name,
            sort_order: req.sort_order,
            created_at: chrono::Utc::now(),
        };
        self.state
            .lock()
            .unwrap()
            .categories
            .insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: Uuid,
        req: UpdateCategoryRequest,
    ) -> Result<Option<Category>, RepoError> {
        let mut state = self.state.lock().unwrap();
        let Some(category) = state.categories.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = req.name {
            category.name = v;
        }
        if let Some(v) = req.sort_order {
            category.sort_order = v;
        }
        Ok(Some(category.clone()))
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool, RepoError> {
        Ok(self.state.lock().unwrap().categories.remove(&id).is_some())
    }

    async fn list_comments(&self, product_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let state = self.state.lock().unwrap();
        let mut comments: Vec<Comment> = state
            .comments
            .values()
            .filter(|(c, _)| c.product_id == product_id)
            .map(|(c, _)| c.clone())
            .collect();
        comments.sort_by_key(|c| std::cmp::Reverse(c.id));
        Ok(comments)
    }

    async fn list_recent_comments(&self, limit: i64) -> Result<Vec<Comment>, RepoError> {
        let state = self.state.lock().unwrap();
        let mut comments: Vec<Comment> =
            state.comments.values().map(|(c, _)| c.clone()).collect();
        comments.sort_by_key(|c| std::cmp::Reverse(c.id));
        comments.truncate(limit as usize);
        Ok(comments)
    }

    async fn create_comment(
        &self,
        product_id: Uuid,
        req: CreateCommentRequest,
        password_hash: String,
    ) -> Result<Comment, RepoError> {
        let mut state = self.state.lock().unwrap();
        state.next_comment_id += 1;
        let comment = Comment {
            id: state.next_comment_id,
            product_id,
            author: req.author,
            content: req.content,
            created_at: chrono::Utc::now(),
        };
        state
            .comments
            .insert(comment.id, (comment.clone(), password_hash));
        Ok(comment)
    }

    async fn get_comment_password_hash(&self, id: i64) -> Result<Option<String>, RepoError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .comments
            .get(&id)
            .map(|(_, hash)| hash.clone()))
    }

    async fn delete_comment(&self, id: i64) -> Result<bool, RepoError> {
        Ok(self.state.lock().unwrap().comments.remove(&id).is_some())
    }

    async fn increment_counter_atomic(
        &self,
        product_id: Uuid,
        kind: CounterKind,
    ) -> Result<bool, RepoError> {
        self.atomic_calls.fetch_add(1, Ordering::SeqCst);
        if !self.atomic_available {
            // The shape of failure when the procedure is not defined on the backend.
            return Err(RepoError::Database(sqlx::Error::Protocol(
                "function increment_product_counter(uuid, text) does not exist".to_string(),
            )));
        }
        let mut state = self.state.lock().unwrap();
        let Some(product) = state.products.get_mut(&product_id) else {
            return Ok(false);
        };
        match kind {
            CounterKind::View => product.view_count += 1,
            CounterKind::Coupang => {
                product.coupang_clicks += 1;
                product.total_clicks += 1;
            }
            CounterKind::Naver => {
                product.naver_clicks += 1;
                product.total_clicks += 1;
            }
        }
        Ok(true)
    }

    async fn get_counters(&self, product_id: Uuid) -> Result<Option<ProductCounters>, RepoError> {
        self.fallback_reads.fetch_add(1, Ordering::SeqCst);
        let snapshot = {
            let state = self.state.lock().unwrap();
            state.products.get(&product_id).map(|p| ProductCounters {
                view_count: p.view_count,
                coupang_clicks: p.coupang_clicks,
                naver_clicks: p.naver_clicks,
                total_clicks: p.total_clicks,
            })
        };
        // Widen the read-modify-write window so concurrent fallback increments
        // interleave the way they would against a remote data store.
        tokio::task::yield_now().await;
        Ok(snapshot)
    }

    async fn put_counters(
        &self,
        product_id: Uuid,
        counters: ProductCounters,
    ) -> Result<bool, RepoError> {
        let mut state = self.state.lock().unwrap();
        let Some(product) = state.products.get_mut(&product_id) else {
            return Ok(false);
        };
        product.view_count = counters.view_count;
        product.coupang_clicks = counters.coupang_clicks;
        product.naver_clicks = counters.naver_clicks;
        product.total_clicks = counters.total_clicks;
        Ok(true)
    }

    async fn list_carousel(&self) -> Result<Vec<CarouselItem>, RepoError> {
        let state = self.state.lock().unwrap();
        let mut items: Vec<CarouselItem> = state.carousel.values().cloned().collect();
        items.sort_by_key(|i| (i.sort_order, i.created_at));
        Ok(items)
    }

    async fn create_carousel_item(
        &self,
        req: CreateCarouselItemRequest,
    ) -> Result<CarouselItem, RepoError> {
        let item = CarouselItem {
            id: Uuid::new_v4(),
            product_id: req.product_id,
            title: req.title,
            image_url: req.image_url,
            sort_order: req.sort_order,
            created_at: chrono::Utc::now(),
        };
        self.state
            .lock()
            .unwrap()
            .carousel
            .insert(item.id, item.clone());
        Ok(item)
    }

    async fn update_carousel_item(
        &self,
        id: Uuid,
        req: UpdateCarouselItemRequest,
    ) -> Result<Option<CarouselItem>, RepoError> {
        let mut state = self.state.lock().unwrap();
        let Some(item) = state.carousel.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = req.title {
            item.title = v;
        }
        if let Some(v) = req.image_url {
            item.image_url = v;
        }
        if let Some(v) = req.sort_order {
            item.sort_order = v;
        }
        Ok(Some(item.clone()))
    }

    async fn delete_carousel_item(&self, id: Uuid) -> Result<bool, RepoError> {
        Ok(self.state.lock().unwrap().carousel.remove(&id).is_some())
    }

    async fn get_settings(&self) -> Result<SiteSettings, RepoError> {
        Ok(self.state.lock().unwrap().settings.clone())
    }

    async fn update_settings(
        &self,
        req: UpdateSettingsRequest,
    ) -> Result<SiteSettings, RepoError> {
        let mut state = self.state.lock().unwrap();
        if let Some(v) = req.carousel_enabled {
            state.settings.carousel_enabled = v;
        }
        if let Some(v) = req.banner_text {
            state.settings.banner_text = Some(v);
        }
        if let Some(v) = req.banner_enabled {
            state.settings.banner_enabled = v;
        }
        state.settings.updated_at = chrono::Utc::now();
        Ok(state.settings.clone())
    }
}

// --- Test Application Harness ---

pub struct TestApp {
    pub address: String,
    pub repo: Arc<MemoryRepository>,
}

/// spawn_app
///
/// Boots the real router over the in-memory repository and mock storage, bound to an
/// ephemeral port, and returns its base address for reqwest calls.
pub async fn spawn_app(repo: Arc<MemoryRepository>) -> TestApp {
    let storage = Arc::new(MockStorageService::new()) as StorageState;
    let config = AppConfig::default();

    let state = AppState {
        repo: repo.clone() as RepositoryState,
        storage,
        config,
    };
    let router = kukrule_api::create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address, repo }
}

/// login_cookie
///
/// Performs a real login against the spawned app and returns the session cookie
/// pair ("admin-session=<token>") for use in subsequent requests.
pub async fn login_cookie(client: &reqwest::Client, address: &str) -> String {
    let response = client
        .post(format!("{address}/auth/login"))
        .json(&serde_json::json!({ "password": TEST_ADMIN_PASSWORD }))
        .send()
        .await
        .expect("login request failed");
    assert_eq!(response.status(), 200, "test login should succeed");

    let set_cookie = response
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .expect("login must set the session cookie")
        .to_str()
        .expect("cookie header should be ascii");

    set_cookie
        .split(';')
        .next()
        .expect("cookie pair present")
        .to_string()
}
