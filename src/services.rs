// src/services.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{CatalogScope, Category, Product};
use crate::state::AppState;

/// Source of the full, unpaged collection behind a catalog view.
///
/// Every call reflects the latest committed data; nothing is cached here.
#[async_trait]
pub trait ItemSource: Send + Sync {
    async fn list_items(&self, scope: &CatalogScope) -> Result<Vec<Product>, AppError>;
}

pub struct PgItemSource {
    pool: PgPool,
}

impl PgItemSource {
    pub fn new(pool: PgPool) -> Self {
        PgItemSource { pool }
    }

    async fn category_id_by_slug(&self, slug: &str) -> Result<Uuid, AppError> {
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM categories WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                tracing::warn!("Unknown category slug: {}", slug);
                AppError::NotFound
            })
    }
}

#[async_trait]
impl ItemSource for PgItemSource {
    async fn list_items(&self, scope: &CatalogScope) -> Result<Vec<Product>, AppError> {
        let products = match scope {
            CatalogScope::All => {
                sqlx::query_as::<_, Product>(
                    r#"
                    SELECT id, name, category_id, price, display_order, created_at, image_ref
                    FROM products
                    ORDER BY created_at DESC, id ASC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
            CatalogScope::Featured => {
                sqlx::query_as::<_, Product>(
                    r#"
                    SELECT id, name, category_id, price, display_order, created_at, image_ref
                    FROM products
                    WHERE featured = TRUE
                    ORDER BY display_order ASC, id ASC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
            CatalogScope::Category(slug) => {
                let category_id = self.category_id_by_slug(slug).await?;
                sqlx::query_as::<_, Product>(
                    r#"
                    SELECT id, name, category_id, price, display_order, created_at, image_ref
                    FROM products
                    WHERE category_id = $1
                    ORDER BY created_at DESC, id ASC
                    "#,
                )
                .bind(category_id)
                .fetch_all(&self.pool)
                .await?
            }
            CatalogScope::Wishlist(wishlist_id) => {
                // Newest addition first; the view keeps this order.
                sqlx::query_as::<_, Product>(
                    r#"
                    SELECT p.id, p.name, p.category_id, p.price, p.display_order,
                           p.created_at, p.image_ref
                    FROM wishlist_items w
                    JOIN products p ON p.id = w.product_id
                    WHERE w.wishlist_id = $1
                    ORDER BY w.added_at DESC, p.id ASC
                    "#,
                )
                .bind(wishlist_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        tracing::debug!("Loaded {} products for scope {:?}", products.len(), scope);
        Ok(products)
    }
}

/// Returns the storefront category list, ordered for the navigation menu.
///
/// Categories change rarely, so the list is served from `category_list_cache`
/// and only read from the database on a miss.
pub async fn list_categories(app_state: &AppState) -> Result<Vec<Category>, AppError> {
    if let Some(cached) = app_state.category_list_cache.get(&()).await {
        tracing::debug!("Cache HIT for category list");
        return Ok(cached);
    }

    tracing::info!("Cache MISS for category list, loading from database");

    let categories = sqlx::query_as::<_, Category>(
        r#"
        SELECT id, slug, name, display_order
        FROM categories
        ORDER BY display_order ASC, name ASC
        "#,
    )
    .fetch_all(&app_state.db_pool)
    .await?;

    app_state
        .category_list_cache
        .insert((), categories.clone())
        .await;

    Ok(categories)
}
