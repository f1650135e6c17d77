// src/state.rs

use std::sync::Arc;

use moka::future::Cache;
use sqlx::PgPool;

use crate::cloudinary::ImageUrlResolver;
use crate::models::Category;
use crate::services::ItemSource;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub items: Arc<dyn ItemSource>,
    pub image_resolver: Arc<dyn ImageUrlResolver>,
    pub category_list_cache: Cache<(), Vec<Category>>,
    pub page_size: usize,
    pub public_base_url: String,
}

#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}
