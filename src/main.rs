// src/main.rs

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, routing::get};
use dotenvy::dotenv;
use moka::future::Cache;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod catalog_view;
mod cloudinary;
mod config;
mod errors;
mod extractor;
mod filters;
mod handlers;
mod htmx_handlers;
mod models;
mod ordering;
mod pagination;
mod response;
mod seo;
mod services;
mod state;

use crate::cloudinary::CloudinaryResolver;
use crate::config::AppConfig;
use crate::handlers::*;
use crate::htmx_handlers::*;
use crate::services::PgItemSource;
use crate::state::AppState;

const CATEGORY_CACHE_TTL: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "souq_storefront_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting storefront server...");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            tracing::info!("Connected to the database");
            pool
        }
        Err(err) => {
            tracing::error!("Cannot connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    let app_state = AppState {
        db_pool: pool.clone(),
        items: Arc::new(PgItemSource::new(pool)),
        image_resolver: Arc::new(CloudinaryResolver::new(
            config.cloudinary.clone(),
            config.image_url_cache_ttl,
        )),
        category_list_cache: Cache::builder()
            .max_capacity(1)
            .time_to_live(CATEGORY_CACHE_TTL)
            .build(),
        page_size: config.page_size,
        public_base_url: config.public_base_url.clone(),
    };

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/api/products", get(list_products))
        .route("/api/featured", get(list_featured))
        .route("/api/categories", get(list_categories_handler))
        .route("/api/categories/{slug}/products", get(list_category_products))
        .route("/api/search", get(search_products))
        .route("/api/wishlist", get(list_wishlist))
        .route("/", get(products_page_handler))
        .route("/htmx/products", get(products_page_handler))
        .route("/featured", get(featured_page_handler))
        .route("/htmx/featured", get(featured_page_handler))
        .route("/categories/{slug}", get(category_page_handler))
        .route("/htmx/categories/{slug}", get(category_page_handler))
        .route("/search", get(search_page_handler))
        .route("/htmx/search", get(search_page_handler))
        .route("/htmx/wishlist", get(wishlist_page_handler))
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = match TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Cannot bind {}: {}", config.bind_addr, e);
            return;
        }
    };

    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        tracing::error!("Server error: {}", e);
    }
}
