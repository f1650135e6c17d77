// src/handlers.rs
use axum::Json;
use axum::extract::{Path, Query, State};
use axum_extra::TypedHeader;
use serde_json::{Value, json};
use uuid::Uuid;
use validator::Validate;

use crate::catalog_view::{CatalogView, FilterMode};
use crate::errors::AppError;
use crate::extractor::XWishlistId;
use crate::filters::ListingParams;
use crate::models::{CatalogScope, Category, SortMode};
use crate::pagination::{PaginatedProductsResponse, clamp_page};
use crate::services::list_categories;
use crate::state::AppState;

/// The storefront listings that share the catalog view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    Products,
    Featured,
    Category(String),
    Search,
    Wishlist(Uuid),
}

impl Listing {
    pub fn scope(&self) -> CatalogScope {
        match self {
            Listing::Products | Listing::Search => CatalogScope::All,
            Listing::Featured => CatalogScope::Featured,
            Listing::Category(slug) => CatalogScope::Category(slug.clone()),
            Listing::Wishlist(id) => CatalogScope::Wishlist(*id),
        }
    }

    /// Wishlists keep the order the shopper added things in.
    pub fn default_sort(&self) -> Option<SortMode> {
        match self {
            Listing::Featured => Some(SortMode::Curated),
            Listing::Wishlist(_) => None,
            Listing::Products | Listing::Category(_) | Listing::Search => Some(SortMode::Newest),
        }
    }

    pub fn filter_mode(&self) -> FilterMode {
        match self {
            Listing::Search => FilterMode::Search,
            _ => FilterMode::Browse,
        }
    }

    /// Path of the htmx fragment serving this listing, used in pagination links.
    pub fn fragment_path(&self) -> String {
        match self {
            Listing::Products => "/htmx/products".to_string(),
            Listing::Featured => "/htmx/featured".to_string(),
            Listing::Category(slug) => format!("/htmx/categories/{}", urlencoding::encode(slug)),
            Listing::Search => "/htmx/search".to_string(),
            Listing::Wishlist(_) => "/htmx/wishlist".to_string(),
        }
    }

    /// Public page path of this listing, used for rel=prev/next.
    pub fn page_path(&self) -> String {
        match self {
            Listing::Products => "/".to_string(),
            Listing::Featured => "/featured".to_string(),
            Listing::Category(slug) => format!("/categories/{}", urlencoding::encode(slug)),
            Listing::Search => "/search".to_string(),
            Listing::Wishlist(_) => "/htmx/wishlist".to_string(),
        }
    }
}

/// Builds a fresh view for one request, applies the listing parameters and
/// resolves the visible page's images.
pub async fn load_listing_page(
    app_state: &AppState,
    listing: &Listing,
    params: &ListingParams,
) -> Result<PaginatedProductsResponse, AppError> {
    params.validate()?;

    let mut view = CatalogView::new(
        app_state.items.clone(),
        app_state.image_resolver.clone(),
        listing.scope(),
        params.sort.or(listing.default_sort()),
        listing.filter_mode(),
        app_state.page_size,
    );
    view.load().await?;
    view.set_query(params.query());
    view.set_category(params.category);

    let requested = params.page();
    let page = clamp_page(requested, view.total_pages());
    if page != requested {
        tracing::debug!(
            "Requested page {} clamped to {} for {:?}",
            requested,
            page,
            listing
        );
    }
    view.set_page(page);
    view.resolve_images().await;

    let response = view.snapshot();
    tracing::info!(
        "Listing {:?}: page {}/{} with {} of {} products",
        listing,
        response.current_page,
        response.total_pages,
        response.data.len(),
        response.total_items
    );
    Ok(response)
}

pub fn wishlist_listing(header: Option<TypedHeader<XWishlistId>>) -> Result<Listing, AppError> {
    match header {
        Some(TypedHeader(XWishlistId(id))) => Ok(Listing::Wishlist(id)),
        None => {
            tracing::warn!("Wishlist requested without a valid X-Wishlist-Id header");
            Err(AppError::BadRequest(
                "معرّف قائمة الأمنيات مفقود أو غير صالح".to_string(),
            ))
        }
    }
}

pub async fn list_products(
    State(app_state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<Json<PaginatedProductsResponse>, AppError> {
    tracing::info!("GET /api/products with params: {:?}", params);
    load_listing_page(&app_state, &Listing::Products, &params)
        .await
        .map(Json)
}

pub async fn list_featured(
    State(app_state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<Json<PaginatedProductsResponse>, AppError> {
    tracing::info!("GET /api/featured with params: {:?}", params);
    load_listing_page(&app_state, &Listing::Featured, &params)
        .await
        .map(Json)
}

pub async fn list_categories_handler(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    list_categories(&app_state).await.map(Json)
}

pub async fn list_category_products(
    State(app_state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<ListingParams>,
) -> Result<Json<PaginatedProductsResponse>, AppError> {
    tracing::info!("GET /api/categories/{}/products with params: {:?}", slug, params);
    load_listing_page(&app_state, &Listing::Category(slug), &params)
        .await
        .map(Json)
}

pub async fn search_products(
    State(app_state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<Json<PaginatedProductsResponse>, AppError> {
    tracing::info!("GET /api/search with params: {:?}", params);
    load_listing_page(&app_state, &Listing::Search, &params)
        .await
        .map(Json)
}

pub async fn list_wishlist(
    State(app_state): State<AppState>,
    wishlist_header: Option<TypedHeader<XWishlistId>>,
    Query(params): Query<ListingParams>,
) -> Result<Json<PaginatedProductsResponse>, AppError> {
    let listing = wishlist_listing(wishlist_header)?;
    load_listing_page(&app_state, &listing, &params)
        .await
        .map(Json)
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
