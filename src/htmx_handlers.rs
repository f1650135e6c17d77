// src/htmx_handlers.rs

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
};
use axum_extra::TypedHeader;
use maud::{Markup, PreEscaped, html};

use crate::{
    errors::AppError,
    extractor::XWishlistId,
    filters::{ListingParams, SearchState, normalized_query},
    handlers::{Listing, load_listing_page, wishlist_listing},
    pagination::{PageSlot, PaginatedProductsResponse},
    response::build_response,
    seo::{item_list_json_ld, page_links},
    services::list_categories,
    state::AppState,
};

const GRID_CONTAINER_ID: &str = "products-grid-container";

/// Pagination controls swap `#products-grid-container` in place; those requests
/// get the grid alone so headings are not nested on every page change.
fn targets_grid(headers: &HeaderMap) -> bool {
    headers
        .get("hx-target")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|target| target == GRID_CONTAINER_ID)
}

fn format_price(price: i64) -> String {
    format!("{:.2} ر.س", (price as f64) / 100.0)
}

fn empty_state_message(page: &PaginatedProductsResponse, query: &str) -> String {
    match page.search_state {
        Some(SearchState::NoQuery) => "اكتب اسم المنتج الذي تبحث عنه".to_string(),
        Some(SearchState::Results) => format!("لا توجد نتائج مطابقة لـ «{}»", query.trim()),
        None => "لا توجد منتجات لعرضها حالياً".to_string(),
    }
}

fn render_pagination_controls(
    page: &PaginatedProductsResponse,
    fragment_path: &str,
    filter_query_string: &str,
) -> Markup {
    let link = |n: usize| format!("{}?page={}{}", fragment_path, n, filter_query_string);
    let button_class = "px-3 py-2 border rounded-md text-sm font-medium text-gray-700 bg-white hover:bg-gray-50";
    let disabled_class = "px-3 py-2 border rounded-md text-sm font-medium text-gray-400 bg-gray-50 cursor-not-allowed";

    html! {
        nav #pagination-controls ."mt-8 flex justify-center items-center gap-1" aria-label="ترقيم الصفحات" {
            @if page.has_previous() {
                button "hx-get"=(link(page.current_page - 1))
                       "hx-target"="#products-grid-container" "hx-swap"="outerHTML"
                       class=(button_class) {
                    "السابق"
                }
            } @else {
                span class=(disabled_class) aria-disabled="true" { "السابق" }
            }
            @for slot in &page.page_window {
                @match slot {
                    PageSlot::Page(n) if *n == page.current_page => {
                        span class="px-3 py-2 border rounded-md text-sm font-medium text-white bg-emerald-700" aria-current="page" { (n) }
                    }
                    PageSlot::Page(n) => {
                        button "hx-get"=(link(*n))
                               "hx-target"="#products-grid-container" "hx-swap"="outerHTML"
                               class=(button_class) {
                            (n)
                        }
                    }
                    PageSlot::Ellipsis => {
                        span class="px-2 py-2 text-sm text-gray-500" { "…" }
                    }
                }
            }
            @if page.has_next() {
                button "hx-get"=(link(page.current_page + 1))
                       "hx-target"="#products-grid-container" "hx-swap"="outerHTML"
                       class=(button_class) {
                    "التالي"
                }
            } @else {
                span class=(disabled_class) aria-disabled="true" { "التالي" }
            }
        }
    }
}

pub fn render_product_grid(
    page: &PaginatedProductsResponse,
    listing: &Listing,
    params: &ListingParams,
    base_url: &str,
) -> Markup {
    let filter_query_string = params.filter_only_query_string();
    let links = page_links(
        &listing.page_path(),
        page.current_page,
        page.total_pages,
        &filter_query_string,
    );

    html! {
        div #products-grid-container dir="rtl" {
            @if let Some(prev) = &links.prev {
                link rel="prev" href=(prev);
            }
            @if let Some(next) = &links.next {
                link rel="next" href=(next);
            }
            @if !page.data.is_empty() {
                script type="application/ld+json" {
                    (PreEscaped(item_list_json_ld(page, base_url)))
                }
                p ."text-sm text-gray-500 mb-4" {
                    "عرض " (page.start_index + 1) "–" (page.end_index_inclusive.map_or(0, |i| i + 1))
                    " من " (page.total_items)
                }
            }
            div #products-container ."grid grid-cols-2 lg:grid-cols-4 gap-6" {
                @if page.data.is_empty() {
                    p ."col-span-full text-center text-gray-500 py-8" {
                        (empty_state_message(page, params.query()))
                    }
                } @else {
                    @for product in &page.data {
                        div ."border rounded-lg p-4 shadow flex flex-col bg-white" {
                            a href=(format!("/products/{}", product.id)) class="block mb-2" {
                                @if let Some(url) = &product.image_url {
                                    img src=(url) alt=(product.name) class="w-full h-48 object-cover rounded-md" loading="lazy";
                                } @else {
                                    div ."image-placeholder w-full h-48 bg-gray-200 rounded-md flex items-center justify-center" {
                                        span ."text-gray-500 text-sm" { "لا توجد صورة" }
                                    }
                                }
                            }
                            h2 ."text-lg font-semibold mb-1 text-gray-800" { (product.name) }
                            p ."text-gray-700" { (format_price(product.price)) }
                        }
                    }
                }
            }
            @if page.total_pages > 1 {
                (render_pagination_controls(page, &listing.fragment_path(), &filter_query_string))
            }
        }
    }
}

async fn listing_response(
    app_state: &AppState,
    headers: &HeaderMap,
    listing: Listing,
    params: ListingParams,
) -> Result<Response, AppError> {
    let page = load_listing_page(app_state, &listing, &params).await?;
    let markup = render_product_grid(&page, &listing, &params, &app_state.public_base_url);
    build_response(headers, markup).await
}

pub async fn products_page_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListingParams>,
) -> Result<Response, AppError> {
    listing_response(&app_state, &headers, Listing::Products, params).await
}

pub async fn featured_page_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListingParams>,
) -> Result<Response, AppError> {
    listing_response(&app_state, &headers, Listing::Featured, params).await
}

pub async fn category_page_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Query(params): Query<ListingParams>,
) -> Result<Response, AppError> {
    tracing::info!("Category page '{}' with params: {:?}", slug, params);
    // Unknown slugs are rejected by the item source with NotFound.
    let listing = Listing::Category(slug.clone());
    let page = load_listing_page(&app_state, &listing, &params).await?;
    let grid = render_product_grid(&page, &listing, &params, &app_state.public_base_url);
    if targets_grid(&headers) {
        return build_response(&headers, grid).await;
    }

    let title = list_categories(&app_state)
        .await?
        .into_iter()
        .find(|c| c.slug == slug)
        .map_or(slug, |c| c.name);
    let markup = html! {
        section #category-listing {
            h1 ."text-2xl font-bold mb-6" { (title) }
            (grid)
        }
    };
    build_response(&headers, markup).await
}

pub async fn search_page_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListingParams>,
) -> Result<Response, AppError> {
    tracing::info!("Search page with params: {:?}", params);
    let page = load_listing_page(&app_state, &Listing::Search, &params).await?;
    let grid = render_product_grid(&page, &Listing::Search, &params, &app_state.public_base_url);
    if targets_grid(&headers) {
        return build_response(&headers, grid).await;
    }

    let markup = html! {
        section #search-results {
            @if let Some(q) = normalized_query(params.query()) {
                h1 ."text-2xl font-bold mb-6" { "نتائج البحث عن «" (q) "»" }
            } @else {
                h1 ."text-2xl font-bold mb-6" { "البحث" }
            }
            (grid)
        }
    };
    build_response(&headers, markup).await
}

pub async fn wishlist_page_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    wishlist_header: Option<TypedHeader<XWishlistId>>,
    Query(params): Query<ListingParams>,
) -> Result<Response, AppError> {
    let listing = wishlist_listing(wishlist_header)?;
    listing_response(&app_state, &headers, listing, params).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductPublic;
    use crate::models::fixtures::product;
    use crate::pagination::compute_page_window;

    fn page(
        current_page: usize,
        total_items: usize,
        data: Vec<ProductPublic>,
        search_state: Option<SearchState>,
    ) -> PaginatedProductsResponse {
        let total_pages = crate::pagination::total_pages(total_items, 12);
        let start_index = (current_page - 1) * 12;
        PaginatedProductsResponse {
            total_items,
            total_pages,
            current_page,
            per_page: 12,
            start_index,
            end_index_inclusive: (!data.is_empty()).then(|| start_index + data.len() - 1),
            page_window: compute_page_window(current_page, total_pages),
            search_state,
            data,
        }
    }

    #[test]
    fn missing_image_renders_placeholder() {
        let data = vec![
            ProductPublic::from_product(&product("Lamp", 0, 0), Some("https://cdn/lamp".into())),
            ProductPublic::from_product(&product("Rug", 1, 1), None),
        ];
        let html = render_product_grid(
            &page(1, 2, data, None),
            &Listing::Products,
            &ListingParams::default(),
            "https://souq.example",
        )
        .into_string();
        assert!(html.contains(r#"src="https://cdn/lamp""#));
        assert!(html.contains("image-placeholder"));
        assert!(!html.contains("pagination-controls"));
    }

    #[test]
    fn controls_follow_the_page_window() {
        let data = vec![ProductPublic::from_product(&product("Lamp", 0, 0), None)];
        let params = ListingParams {
            q: Some("lamp".to_string()),
            ..Default::default()
        };
        let html = render_product_grid(
            &page(5, 120, data, None),
            &Listing::Products,
            &params,
            "https://souq.example",
        )
        .into_string();
        assert!(html.contains("pagination-controls"));
        assert_eq!(html.matches('…').count(), 2);
        assert!(html.contains(r#"hx-get="/htmx/products?page=4&amp;q=lamp""#));
        assert!(html.contains(r#"aria-current="page">5<"#));
        assert!(html.contains(r#"rel="next" href="/?page=6&amp;q=lamp""#));
    }

    #[test]
    fn search_empty_states_differ() {
        let no_query = render_product_grid(
            &page(1, 0, Vec::new(), Some(SearchState::NoQuery)),
            &Listing::Search,
            &ListingParams::default(),
            "",
        )
        .into_string();
        let params = ListingParams {
            q: Some("كرسي".to_string()),
            ..Default::default()
        };
        let no_matches = render_product_grid(
            &page(1, 0, Vec::new(), Some(SearchState::Results)),
            &Listing::Search,
            &params,
            "",
        )
        .into_string();
        assert!(no_query.contains("اكتب اسم المنتج"));
        assert!(no_matches.contains("لا توجد نتائج مطابقة لـ «كرسي»"));
        assert!(!no_query.contains("ld+json"));
    }

    #[test]
    fn grid_swaps_are_detected_from_hx_target() {
        let mut headers = HeaderMap::new();
        assert!(!targets_grid(&headers));
        headers.insert("hx-target", "content".parse().unwrap());
        assert!(!targets_grid(&headers));
        headers.insert("hx-target", GRID_CONTAINER_ID.parse().unwrap());
        assert!(targets_grid(&headers));
    }

    #[test]
    fn category_controls_target_the_grid_only() {
        let data = vec![ProductPublic::from_product(&product("Lamp", 0, 0), None)];
        let html = render_product_grid(
            &page(2, 40, data, None),
            &Listing::Category("lamps".to_string()),
            &ListingParams::default(),
            "",
        )
        .into_string();
        assert!(html.starts_with(&format!(r#"<div id="{}""#, GRID_CONTAINER_ID)));
        assert!(html.contains(r#"hx-get="/htmx/categories/lamps?page=3""#));
        assert!(html.contains(&format!(r##"hx-target="#{}""##, GRID_CONTAINER_ID)));
        assert!(!html.contains("<h1"));
    }

    #[test]
    fn hostile_names_stay_inside_json_ld() {
        let mut lamp = product("Lamp", 0, 0);
        lamp.name = "</script><script>alert(1)</script>".to_string();
        let data = vec![ProductPublic::from_product(&lamp, None)];
        let html = render_product_grid(
            &page(1, 1, data, None),
            &Listing::Products,
            &ListingParams::default(),
            "https://souq.example",
        )
        .into_string();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert_eq!(html.matches("</script>").count(), 1);
    }

    #[test]
    fn price_is_shown_in_riyals() {
        assert_eq!(format_price(1500), "15.00 ر.س");
    }
}
