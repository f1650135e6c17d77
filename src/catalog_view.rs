// src/catalog_view.rs

//! Per-view controller for paged catalog listings.
//!
//! A [`CatalogView`] owns everything one listing needs: the scope it reads
//! from, the ordered collection, the current query and page, and the image URLs
//! resolved for the visible page. Filtering, ordering and paging are recomputed
//! from that state; only [`CatalogView::load`] talks to the item source, and
//! image resolution runs once per visible page.
//!
//! Image batches carry a generation number and a cancellation token. Changing
//! the page or the query bumps the generation and cancels the batch in flight,
//! so a slow response for an old page can never overwrite a newer one.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::cloudinary::ImageUrlResolver;
use crate::errors::AppError;
use crate::filters::{ItemFilter, SearchOutcome, SearchState, normalized_query, search};
use crate::models::{CatalogScope, ImageRef, Product, ProductPublic, SortMode};
use crate::ordering::order_items;
use crate::pagination::{PaginatedProductsResponse, compute_page_window, paginate};
use crate::services::ItemSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewPhase {
    /// The collection has not been fetched yet.
    Loading,
    /// The collection is known and the visible page still waits for image URLs.
    ResolvingImages,
    Ready,
}

/// Browse views treat an empty query as "show everything"; search views report it
/// as "no query" so the page can ask the shopper to type something.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Browse,
    Search,
}

/// Outcome of [`CatalogView::begin_image_batch`].
#[derive(Debug)]
pub enum ImageBatch {
    /// Nothing is visible, so no request is made.
    Skip,
    Request(ImageBatchTicket),
}

/// One pending image resolution for one visible page.
#[derive(Debug)]
pub struct ImageBatchTicket {
    pub generation: u64,
    pub refs: Vec<Option<ImageRef>>,
    cancel: CancellationToken,
}

impl ImageBatchTicket {
    /// Runs the request. Returns `None` when the ticket was superseded before the
    /// resolver answered; the stale response is dropped unseen.
    pub async fn run(self, resolver: &dyn ImageUrlResolver) -> Option<(u64, Vec<Option<String>>)> {
        let generation = self.generation;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                tracing::debug!("Image batch generation {} cancelled", generation);
                None
            }
            urls = resolver.resolve_batch(&self.refs) => Some((generation, urls)),
        }
    }
}

pub struct CatalogView {
    source: Arc<dyn ItemSource>,
    resolver: Arc<dyn ImageUrlResolver>,
    scope: CatalogScope,
    sort: Option<SortMode>,
    mode: FilterMode,
    category: Option<uuid::Uuid>,
    page_size: usize,
    query: String,
    current_page: usize,
    collection: Option<Vec<Product>>,
    visible: Vec<Product>,
    start_index: usize,
    end_index_inclusive: Option<usize>,
    total_matches: usize,
    image_urls: Option<Vec<Option<String>>>,
    generation: u64,
    in_flight: Option<CancellationToken>,
}

impl CatalogView {
    /// `sort = None` keeps the order the source returned (wishlists).
    pub fn new(
        source: Arc<dyn ItemSource>,
        resolver: Arc<dyn ImageUrlResolver>,
        scope: CatalogScope,
        sort: Option<SortMode>,
        mode: FilterMode,
        page_size: usize,
    ) -> Self {
        CatalogView {
            source,
            resolver,
            scope,
            sort,
            mode,
            category: None,
            page_size: page_size.max(1),
            query: String::new(),
            current_page: 1,
            collection: None,
            visible: Vec::new(),
            start_index: 0,
            end_index_inclusive: None,
            total_matches: 0,
            image_urls: None,
            generation: 0,
            in_flight: None,
        }
    }

    pub fn phase(&self) -> ViewPhase {
        if self.collection.is_none() {
            ViewPhase::Loading
        } else if !self.visible.is_empty() && self.image_urls.is_none() {
            ViewPhase::ResolvingImages
        } else {
            ViewPhase::Ready
        }
    }

    /// Fetches the collection for the view's scope. This is the only operation
    /// that reads from the item source.
    pub async fn load(&mut self) -> Result<(), AppError> {
        self.collection = None;
        self.invalidate_images();

        let mut items = self.source.list_items(&self.scope).await?;
        if let Some(mode) = self.sort {
            items = order_items(&items, mode);
        }
        tracing::debug!(
            "Catalog view {:?} loaded {} products",
            self.scope,
            items.len()
        );

        self.collection = Some(items);
        self.recompute();
        Ok(())
    }

    /// Replaces the name query and returns to the first page.
    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.current_page = 1;
        self.recompute();
    }

    /// Restricts the view to one category on top of its scope.
    pub fn set_category(&mut self, category: Option<uuid::Uuid>) {
        self.category = category;
        self.current_page = 1;
        self.recompute();
    }

    /// Moves to `page`. Callers bound the value; pages past the end show nothing.
    pub fn set_page(&mut self, page: usize) {
        self.current_page = page;
        self.recompute();
    }

    /// Total pages of the filtered collection, 0 while loading or when empty.
    pub fn total_pages(&self) -> usize {
        crate::pagination::total_pages(self.total_matches, self.page_size)
    }

    fn search_state(&self) -> Option<SearchState> {
        match self.mode {
            FilterMode::Browse => None,
            FilterMode::Search if normalized_query(&self.query).is_none() => {
                Some(SearchState::NoQuery)
            }
            FilterMode::Search => Some(SearchState::Results),
        }
    }

    fn filtered(&self) -> Vec<Product> {
        let Some(collection) = self.collection.as_deref() else {
            return Vec::new();
        };
        match self.mode {
            FilterMode::Browse => ItemFilter::by_name(&self.query)
                .in_category(self.category)
                .apply(collection),
            FilterMode::Search => match search(collection, &self.query) {
                SearchOutcome::NoQuery => Vec::new(),
                SearchOutcome::Results(found) => ItemFilter::default()
                    .in_category(self.category)
                    .apply(&found),
            },
        }
    }

    fn recompute(&mut self) {
        let filtered = self.filtered();
        self.total_matches = filtered.len();
        let page = paginate(&filtered, self.current_page, self.page_size);
        self.start_index = page.start_index;
        self.end_index_inclusive = page.end_index_inclusive();
        self.visible = page.items.to_vec();
        self.invalidate_images();
    }

    fn invalidate_images(&mut self) {
        self.generation += 1;
        self.image_urls = None;
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }

    /// Starts image resolution for the visible page.
    pub fn begin_image_batch(&mut self) -> ImageBatch {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }

        if self.visible.is_empty() {
            self.image_urls = Some(Vec::new());
            return ImageBatch::Skip;
        }

        let cancel = CancellationToken::new();
        self.in_flight = Some(cancel.clone());
        ImageBatch::Request(ImageBatchTicket {
            generation: self.generation,
            refs: self.visible.iter().map(|p| p.image_ref.clone()).collect(),
            cancel,
        })
    }

    /// Stores the URLs of a finished batch. Returns `false` and keeps the current
    /// state when the batch belongs to an older generation.
    pub fn complete_image_batch(&mut self, generation: u64, urls: Vec<Option<String>>) -> bool {
        if generation != self.generation {
            tracing::debug!(
                "Dropping stale image batch (generation {}, current {})",
                generation,
                self.generation
            );
            return false;
        }
        if urls.len() != self.visible.len() {
            tracing::warn!(
                "Image resolver returned {} URLs for {} products, missing ones use a placeholder",
                urls.len(),
                self.visible.len()
            );
        }
        let mut urls = urls;
        urls.resize(self.visible.len(), None);
        self.image_urls = Some(urls);
        self.in_flight = None;
        true
    }

    /// Resolves image URLs for the visible page and waits for the result.
    pub async fn resolve_images(&mut self) {
        match self.begin_image_batch() {
            ImageBatch::Skip => {
                tracing::debug!("No visible products, image resolution skipped");
            }
            ImageBatch::Request(ticket) => {
                let resolver = Arc::clone(&self.resolver);
                if let Some((generation, urls)) = ticket.run(resolver.as_ref()).await {
                    self.complete_image_batch(generation, urls);
                }
            }
        }
    }

    /// Derived, read-only description of the visible page.
    pub fn snapshot(&self) -> PaginatedProductsResponse {
        let data = self
            .visible
            .iter()
            .enumerate()
            .map(|(i, product)| {
                let url = self
                    .image_urls
                    .as_ref()
                    .and_then(|urls| urls.get(i).cloned().flatten());
                ProductPublic::from_product(product, url)
            })
            .collect::<Vec<_>>();

        let total_pages = self.total_pages();
        PaginatedProductsResponse {
            total_items: self.total_matches,
            total_pages,
            current_page: self.current_page,
            per_page: self.page_size,
            start_index: self.start_index,
            end_index_inclusive: self.end_index_inclusive,
            page_window: compute_page_window(self.current_page, total_pages),
            search_state: self.search_state(),
            data,
        }
    }
}
