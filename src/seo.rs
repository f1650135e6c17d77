// src/seo.rs

use serde::Serialize;

use crate::pagination::PaginatedProductsResponse;

// --- schema.org ItemList for a catalog page ---

#[derive(Serialize)]
pub struct SchemaItemList<'a> {
    #[serde(rename = "@context")]
    pub context: &'a str,
    #[serde(rename = "@type")]
    pub type_of: &'a str,
    #[serde(rename = "numberOfItems")]
    pub number_of_items: usize,
    #[serde(rename = "itemListElement")]
    pub item_list: Vec<SchemaListItem>,
}

#[derive(Serialize)]
pub struct SchemaListItem {
    #[serde(rename = "@type")]
    pub type_of: &'static str,
    pub position: usize,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub url: String,
}

/// ItemList for the visible page. Positions continue across pages so page 2
/// starts where page 1 ended.
pub fn item_list_for_page<'a>(
    page: &PaginatedProductsResponse,
    base_url: &str,
) -> SchemaItemList<'a> {
    SchemaItemList {
        context: "https://schema.org",
        type_of: "ItemList",
        number_of_items: page.total_items,
        item_list: page
            .data
            .iter()
            .enumerate()
            .map(|(i, product)| SchemaListItem {
                type_of: "ListItem",
                position: page.start_index + i + 1,
                name: product.name.clone(),
                image: product.image_url.clone(),
                url: format!("{}/products/{}", base_url, product.id),
            })
            .collect(),
    }
}

/// Serialized ItemList, safe to place inside a `<script>` element: `<`, `>` and
/// `&` are written as JSON unicode escapes so product names cannot close the tag.
pub fn item_list_json_ld(page: &PaginatedProductsResponse, base_url: &str) -> String {
    match serde_json::to_string(&item_list_for_page(page, base_url)) {
        Ok(json) => escape_for_script(&json),
        Err(e) => {
            tracing::error!("Cannot serialize ItemList JSON-LD: {}", e);
            String::new()
        }
    }
}

fn escape_for_script(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            _ => out.push(c),
        }
    }
    out
}

/// `rel="prev"` / `rel="next"` targets for the current page.
#[derive(Debug, PartialEq, Eq)]
pub struct PageLinks {
    pub prev: Option<String>,
    pub next: Option<String>,
}

pub fn page_links(
    path: &str,
    current_page: usize,
    total_pages: usize,
    filter_query_string: &str,
) -> PageLinks {
    let link = |page: usize| format!("{}?page={}{}", path, page, filter_query_string);
    PageLinks {
        prev: (current_page > 1 && current_page <= total_pages).then(|| link(current_page - 1)),
        next: (current_page < total_pages).then(|| link(current_page + 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductPublic;
    use crate::models::fixtures::product;

    fn page_two() -> PaginatedProductsResponse {
        let data = vec![
            ProductPublic::from_product(&product("Lamp", 0, 0), Some("https://cdn/lamp".into())),
            ProductPublic::from_product(&product("Rug", 1, 1), None),
        ];
        PaginatedProductsResponse {
            total_items: 14,
            total_pages: 2,
            current_page: 2,
            per_page: 12,
            start_index: 12,
            end_index_inclusive: Some(13),
            page_window: Vec::new(),
            search_state: None,
            data,
        }
    }

    #[test]
    fn positions_continue_from_previous_pages() {
        let list = item_list_for_page(&page_two(), "https://souq.example");
        let positions: Vec<usize> = list.item_list.iter().map(|i| i.position).collect();
        assert_eq!(positions, vec![13, 14]);
        assert_eq!(list.number_of_items, 14);
    }

    #[test]
    fn json_ld_omits_missing_images() {
        let json: serde_json::Value =
            serde_json::from_str(&item_list_json_ld(&page_two(), "https://souq.example")).unwrap();
        assert_eq!(json["@type"], "ItemList");
        assert_eq!(json["itemListElement"][0]["image"], "https://cdn/lamp");
        assert!(json["itemListElement"][1].get("image").is_none());
    }

    #[test]
    fn json_ld_cannot_close_the_script_tag() {
        let mut page = page_two();
        page.data[0].name = "</script><script>alert(1)</script> & co".to_string();
        let json_ld = item_list_json_ld(&page, "https://souq.example");
        assert!(!json_ld.contains('<'));
        assert!(!json_ld.contains('>'));
        assert!(!json_ld.contains('&'));

        let json: serde_json::Value = serde_json::from_str(&json_ld).unwrap();
        assert_eq!(
            json["itemListElement"][0]["name"],
            "</script><script>alert(1)</script> & co"
        );
    }

    #[test]
    fn links_at_bounds() {
        assert_eq!(
            page_links("/search", 1, 3, "&q=x"),
            PageLinks {
                prev: None,
                next: Some("/search?page=2&q=x".to_string())
            }
        );
        assert_eq!(
            page_links("/search", 3, 3, ""),
            PageLinks {
                prev: Some("/search?page=2".to_string()),
                next: None
            }
        );
        assert_eq!(page_links("/search", 1, 0, ""), PageLinks { prev: None, next: None });
    }
}
