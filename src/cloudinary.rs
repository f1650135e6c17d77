// src/cloudinary.rs

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use moka::future::Cache;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::models::ImageRef;
use crate::state::CloudinaryConfig;

/// Admin API lookups accept at most this many public ids per call.
const MAX_IDS_PER_LOOKUP: usize = 100;

/// Maps opaque image refs to URLs the browser can load.
///
/// One call resolves one visible page. The output has the same length and order
/// as the input; a `None` entry means the image is missing or could not be
/// resolved and the page should show a placeholder. Implementations never fail.
#[async_trait]
pub trait ImageUrlResolver: Send + Sync {
    async fn resolve_batch(&self, refs: &[Option<ImageRef>]) -> Vec<Option<String>>;
}

#[derive(Debug, Deserialize)]
struct CloudinaryResource {
    public_id: String,
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryResourcesResponse {
    #[serde(default)]
    resources: Vec<CloudinaryResource>,
}

fn delivery_base(cloud_name: &str) -> String {
    format!("https://res.cloudinary.com/{}/image/upload/", cloud_name)
}

/// Parameter keys that open a delivery transformation segment such as `w_300,c_fill`.
const TRANSFORMATION_KEYS: &[&str] = &[
    "a", "ac", "ar", "b", "bo", "br", "c", "co", "cs", "d", "dl", "dn", "dpr", "du", "e",
    "eo", "f", "fl", "fn", "fps", "g", "h", "if", "ki", "l", "o", "p", "pg", "q", "r", "so",
    "sp", "t", "u", "vc", "vs", "w", "x", "y", "z",
];

fn is_version_segment(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('v')
        && segment[1..].chars().all(|c| c.is_ascii_digit())
}

fn is_transformation_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment.split(',').all(|param| {
            param
                .split_once('_')
                .is_some_and(|(key, value)| !value.is_empty() && TRANSFORMATION_KEYS.contains(&key))
        })
}

/// Extracts the public id from a full Cloudinary delivery URL, skipping any
/// transformation segments and the version.
pub fn extract_public_id_from_url(url: &str, cloud_name: &str) -> Option<String> {
    let remainder = url.strip_prefix(&delivery_base(cloud_name))?;
    let remainder = remainder.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = remainder.split('/').collect();

    // w_300,c_fill/v1746734489/souq/abc.jpg -> souq/abc.jpg
    let id_segments = match segments.iter().position(|s| is_version_segment(s)) {
        Some(version) => &segments[version + 1..],
        None => {
            let leading = segments
                .iter()
                .take(segments.len().saturating_sub(1))
                .take_while(|s| is_transformation_segment(s))
                .count();
            &segments[leading..]
        }
    };
    let path = id_segments.join("/");

    let public_id = path.rsplit_once('.').map_or(path.as_str(), |(id, _)| id);
    if public_id.is_empty() {
        None
    } else {
        Some(public_id.to_string())
    }
}

/// Resolves image refs through the Cloudinary Admin API, caching found URLs.
pub struct CloudinaryResolver {
    client: Client,
    config: CloudinaryConfig,
    api_base: String,
    url_cache: Cache<String, String>,
}

impl CloudinaryResolver {
    pub fn new(config: CloudinaryConfig, cache_ttl: Duration) -> Self {
        CloudinaryResolver {
            client: Client::new(),
            config,
            api_base: "https://api.cloudinary.com".to_string(),
            url_cache: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(cache_ttl)
                .build(),
        }
    }

    /// Public id for a stored ref. Older rows hold a full delivery URL instead.
    fn public_id_for(&self, image_ref: &ImageRef) -> Option<String> {
        let raw = image_ref.as_str().trim();
        if raw.is_empty() {
            return None;
        }
        if raw.starts_with("http://") || raw.starts_with("https://") {
            let extracted = extract_public_id_from_url(raw, &self.config.cloud_name);
            if extracted.is_none() {
                tracing::warn!("Image ref '{}' is not a Cloudinary delivery URL", raw);
            }
            return extracted;
        }
        Some(raw.to_string())
    }

    fn lookup_url(&self, public_ids: &[String]) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!(
            "{}/v1_1/{}/resources/image/upload",
            self.api_base, self.config.cloud_name
        ))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("max_results", &public_ids.len().to_string());
            for id in public_ids {
                query.append_pair("public_ids[]", id);
            }
        }
        Ok(url)
    }

    /// Looks up one chunk of public ids. Any failure is logged and yields an
    /// empty map, so every id in the chunk resolves to `None`.
    async fn fetch_chunk(&self, public_ids: &[String]) -> HashMap<String, String> {
        let url = match self.lookup_url(public_ids) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Cannot build Cloudinary lookup URL: {}", e);
                return HashMap::new();
            }
        };

        let response = self
            .client
            .get(url)
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                match resp.json::<CloudinaryResourcesResponse>().await {
                    Ok(body) => body
                        .resources
                        .into_iter()
                        .map(|r| (r.public_id, r.secure_url))
                        .collect(),
                    Err(e) => {
                        tracing::warn!("Cannot decode Cloudinary lookup response: {}", e);
                        HashMap::new()
                    }
                }
            }
            Ok(resp) => {
                let status = resp.status();
                let error_text = resp
                    .text()
                    .await
                    .unwrap_or_else(|_| "no error body".to_string());
                tracing::warn!(
                    "Cloudinary lookup failed for {} ids: status={}, body={}",
                    public_ids.len(),
                    status,
                    error_text
                );
                HashMap::new()
            }
            Err(e) => {
                tracing::warn!("Network error during Cloudinary lookup: {}", e);
                HashMap::new()
            }
        }
    }
}

#[async_trait]
impl ImageUrlResolver for CloudinaryResolver {
    async fn resolve_batch(&self, refs: &[Option<ImageRef>]) -> Vec<Option<String>> {
        let public_ids: Vec<Option<String>> = refs
            .iter()
            .map(|r| r.as_ref().and_then(|r| self.public_id_for(r)))
            .collect();

        let mut found: HashMap<String, String> = HashMap::new();
        let mut missing: Vec<String> = Vec::new();
        for id in public_ids.iter().flatten() {
            if found.contains_key(id) || missing.contains(id) {
                continue;
            }
            match self.url_cache.get(id).await {
                Some(url) => {
                    found.insert(id.clone(), url);
                }
                None => missing.push(id.clone()),
            }
        }

        tracing::debug!(
            "Resolving {} image refs: {} cached, {} to look up",
            refs.len(),
            found.len(),
            missing.len()
        );

        if !missing.is_empty() {
            let lookups = missing
                .chunks(MAX_IDS_PER_LOOKUP)
                .map(|chunk| self.fetch_chunk(chunk));
            for fetched in join_all(lookups).await {
                for (id, url) in fetched {
                    self.url_cache.insert(id.clone(), url.clone()).await;
                    found.insert(id, url);
                }
            }
        }

        match_resolved(&public_ids, &found)
    }
}

/// Lays resolved URLs back onto the requested ids, keeping their order.
fn match_resolved(
    public_ids: &[Option<String>],
    found: &HashMap<String, String>,
) -> Vec<Option<String>> {
    public_ids
        .iter()
        .map(|id| id.as_ref().and_then(|id| found.get(id).cloned()))
        .collect()
}
