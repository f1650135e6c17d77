// src/config.rs

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::AppError;
use crate::pagination::DEFAULT_PAGE_SIZE;
use crate::state::CloudinaryConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_IMAGE_URL_CACHE_TTL_SECS: u64 = 3600;

/// Settings read from the environment (and `.env`, loaded by `main`).
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub cloudinary: CloudinaryConfig,
    pub page_size: usize,
    pub image_url_cache_ttl: Duration,
    pub public_base_url: String,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, AppError> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AppError::Config(format!("{} must be set", key)))
        };

        let page_size: usize = parse_or(&lookup, "CATALOG_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(AppError::Config(
                "CATALOG_PAGE_SIZE must be greater than zero".to_string(),
            ));
        }

        Ok(AppConfig {
            database_url: required("DATABASE_URL")?,
            database_max_connections: parse_or(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_MAX_CONNECTIONS,
            )?,
            cloudinary: CloudinaryConfig {
                cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
                api_key: required("CLOUDINARY_API_KEY")?,
                api_secret: required("CLOUDINARY_API_SECRET")?,
            },
            page_size,
            image_url_cache_ttl: Duration::from_secs(parse_or(
                &lookup,
                "IMAGE_URL_CACHE_TTL_SECS",
                DEFAULT_IMAGE_URL_CACHE_TTL_SECS,
            )?),
            public_base_url: lookup("PUBLIC_BASE_URL")
                .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            bind_addr: parse_or(
                &lookup,
                "BIND_ADDR",
                SocketAddr::from_str(DEFAULT_BIND_ADDR)
                    .map_err(|e| AppError::Config(e.to_string()))?,
            )?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| AppError::Config(format!("{} is invalid ({}): {}", key, raw, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/souq"),
            ("CLOUDINARY_CLOUD_NAME", "souq"),
            ("CLOUDINARY_API_KEY", "key"),
            ("CLOUDINARY_API_SECRET", "secret"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<AppConfig, AppError> {
        AppConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_apply() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.page_size, 12);
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.image_url_cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.public_base_url, "http://localhost:3000");
    }

    #[test]
    fn missing_required_key_is_reported() {
        let mut env = base_env();
        env.remove("CLOUDINARY_API_SECRET");
        match load(&env) {
            Err(AppError::Config(msg)) => assert!(msg.contains("CLOUDINARY_API_SECRET")),
            _ => panic!("expected a configuration error"),
        }
    }

    #[test]
    fn invalid_and_zero_page_size_are_rejected() {
        let mut env = base_env();
        env.insert("CATALOG_PAGE_SIZE", "twelve");
        assert!(matches!(load(&env), Err(AppError::Config(_))));
        env.insert("CATALOG_PAGE_SIZE", "0");
        assert!(matches!(load(&env), Err(AppError::Config(_))));
    }

    #[test]
    fn overrides_are_parsed() {
        let mut env = base_env();
        env.insert("CATALOG_PAGE_SIZE", "24");
        env.insert("BIND_ADDR", "127.0.0.1:8080");
        env.insert("PUBLIC_BASE_URL", "https://souq.example/");
        let config = load(&env).unwrap();
        assert_eq!(config.page_size, 24);
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.public_base_url, "https://souq.example");
    }
}
