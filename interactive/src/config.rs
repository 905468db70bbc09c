//! Runtime configuration read from `<meta>` tags on the host page.
//!
//! | meta name                    | default                  |
//! |------------------------------|--------------------------|
//! | `rewear-auth-api`            | `http://localhost:8001`  |
//! | `rewear-product-api`         | `http://localhost:8002`  |
//! | `rewear-search-debounce-ms`  | `300`                    |
//! | `rewear-log`                 | `info`                   |

use std::time::Duration;

use thiserror::Error;
use web_sys::window;

pub const DEFAULT_AUTH_API: &str = "http://localhost:8001";
pub const DEFAULT_PRODUCT_API: &str = "http://localhost:8002";
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_LOG: &str = "info";

/// Upper bound so a typo cannot make search feel dead.
const MAX_SEARCH_DEBOUNCE_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} is not an http(s) URL: {value:?}")]
    InvalidUrl { name: &'static str, value: String },

    #[error("{name} must be milliseconds between 0 and {max}: {value:?}")]
    InvalidDuration {
        name: &'static str,
        value: String,
        max: u64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub auth_api: String,
    pub product_api: String,
    pub search_debounce: Duration,
    pub log: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            auth_api: DEFAULT_AUTH_API.to_string(),
            product_api: DEFAULT_PRODUCT_API.to_string(),
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            log: DEFAULT_LOG.to_string(),
        }
    }
}

fn meta_content(name: &str) -> Option<String> {
    let document = window()?.document()?;
    let el = document
        .query_selector(&format!("meta[name='{name}']"))
        .ok()
        .flatten()?;
    el.get_attribute("content")
}

fn base_url(name: &'static str, value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Err(ConfigError::InvalidUrl { name, value })
    }
}

impl AppConfig {
    /// Reads the host page. Invalid values keep their default and are
    /// returned so they can be logged once logging is up.
    pub fn from_document() -> (Self, Vec<ConfigError>) {
        Self::from_lookup(meta_content)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> (Self, Vec<ConfigError>) {
        let mut config = Self::default();
        let mut errors = Vec::new();
        let present = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(value) = present("rewear-auth-api") {
            match base_url("rewear-auth-api", value) {
                Ok(url) => config.auth_api = url,
                Err(e) => errors.push(e),
            }
        }
        if let Some(value) = present("rewear-product-api") {
            match base_url("rewear-product-api", value) {
                Ok(url) => config.product_api = url,
                Err(e) => errors.push(e),
            }
        }
        if let Some(value) = present("rewear-search-debounce-ms") {
            match value.trim().parse::<u64>() {
                Ok(ms) if ms <= MAX_SEARCH_DEBOUNCE_MS => {
                    config.search_debounce = Duration::from_millis(ms);
                }
                _ => errors.push(ConfigError::InvalidDuration {
                    name: "rewear-search-debounce-ms",
                    value,
                    max: MAX_SEARCH_DEBOUNCE_MS,
                }),
            }
        }
        if let Some(value) = present("rewear-log") {
            config.log = value.trim().to_string();
        }

        (config, errors)
    }
}
