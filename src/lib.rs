// Allow dead code for public API functions that may not be used internally
// but are part of the library's exposed interface
#![allow(dead_code)]

pub mod cli;
pub mod config;
pub mod logger;
pub mod name_resolver;
pub mod pipeline;
pub mod rate_limit;
pub mod record;
pub mod remote;
pub mod source;
pub mod store;
pub mod validator;
pub mod wayback;
pub mod worker;

pub use record::{Record, ValidDomains};
pub use store::JsonStore;

/// Create a headless Chrome browser instance.
/// Automatically disables sandbox when running inside a container
/// (detected via /.dockerenv or EDCLUB_ENRICHER_CONTAINER env var).
pub fn create_browser() -> anyhow::Result<headless_chrome::Browser> {
    let is_container = std::env::var("EDCLUB_ENRICHER_CONTAINER").is_ok()
        || std::path::Path::new("/.dockerenv").exists();

    if is_container {
        let options = headless_chrome::LaunchOptions::default_builder()
            .sandbox(false)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build Chrome launch options: {}", e))?;
        headless_chrome::Browser::new(options)
            .map_err(|e| anyhow::anyhow!("Failed to launch headless Chrome (container mode): {}", e))
    } else {
        headless_chrome::Browser::default()
            .map_err(|e| anyhow::anyhow!("Failed to launch headless Chrome: {}", e))
    }
}
