//! School-name resolution from live tenant pages.
//!
//! Extracts a display name from a tenant's site using, in priority order:
//! - A heading whose class marks it as the school-name label
//! - The page title, with platform boilerplate suffixes stripped
//! - OpenGraph site-name / title meta tags
//! - Any top-level heading that survives the plausibility gates
//!
//! Two fetch strategies exist: a lightweight raw-HTML fetch (default) and a
//! headless-browser strategy for tenants whose heading is rendered by
//! client-side script.

use anyhow::{anyhow, Result};
use regex::Regex;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;

use crate::config::AppConfig;

/// Resolves school names by fetching tenant pages over plain HTTP.
pub struct NameResolver {
    client: reqwest::Client,
    /// Candidate base domains in lookup order.
    candidates: Vec<String>,
}

impl NameResolver {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http.page_timeout_secs))
            .user_agent(config.http.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        // The secondary hosting domain goes first: its tenant pages carry
        // the school name more often.
        Ok(Self {
            client,
            candidates: vec![config.domains.secondary.clone(), config.domains.primary.clone()],
        })
    }

    /// Resolve a display name for the subdomain, trying each candidate
    /// hosting domain in order. Returns `None` when no plausible name was
    /// found on either; per-candidate failures are swallowed.
    pub async fn resolve(&self, subdomain: &str) -> Option<String> {
        let urls: Vec<String> = self
            .candidates
            .iter()
            .map(|base| format!("https://{}.{}/", subdomain, base))
            .collect();
        self.resolve_urls(&urls, subdomain).await
    }

    /// Resolve from an explicit URL list (one per candidate domain).
    pub async fn resolve_urls(&self, urls: &[String], subdomain: &str) -> Option<String> {
        for url in urls {
            match self.fetch_page(url).await {
                Ok(html) => {
                    if let Some(name) = extract_school_name(&html, subdomain) {
                        debug!("Resolved {} via {}: {}", subdomain, url, name);
                        return Some(name);
                    }
                }
                Err(e) => {
                    debug!("Fetch failed for {}: {}", url, e);
                }
            }
        }
        None
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        if response.status() != reqwest::StatusCode::OK {
            return Err(anyhow!("Non-200 status {} for {}", response.status(), url));
        }
        Ok(response.text().await?)
    }
}

/// Resolves school names through a shared headless browser, for tenant pages
/// that inject their heading via client-side script.
pub struct BrowserResolver<'a> {
    browser: &'a headless_chrome::Browser,
    candidates: Vec<String>,
    settle: Duration,
}

impl<'a> BrowserResolver<'a> {
    pub fn new(browser: &'a headless_chrome::Browser, config: &AppConfig) -> Self {
        Self {
            browser,
            candidates: vec![config.domains.secondary.clone(), config.domains.primary.clone()],
            settle: Duration::from_millis(config.browser.settle_ms),
        }
    }

    /// Navigate a fresh tab to each candidate hostname and extract from the
    /// rendered DOM. The tab is torn down when it drops; the browser process
    /// is reused for the whole run.
    pub fn resolve(&self, subdomain: &str) -> Option<String> {
        for base in &self.candidates {
            let url = format!("https://{}.{}/", subdomain, base);
            match self.fetch_rendered(&url) {
                Ok(html) => {
                    if let Some(name) = extract_school_name(&html, subdomain) {
                        return Some(name);
                    }
                }
                Err(e) => {
                    debug!("Browser fetch failed for {}: {}", url, e);
                }
            }
        }
        None
    }

    fn fetch_rendered(&self, url: &str) -> Result<String> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| anyhow!("Failed to create browser tab: {}", e))?;

        tab.navigate_to(url)
            .map_err(|e| anyhow!("Failed to navigate to {}: {}", url, e))?;
        tab.wait_until_navigated()
            .map_err(|e| anyhow!("Page failed to load for {}: {}", url, e))?;

        // Wait for client-side rendering to settle before reading the DOM.
        std::thread::sleep(self.settle);

        tab.get_content()
            .map_err(|e| anyhow!("Failed to get page content for {}: {}", url, e))
    }
}

/// Extract a school name from page HTML. Heuristics run in priority order;
/// the first plausible match wins.
pub fn extract_school_name(html: &str, subdomain: &str) -> Option<String> {
    let document = Html::parse_document(html);

    // 1. A heading explicitly labeled as the school name
    if let Some(name) = extract_labeled_heading(&document) {
        return Some(name);
    }

    // 2. Page title with platform suffixes stripped
    if let Some(name) = extract_from_title(&document, subdomain) {
        return Some(name);
    }

    // 3. OpenGraph site-name / title meta tags
    if let Some(name) = extract_from_og_meta(&document) {
        return Some(name);
    }

    // 4. Any top-level heading
    if let Some(name) = extract_any_heading(&document) {
        return Some(name);
    }

    None
}

fn extract_labeled_heading(document: &Html) -> Option<String> {
    for sel_str in ["h1.school-name", ".school-name", "[class*=\"school\"]"] {
        let selector = Selector::parse(sel_str).ok()?;
        for element in document.select(&selector) {
            let text = collapse_whitespace(&element.text().collect::<String>());
            if is_plausible_name(&text) {
                return Some(text);
            }
        }
    }
    None
}

fn extract_from_title(document: &Html, subdomain: &str) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let title = document.select(&selector).next()?.text().collect::<String>();
    let cleaned = strip_platform_suffix(title.trim());

    if cleaned.len() > 2 && cleaned != subdomain && is_plausible_name(&cleaned) {
        return Some(cleaned);
    }
    None
}

fn extract_from_og_meta(document: &Html) -> Option<String> {
    for property in ["og:site_name", "og:title"] {
        let selector = Selector::parse(&format!(r#"meta[property="{}"]"#, property)).ok()?;
        if let Some(content) = document
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr("content"))
        {
            let cleaned = strip_platform_suffix(content.trim());
            if cleaned.len() > 2 && is_plausible_name(&cleaned) {
                return Some(cleaned);
            }
        }
    }
    None
}

fn extract_any_heading(document: &Html) -> Option<String> {
    let selector = Selector::parse("h1").ok()?;
    for element in document.select(&selector) {
        let text = collapse_whitespace(&element.text().collect::<String>());
        if is_plausible_name(&text) {
            return Some(text);
        }
    }
    None
}

/// Strip the platform name and login/portal boilerplate from the end of a
/// title-like string: "Lincoln Elementary - TypingClub" -> "Lincoln
/// Elementary".
fn strip_platform_suffix(text: &str) -> String {
    let mut cleaned = text.trim().to_string();

    if let Ok(suffix) = Regex::new(r"(?i)\s*[-–—|:]\s*(TypingClub|EdClub|Login|Portal).*$") {
        cleaned = suffix.replace(&cleaned, "").to_string();
    }
    if let Ok(trailing) = Regex::new(r"(?i)\s*(TypingClub|EdClub)\s*$") {
        cleaned = trailing.replace(&cleaned, "").to_string();
    }

    cleaned.trim().to_string()
}

/// Plausibility gate shared by all heuristics: length bounds plus a reject
/// list of login/placeholder phrases the platform serves on non-customized
/// pages.
fn is_plausible_name(text: &str) -> bool {
    let text = text.trim();

    if text.len() < 3 || text.len() > 100 {
        return false;
    }

    let lower = text.to_lowercase();
    let boilerplate = [
        "login",
        "sign in",
        "sign up",
        "portal",
        "welcome",
        "loading",
        "please wait",
        "redirecting",
        "learn, teach",
        "typing practice",
        "404",
        "page not found",
    ];

    !boilerplate.iter().any(|b| lower.contains(b))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}
