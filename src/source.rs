//! Subdomain source-list parsing.
//!
//! The source is a newline-delimited list of candidate subdomains. Blank
//! lines and `#` comments are ignored, and known non-tenant names (www,
//! static, blog, ...) are filtered out via the configured denylist.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;

/// Parse a source file into the list of tenant subdomains, in file order,
/// with duplicates removed.
pub fn load_subdomains(path: &Path, denylist: &[String]) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read subdomain source file: {}", path.display()))?;
    Ok(parse_subdomains(&content, denylist))
}

/// Parse subdomains from source-list content.
pub fn parse_subdomains(content: &str, denylist: &[String]) -> Vec<String> {
    let denied: HashSet<&str> = denylist.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let mut subdomains = Vec::new();

    for line in content.lines() {
        let sub = line.trim();
        if sub.is_empty() || sub.starts_with('#') {
            continue;
        }
        if denied.contains(sub) {
            continue;
        }
        if seen.insert(sub.to_string()) {
            subdomains.push(sub.to_string());
        }
    }

    subdomains
}

#[cfg(test)]
mod tests {
    use super::*;

    fn denylist() -> Vec<String> {
        ["www", "s", "static", "blog"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let content = "alpha\n# infrastructure below\n\nbeta\n";
        let result = parse_subdomains(content, &[]);
        assert_eq!(result, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_parse_applies_denylist() {
        let content = "alpha\nwww\nstatic\nbeta\nblog";
        let result = parse_subdomains(content, &denylist());
        assert_eq!(result, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let content = "  alpha  \n\tbeta\n";
        let result = parse_subdomains(content, &[]);
        assert_eq!(result, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_parse_dedupes_preserving_order() {
        let content = "alpha\nbeta\nalpha\ngamma\nbeta";
        let result = parse_subdomains(content, &[]);
        assert_eq!(result, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_parse_empty_content() {
        assert!(parse_subdomains("", &denylist()).is_empty());
        assert!(parse_subdomains("# only comments\n\n", &denylist()).is_empty());
    }
}
