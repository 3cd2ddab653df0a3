//! Domain liveness validation.
//!
//! A tenant site may answer under either candidate hostname. Each hostname
//! gets an independent HEAD probe (following redirects); only an exact 200
//! counts as alive, and every error or timeout degrades to `false` rather
//! than aborting the window.

use anyhow::Result;
use std::time::Duration;
use tracing::debug;

use crate::config::AppConfig;
use crate::record::ValidDomains;

/// Outcome of probing both candidate hostnames for one subdomain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub typingclub_valid: bool,
    pub edclub_valid: bool,
    pub valid_domains: ValidDomains,
}

pub struct DomainValidator {
    client: reqwest::Client,
    primary: String,
    secondary: String,
}

impl DomainValidator {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http.probe_timeout_secs))
            .user_agent(config.http.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            primary: config.domains.primary.clone(),
            secondary: config.domains.secondary.clone(),
        })
    }

    /// Probe both candidate hostnames concurrently.
    pub async fn validate(&self, subdomain: &str) -> ValidationOutcome {
        let primary_url = format!("https://{}.{}/", subdomain, self.primary);
        let secondary_url = format!("https://{}.{}/", subdomain, self.secondary);

        let (typingclub_valid, edclub_valid) =
            futures::join!(self.probe(&primary_url), self.probe(&secondary_url));

        ValidationOutcome {
            typingclub_valid,
            edclub_valid,
            valid_domains: ValidDomains::from_flags(typingclub_valid, edclub_valid),
        }
    }

    /// HEAD probe a single URL. Valid iff the final response status is
    /// exactly 200.
    pub async fn probe(&self, url: &str) -> bool {
        match self.client.head(url).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                debug!("Probe failed for {}: {}", url, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_derivation_matches_flags() {
        for (tc, ec, expected) in [
            (true, true, ValidDomains::Both),
            (true, false, ValidDomains::Typingclub),
            (false, true, ValidDomains::Edclub),
            (false, false, ValidDomains::None),
        ] {
            assert_eq!(ValidDomains::from_flags(tc, ec), expected);
        }
    }
}
