//! Record model for enriched tenant subdomains.
//!
//! One record per subdomain. Each enrichment phase fills its own fields
//! independently; re-running a phase on an already-enriched record is a no-op
//! because the `needs_*` predicates key off the phase's `*_at` / derived
//! fields, never off the data fields themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which of the two candidate hostnames answered the liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidDomains {
    Both,
    Typingclub,
    Edclub,
    #[serde(alias = "neither")]
    None,
}

impl ValidDomains {
    /// Derive the enum from the two probe booleans. Exhaustive and mutually
    /// exclusive over all four combinations.
    pub fn from_flags(typingclub: bool, edclub: bool) -> Self {
        match (typingclub, edclub) {
            (true, true) => ValidDomains::Both,
            (true, false) => ValidDomains::Typingclub,
            (false, true) => ValidDomains::Edclub,
            (false, false) => ValidDomains::None,
        }
    }
}

impl std::fmt::Display for ValidDomains {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidDomains::Both => write!(f, "both"),
            ValidDomains::Typingclub => write!(f, "typingclub"),
            ValidDomains::Edclub => write!(f, "edclub"),
            ValidDomains::None => write!(f, "none"),
        }
    }
}

fn default_source() -> String {
    "commoncrawl".to_string()
}

/// One enriched subdomain. `subdomain` is the unique, immutable key; every
/// other field is filled in by one of the enrichment phases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub subdomain: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_name: Option<String>,

    /// Provenance of the subdomain itself.
    #[serde(default = "default_source")]
    pub source: String,

    #[serde(default)]
    pub typingclub_valid: Option<bool>,

    #[serde(default)]
    pub edclub_valid: Option<bool>,

    /// Present if and only if `validated_at` is present.
    #[serde(default)]
    pub valid_domains: Option<ValidDomains>,

    #[serde(default)]
    pub validated_at: Option<DateTime<Utc>>,

    /// Earliest archived snapshot day (`YYYY-MM-DD`). `None` with
    /// `wayback_checked_at` set means "checked, no archive history".
    #[serde(default)]
    pub wayback_first: Option<String>,

    #[serde(default)]
    pub wayback_last: Option<String>,

    #[serde(default)]
    pub wayback_checked_at: Option<DateTime<Utc>>,
}

impl Record {
    pub fn new(subdomain: impl Into<String>) -> Self {
        Self {
            subdomain: subdomain.into(),
            school_name: None,
            source: default_source(),
            typingclub_valid: None,
            edclub_valid: None,
            valid_domains: None,
            validated_at: None,
            wayback_first: None,
            wayback_last: None,
            wayback_checked_at: None,
        }
    }

    /// A record needs the name phase until a non-empty name is stored.
    pub fn needs_name(&self) -> bool {
        self.school_name.as_deref().map_or(true, |n| n.is_empty())
    }

    /// Validation ran iff `validated_at` is set.
    pub fn needs_validation(&self) -> bool {
        self.validated_at.is_none()
    }

    /// The archive check is final once `wayback_checked_at` is set, even when
    /// both dates are null.
    pub fn needs_wayback(&self) -> bool {
        self.wayback_checked_at.is_none()
    }

    pub fn fully_enriched(&self) -> bool {
        !self.needs_name() && !self.needs_validation() && !self.needs_wayback()
    }

    /// Apply a liveness-probe outcome, stamping `validated_at`.
    pub fn apply_validation(&mut self, typingclub: bool, edclub: bool) {
        self.typingclub_valid = Some(typingclub);
        self.edclub_valid = Some(edclub);
        self.valid_domains = Some(ValidDomains::from_flags(typingclub, edclub));
        self.validated_at = Some(Utc::now());
    }

    /// Apply an archive-index result, stamping `wayback_checked_at`. Null
    /// dates are a valid, final "no archive history" answer.
    pub fn apply_wayback(&mut self, first: Option<String>, last: Option<String>) {
        self.wayback_first = first;
        self.wayback_last = last;
        self.wayback_checked_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_domains_derivation_exhaustive() {
        assert_eq!(ValidDomains::from_flags(true, true), ValidDomains::Both);
        assert_eq!(ValidDomains::from_flags(true, false), ValidDomains::Typingclub);
        assert_eq!(ValidDomains::from_flags(false, true), ValidDomains::Edclub);
        assert_eq!(ValidDomains::from_flags(false, false), ValidDomains::None);
    }

    #[test]
    fn test_valid_domains_serialized_tokens() {
        assert_eq!(serde_json::to_string(&ValidDomains::Both).unwrap(), "\"both\"");
        assert_eq!(serde_json::to_string(&ValidDomains::None).unwrap(), "\"none\"");

        // Rows written by the older worker used "neither" for the dead state.
        let legacy: ValidDomains = serde_json::from_str("\"neither\"").unwrap();
        assert_eq!(legacy, ValidDomains::None);
    }

    #[test]
    fn test_new_record_needs_everything() {
        let r = Record::new("lincoln");
        assert!(r.needs_name());
        assert!(r.needs_validation());
        assert!(r.needs_wayback());
        assert!(!r.fully_enriched());
        assert_eq!(r.source, "commoncrawl");
    }

    #[test]
    fn test_empty_name_still_needs_name_phase() {
        let mut r = Record::new("lincoln");
        r.school_name = Some(String::new());
        assert!(r.needs_name());

        r.school_name = Some("Lincoln Elementary".to_string());
        assert!(!r.needs_name());
    }

    #[test]
    fn test_validation_stamps_timestamp_and_enum() {
        let mut r = Record::new("lincoln");
        r.apply_validation(true, false);

        assert_eq!(r.typingclub_valid, Some(true));
        assert_eq!(r.edclub_valid, Some(false));
        assert_eq!(r.valid_domains, Some(ValidDomains::Typingclub));
        assert!(r.validated_at.is_some());
        assert!(!r.needs_validation());
    }

    #[test]
    fn test_null_wayback_dates_are_final() {
        let mut r = Record::new("lincoln");
        r.apply_wayback(None, None);

        assert!(r.wayback_first.is_none());
        assert!(r.wayback_last.is_none());
        assert!(r.wayback_checked_at.is_some());
        // Checked-with-no-data must not be re-scheduled.
        assert!(!r.needs_wayback());
    }

    #[test]
    fn test_camel_case_round_trip() {
        let mut r = Record::new("lincoln");
        r.school_name = Some("Lincoln Elementary".to_string());
        r.apply_validation(true, true);
        r.apply_wayback(Some("2019-03-04".to_string()), Some("2024-01-15".to_string()));

        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"schoolName\""));
        assert!(json.contains("\"validDomains\":\"both\""));
        assert!(json.contains("\"waybackFirst\":\"2019-03-04\""));

        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn test_minimal_json_deserializes() {
        // Records created before any enrichment phase ran.
        let r: Record = serde_json::from_str(r#"{"subdomain":"alpha"}"#).unwrap();
        assert_eq!(r.subdomain, "alpha");
        assert_eq!(r.source, "commoncrawl");
        assert!(r.needs_name() && r.needs_validation() && r.needs_wayback());
    }
}
