//! Core domain model for the CloserJobs collection pipeline.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const CRATE_NAME: &str = "closer-core";

/// Canonical location sentinel for fully remote postings.
pub const REMOTE_LOCATION: &str = "remote";
/// Canonical location sentinel when the source supplied no location at all.
/// Distinct from [`REMOTE_LOCATION`]: "we don't know" is not "remote".
pub const UNKNOWN_LOCATION: &str = "unknown";
/// Display company name when the source omitted one.
pub const UNKNOWN_COMPANY: &str = "Unknown Company";

/// Job board a listing was collected from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Source {
    Linkedin,
    Indeed,
    Glassdoor,
    ZipRecruiter,
    #[default]
    Direct,
}

impl Source {
    /// Map a collector site name onto a [`Source`]. Unknown boards are
    /// treated as direct submissions rather than rejected.
    pub fn from_site(site: &str) -> Self {
        match site.trim().to_ascii_lowercase().as_str() {
            "linkedin" => Self::Linkedin,
            "indeed" => Self::Indeed,
            "glassdoor" => Self::Glassdoor,
            "zip_recruiter" | "ziprecruiter" => Self::ZipRecruiter,
            _ => Self::Direct,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linkedin => "LINKEDIN",
            Self::Indeed => "INDEED",
            Self::Glassdoor => "GLASSDOOR",
            Self::ZipRecruiter => "ZIPRECRUITER",
            Self::Direct => "DIRECT",
        }
    }
}

/// One listing exactly as a source adapter handed it over.
///
/// No invariants hold here: any field may be missing, empty, or malformed.
/// Structural validity (title + source id present) is checked by the
/// pipeline, everything else degrades field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawListing {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub salary_text: Option<String>,
    #[serde(default)]
    pub posted_at_text: Option<String>,
    pub source: Source,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayFrequency {
    Hourly,
    Yearly,
    #[default]
    Unspecified,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    #[default]
    Unspecified,
}

/// Structured facts pulled out of a raw listing's free text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFacts {
    pub salary_min: Option<u32>,
    pub salary_max: Option<u32>,
    pub frequency: PayFrequency,
    pub commission: bool,
    pub employment_type: EmploymentType,
}

impl ExtractedFacts {
    /// Facts with every field degraded to its unspecified default.
    pub fn unspecified() -> Self {
        Self::default()
    }

    /// Both salary bounds, ordered, when both were extracted.
    pub fn salary_bounds(&self) -> Option<(u32, u32)> {
        match (self.salary_min, self.salary_max) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        }
    }
}

/// Deterministic dedup identity derived from a fixed subset of canonical
/// fields (folded title, folded company, normalized location). Hash-based
/// heuristic: equal fields always collide on purpose, distinct fields
/// collide with negligible probability.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn from_hex(hex_digest: String) -> Self {
        Self(hex_digest)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprints of every record accepted in prior runs.
///
/// Owned by the storage collaborator; the pipeline receives a snapshot by
/// value and returns the updated set, it never mutates shared state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeenFingerprintSet(BTreeSet<Fingerprint>);

impl SeenFingerprintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.0.contains(fingerprint)
    }

    /// Returns true when the fingerprint was not already present.
    pub fn insert(&mut self, fingerprint: Fingerprint) -> bool {
        self.0.insert(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fingerprint> {
        self.0.iter()
    }
}

impl FromIterator<Fingerprint> for SeenFingerprintSet {
    fn from_iter<I: IntoIterator<Item = Fingerprint>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Normalized, structurally valid representation of one posting.
///
/// Created once per raw listing and immutable afterwards: it is either
/// emitted as new or discarded as a duplicate, never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Display title: whitespace-collapsed, original casing retained.
    pub title: String,
    /// Comparison form of the title; feeds the fingerprint.
    pub title_folded: String,
    pub company: String,
    pub company_folded: String,
    /// Normalized location, or the `remote`/`unknown` sentinels.
    pub location: String,
    pub description: String,
    /// Requirements section sliced out of the description, when one exists.
    pub requirements: Option<String>,
    pub facts: ExtractedFacts,
    pub source: Source,
    pub source_id: String,
    pub url: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub fingerprint: Fingerprint,
}
