//! Normalization and deduplication pipeline for collected job listings.
//!
//! The core stages are pure, synchronous functions over in-memory values:
//! extract -> normalize -> fingerprint -> dedupe. State (the seen-fingerprint
//! snapshot) is passed in by value and handed back updated; persistence and
//! fetching live in the surrounding crates. `run_collection_once` composes a
//! full collection cycle around the pure core.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use closer_core::{
    CanonicalRecord, EmploymentType, ExtractedFacts, Fingerprint, PayFrequency, RawListing,
    SeenFingerprintSet, Source, REMOTE_LOCATION, UNKNOWN_COMPANY, UNKNOWN_LOCATION,
};
use closer_ingest::load_board_export;
use closer_storage::{sha256_hex, write_atomic, SeenSetStore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

pub const CRATE_NAME: &str = "closer-pipeline";

// ---------------------------------------------------------------------------
// Field extraction
// ---------------------------------------------------------------------------

/// Salary values outside this range are extraction noise (a lone "1" from a
/// bullet list, a phone number) and degrade to unspecified.
const MIN_PLAUSIBLE_AMOUNT: f64 = 1.0;
const MAX_PLAUSIBLE_AMOUNT: f64 = 10_000_000.0;

/// Magnitude tie-break: when no period cue is present, an amount at or above
/// this floor is read as a yearly figure and anything below it as hourly.
/// Nobody in this niche advertises $80,000/hr or $25/yr.
const YEARLY_MAGNITUDE_FLOOR: f64 = 1000.0;

/// Period cues, first match wins in listed order.
const FREQUENCY_RULES: &[(&str, PayFrequency)] = &[
    ("/hr", PayFrequency::Hourly),
    ("/hour", PayFrequency::Hourly),
    ("per hour", PayFrequency::Hourly),
    ("an hour", PayFrequency::Hourly),
    ("hourly", PayFrequency::Hourly),
    ("/yr", PayFrequency::Yearly),
    ("/year", PayFrequency::Yearly),
    ("per year", PayFrequency::Yearly),
    ("per annum", PayFrequency::Yearly),
    ("a year", PayFrequency::Yearly),
    ("annually", PayFrequency::Yearly),
    ("annual", PayFrequency::Yearly),
    ("yearly", PayFrequency::Yearly),
];

/// Commission vocabulary, matched on word boundaries: "remote" must never
/// light up on its embedded "ote".
const COMMISSION_CUES: &[&str] = &[
    "commission",
    "ote",
    "on target earnings",
    "on-target earnings",
    "uncapped",
    "bonus structure",
];

const EMPLOYMENT_RULES: &[(&str, EmploymentType)] = &[
    ("contract", EmploymentType::Contract),
    ("contractor", EmploymentType::Contract),
    ("1099", EmploymentType::Contract),
    ("freelance", EmploymentType::Contract),
    ("part-time", EmploymentType::PartTime),
    ("part time", EmploymentType::PartTime),
    ("full-time", EmploymentType::FullTime),
    ("full time", EmploymentType::FullTime),
    ("fulltime", EmploymentType::FullTime),
];

const REMOTE_CUES: &[&str] = &["remote", "work from home", "wfh", "anywhere"];

/// Parse a raw listing's free text into structured facts.
///
/// Total function: any field that cannot be parsed degrades to its
/// unspecified default, malformed text never fails the record.
pub fn extract(raw: &RawListing) -> ExtractedFacts {
    let (salary_min, salary_max, frequency) = extract_salary(raw);

    let haystack = format!(
        "{} {}",
        raw.title.as_deref().unwrap_or_default(),
        raw.description.as_deref().unwrap_or_default()
    )
    .to_ascii_lowercase();

    let commission = COMMISSION_CUES
        .iter()
        .any(|cue| contains_word(&haystack, cue));

    ExtractedFacts {
        salary_min,
        salary_max,
        frequency,
        commission,
        employment_type: resolve_employment(&haystack),
    }
}

/// Salary search order: the dedicated salary field, then the description,
/// then the title (postings in this niche routinely put the range there).
/// Free text only yields bounds from an adjacent range pair; the dedicated
/// salary field may also yield a single amount.
fn extract_salary(raw: &RawListing) -> (Option<u32>, Option<u32>, PayFrequency) {
    let candidates = [
        (raw.salary_text.as_deref(), true),
        (raw.description.as_deref(), false),
        (raw.title.as_deref(), false),
    ];
    for (text, allow_single) in candidates {
        if let Some(text) = text {
            if let Some((min, max, frequency)) = salary_from_text(text, allow_single) {
                return (Some(min), Some(max), frequency);
            }
        }
    }
    (None, None, PayFrequency::Unspecified)
}

#[derive(Debug, Clone, Copy)]
struct Amount {
    value: f64,
    start: usize,
    end: usize,
}

fn salary_from_text(text: &str, allow_single: bool) -> Option<(u32, u32, PayFrequency)> {
    let lower = text.to_ascii_lowercase();
    if !has_salary_cue(&lower) {
        return None;
    }

    let amounts: Vec<Amount> = scan_amounts(text)
        .into_iter()
        .filter(|a| a.value >= MIN_PLAUSIBLE_AMOUNT && a.value <= MAX_PLAUSIBLE_AMOUNT)
        .collect();

    let (min, max) = if let Some(range) = find_range(text, &amounts) {
        range
    } else if allow_single {
        let single = amounts.first()?.value;
        (single, single)
    } else {
        return None;
    };

    let frequency = resolve_frequency(&lower, min);
    Some((min.round() as u32, max.round() as u32, frequency))
}

fn has_salary_cue(lower: &str) -> bool {
    lower.contains('$')
        || contains_word(lower, "usd")
        || FREQUENCY_RULES.iter().any(|(cue, _)| lower.contains(cue))
        || has_k_amount(lower)
}

/// A digit immediately followed by a standalone `k` ("80k") counts as a
/// currency cue even without a dollar sign.
fn has_k_amount(lower: &str) -> bool {
    let chars: Vec<char> = lower.chars().collect();
    chars.windows(2).enumerate().any(|(i, pair)| {
        pair[0].is_ascii_digit()
            && pair[1] == 'k'
            && chars.get(i + 2).is_none_or(|c| !c.is_alphanumeric())
    })
}

/// Scan every numeric amount in the text, honoring comma grouping, a single
/// decimal point, and a `k`/`K` thousands suffix.
fn scan_amounts(text: &str) -> Vec<Amount> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut amounts = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].1.is_ascii_digit() {
            i += 1;
            continue;
        }

        let start = chars[i].0;
        let mut digits = String::new();
        let mut seen_dot = false;
        while i < chars.len() {
            let c = chars[i].1;
            if c.is_ascii_digit() {
                digits.push(c);
                i += 1;
            } else if c == ','
                && i + 3 < chars.len()
                && chars[i + 1..=i + 3].iter().all(|(_, d)| d.is_ascii_digit())
                && chars.get(i + 4).is_none_or(|(_, d)| !d.is_ascii_digit())
            {
                // grouping comma: 80,000 but not 80,0001
                i += 1;
            } else if c == '.'
                && !seen_dot
                && chars.get(i + 1).is_some_and(|(_, d)| d.is_ascii_digit())
            {
                digits.push('.');
                seen_dot = true;
                i += 1;
            } else {
                break;
            }
        }

        let Ok(mut value) = digits.parse::<f64>() else {
            continue;
        };

        if i < chars.len()
            && (chars[i].1 == 'k' || chars[i].1 == 'K')
            && chars.get(i + 1).is_none_or(|(_, c)| !c.is_alphanumeric())
        {
            value *= 1000.0;
            i += 1;
        }

        let end = chars.get(i).map(|(pos, _)| *pos).unwrap_or(text.len());
        amounts.push(Amount { value, start, end });
    }

    amounts
}

/// Two amounts separated only by a dash or "to" (dollar signs and whitespace
/// ignored) form a range; bounds come back ordered so min <= max holds even
/// for "$120k - $80k" style typos.
fn find_range(text: &str, amounts: &[Amount]) -> Option<(f64, f64)> {
    for pair in amounts.windows(2) {
        let between: String = text[pair[0].end..pair[1].start]
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '$')
            .collect::<String>()
            .to_ascii_lowercase();
        if matches!(between.as_str(), "-" | "\u{2013}" | "\u{2014}" | "to") {
            let (a, b) = (pair[0].value, pair[1].value);
            return Some((a.min(b), a.max(b)));
        }
    }
    None
}

fn resolve_frequency(lower: &str, representative_amount: f64) -> PayFrequency {
    for (cue, frequency) in FREQUENCY_RULES {
        if lower.contains(cue) {
            return *frequency;
        }
    }
    if representative_amount >= YEARLY_MAGNITUDE_FLOOR {
        PayFrequency::Yearly
    } else {
        PayFrequency::Hourly
    }
}

/// Exactly one matched category wins; zero matches or cues from more than
/// one category resolve to Unspecified. Conflict is a tie-break, not an
/// error.
fn resolve_employment(haystack: &str) -> EmploymentType {
    let mut matched: Vec<EmploymentType> = Vec::new();
    for (cue, outcome) in EMPLOYMENT_RULES {
        if contains_word(haystack, cue) && !matched.contains(outcome) {
            matched.push(*outcome);
        }
    }
    match matched.as_slice() {
        [only] => *only,
        _ => EmploymentType::Unspecified,
    }
}

/// Substring match with word boundaries on both ends. Both inputs are
/// expected lowercase; all cue vocabularies here are ASCII.
fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let mut search_from = 0;
    while let Some(offset) = haystack[search_from..].find(needle) {
        let start = search_from + offset;
        let end = start + needle.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        search_from = end;
    }
    false
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

const REMOTE_US: &str = "remote-us";
const REMOTE_WORLDWIDE: &str = "remote-worldwide";

const REQUIREMENT_HEADERS: &[&str] = &[
    "requirements:",
    "qualifications:",
    "what we're looking for:",
    "you have:",
    "must have:",
    "required:",
];

const REQUIREMENT_TERMINATORS: &[&str] =
    &["responsibilities", "about us", "benefits", "what we offer"];

/// Canonicalize a raw listing. Total function: sparse fields become the
/// documented sentinels, never an error. The fingerprint is computed as the
/// final construction step and the record is immutable afterwards.
pub fn normalize(raw: &RawListing, facts: ExtractedFacts) -> CanonicalRecord {
    let title = clean_text(raw.title.as_deref().unwrap_or_default());
    let title_folded = title.to_lowercase();

    let company = {
        let cleaned = clean_text(raw.company.as_deref().unwrap_or_default());
        if cleaned.is_empty() {
            UNKNOWN_COMPANY.to_string()
        } else {
            cleaned
        }
    };
    let company_folded = company.to_lowercase();

    let location = normalize_location(raw.location.as_deref());
    let description = clean_text(raw.description.as_deref().unwrap_or_default());
    let requirements = extract_requirements(&description);
    let fingerprint = fingerprint_parts(&title_folded, &company_folded, &location);

    CanonicalRecord {
        title,
        title_folded,
        company,
        company_folded,
        location,
        description,
        requirements,
        facts,
        source: raw.source,
        source_id: raw.source_id.clone().unwrap_or_default(),
        url: raw.url.clone(),
        posted_at: parse_posted_at(raw.posted_at_text.as_deref()),
        fingerprint,
    }
}

/// Strip HTML tags and collapse whitespace runs, keeping original casing.
fn clean_text(text: &str) -> String {
    let mut without_tags = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                without_tags.push(' ');
            }
            _ if !in_tag => without_tags.push(c),
            _ => {}
        }
    }
    without_tags.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remote-indicator text canonicalizes to the remote sentinel (with US /
/// worldwide qualifiers when present); missing location is the distinct
/// unknown sentinel; anything else is lowercased with comma segments
/// re-spaced.
fn normalize_location(location: Option<&str>) -> String {
    let cleaned = clean_text(location.unwrap_or_default());
    if cleaned.is_empty() {
        return UNKNOWN_LOCATION.to_string();
    }

    let lower = cleaned.to_ascii_lowercase();
    if REMOTE_CUES.iter().any(|cue| contains_word(&lower, cue)) {
        if ["worldwide", "global"].iter().any(|q| contains_word(&lower, q)) {
            return REMOTE_WORLDWIDE.to_string();
        }
        if ["us", "usa", "united states"]
            .iter()
            .any(|q| contains_word(&lower, q))
        {
            return REMOTE_US.to_string();
        }
        return REMOTE_LOCATION.to_string();
    }

    lower
        .split(',')
        .map(|segment| segment.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Slice the requirements section out of a cleaned description, from a known
/// header up to the next section heading.
fn extract_requirements(description: &str) -> Option<String> {
    let lower = description.to_ascii_lowercase();
    let start = REQUIREMENT_HEADERS
        .iter()
        .filter_map(|header| lower.find(header))
        .min()?;
    let tail = &lower[start..];
    let end = REQUIREMENT_TERMINATORS
        .iter()
        .filter_map(|terminator| tail.find(terminator))
        .min()
        .unwrap_or(tail.len());

    let slice = description[start..start + end].trim();
    if slice.is_empty() {
        None
    } else {
        Some(slice.to_string())
    }
}

fn parse_posted_at(text: Option<&str>) -> Option<DateTime<Utc>> {
    let text = text?.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(parsed.and_utc());
        }
    }
    for format in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(parsed) = NaiveDate::parse_from_str(text, format) {
            return parsed.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Fingerprinting
// ---------------------------------------------------------------------------

/// Identity is deliberately only (folded title, folded company, normalized
/// location): the same posting cross-posted to several boards arrives with
/// different descriptions, salary text, and source ids, but those three
/// fields stay put. Recall over precision; two genuinely distinct postings
/// sharing all three will merge, which is accepted.
pub fn fingerprint(record: &CanonicalRecord) -> Fingerprint {
    fingerprint_parts(&record.title_folded, &record.company_folded, &record.location)
}

fn fingerprint_parts(title_folded: &str, company_folded: &str, location: &str) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(format!("{title_folded}|{company_folded}|{location}").as_bytes());
    Fingerprint::from_hex(hex::encode(hasher.finalize()))
}

// ---------------------------------------------------------------------------
// Deduplication
// ---------------------------------------------------------------------------

/// Partition a canonical batch into new records and discarded duplicates.
///
/// Input order is preserved and first occurrence wins, including within the
/// batch itself. Returns the union seen-set (old plus newly accepted) for
/// the caller to persist; running the same batch twice against the returned
/// set yields nothing new.
pub fn dedupe(
    records: Vec<CanonicalRecord>,
    seen: SeenFingerprintSet,
) -> (Vec<CanonicalRecord>, SeenFingerprintSet) {
    let mut updated_seen = seen;
    let mut new_records = Vec::new();
    for record in records {
        if updated_seen.insert(record.fingerprint.clone()) {
            new_records.push(record);
        } else {
            debug!(
                fingerprint = %record.fingerprint,
                title = %record.title,
                source = record.source.as_str(),
                "discarding duplicate listing"
            );
        }
    }
    (new_records, updated_seen)
}

// ---------------------------------------------------------------------------
// Pipeline orchestration
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct RunOutcome {
    pub new_records: Vec<CanonicalRecord>,
    pub updated_seen: SeenFingerprintSet,
    /// Listings excluded for missing identity fields (title or source id).
    pub skipped_records: usize,
}

/// One pipeline pass over a raw batch: extract and normalize each record,
/// then dedupe the whole batch against the supplied seen snapshot.
///
/// A single record's anomalies never short-circuit the batch: malformed
/// text degrades in place, and only records without identity fields are
/// skipped (counted, logged, not fatal). An empty batch is not an error.
pub fn run(raw_batch: &[RawListing], seen: SeenFingerprintSet) -> RunOutcome {
    let mut canonical = Vec::with_capacity(raw_batch.len());
    let mut skipped_records = 0usize;

    for raw in raw_batch {
        if !has_identity(raw) {
            skipped_records += 1;
            warn!(
                source = raw.source.as_str(),
                title = raw.title.as_deref().unwrap_or("<missing>"),
                "skipping listing without identity fields"
            );
            continue;
        }
        let facts = extract(raw);
        canonical.push(normalize(raw, facts));
    }

    let (new_records, updated_seen) = dedupe(canonical, seen);
    RunOutcome {
        new_records,
        updated_seen,
        skipped_records,
    }
}

fn has_identity(raw: &RawListing) -> bool {
    raw.title.as_deref().is_some_and(|t| !t.trim().is_empty())
        && raw.source_id.as_deref().is_some_and(|s| !s.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Collection-run composition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CollectConfig {
    pub workspace_root: PathBuf,
    pub seen_path: PathBuf,
    pub reports_dir: PathBuf,
}

impl CollectConfig {
    pub fn from_env() -> Self {
        let workspace_root = std::env::var("CLOSERJOBS_WORKSPACE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        Self::for_workspace_root(workspace_root)
    }

    pub fn for_workspace_root(workspace_root: impl Into<PathBuf>) -> Self {
        let workspace_root = workspace_root.into();
        let seen_path = std::env::var("CLOSERJOBS_SEEN_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| workspace_root.join("seen/fingerprints.json"));
        let reports_dir = std::env::var("CLOSERJOBS_REPORTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| workspace_root.join("reports"));
        Self {
            workspace_root,
            seen_path,
            reports_dir,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceRegistry {
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub source_id: String,
    pub display_name: String,
    pub enabled: bool,
    /// Collector export file, relative to the workspace root.
    pub export: PathBuf,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionRunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub enabled_sources: usize,
    pub collected_listings: usize,
    pub new_records: usize,
    pub duplicate_records: usize,
    pub skipped_records: usize,
    pub seen_fingerprints: usize,
    pub reports_dir: String,
}

/// One full collection cycle: registry -> board exports -> pipeline core ->
/// persisted seen set + run report.
///
/// A source whose export file is missing or unparsable is logged and
/// skipped; the cycle continues with the remaining boards.
pub async fn run_collection_once(config: &CollectConfig) -> Result<CollectionRunSummary> {
    let started_at = Utc::now();
    let run_id = Uuid::new_v4();

    let registry = load_source_registry(&config.workspace_root).await?;
    let enabled_sources: Vec<_> = registry.sources.into_iter().filter(|s| s.enabled).collect();

    let mut raw_batch = Vec::new();
    for source in &enabled_sources {
        let export_path = config.workspace_root.join(&source.export);
        match load_board_export(&export_path, Source::from_site(&source.source_id)) {
            Ok(listings) => {
                debug!(
                    source_id = %source.source_id,
                    listings = listings.len(),
                    "loaded board export"
                );
                raw_batch.extend(listings);
            }
            Err(err) => {
                warn!(source_id = %source.source_id, error = %err, "skipping board export");
            }
        }
    }

    let seen_store = SeenSetStore::new(&config.seen_path);
    let seen = seen_store.load().await?;

    let collected_listings = raw_batch.len();
    let outcome = run(&raw_batch, seen);
    seen_store.persist(&outcome.updated_seen).await?;

    let finished_at = Utc::now();
    let duplicate_records = collected_listings - outcome.skipped_records - outcome.new_records.len();
    let reports_dir = write_run_report(
        config,
        run_id,
        started_at,
        finished_at,
        &enabled_sources,
        &outcome,
        duplicate_records,
    )
    .await?;

    Ok(CollectionRunSummary {
        run_id,
        started_at,
        finished_at,
        enabled_sources: enabled_sources.len(),
        collected_listings,
        new_records: outcome.new_records.len(),
        duplicate_records,
        skipped_records: outcome.skipped_records,
        seen_fingerprints: outcome.updated_seen.len(),
        reports_dir: reports_dir.display().to_string(),
    })
}

async fn load_source_registry(workspace_root: &Path) -> Result<SourceRegistry> {
    let path = workspace_root.join("sources.yaml");
    let text = fs::read_to_string(&path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

#[derive(Debug, Clone, Serialize)]
struct ReportManifest {
    schema_version: u32,
    files: Vec<ReportManifestFile>,
}

#[derive(Debug, Clone, Serialize)]
struct ReportManifestFile {
    name: String,
    path: String,
    sha256: String,
    bytes: u64,
}

async fn write_run_report(
    config: &CollectConfig,
    run_id: Uuid,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    enabled_sources: &[SourceConfig],
    outcome: &RunOutcome,
    duplicate_records: usize,
) -> Result<PathBuf> {
    let reports_dir = config.reports_dir.join(run_id.to_string());

    let records_json =
        serde_json::to_vec_pretty(&outcome.new_records).context("serializing new records")?;
    write_atomic(reports_dir.join("new_records.json"), &records_json)
        .await
        .context("writing new_records.json")?;

    let manifest = ReportManifest {
        schema_version: 1,
        files: vec![ReportManifestFile {
            name: "new_records".to_string(),
            path: "new_records.json".to_string(),
            sha256: sha256_hex(&records_json),
            bytes: records_json.len() as u64,
        }],
    };
    let manifest_json = serde_json::to_vec_pretty(&manifest).context("serializing manifest")?;
    write_atomic(reports_dir.join("manifest.json"), &manifest_json)
        .await
        .context("writing manifest.json")?;

    let mut source_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in &outcome.new_records {
        *source_counts.entry(record.source.as_str()).or_default() += 1;
    }
    let brief = format!(
        "# CloserJobs Collection Brief\n\n- Run ID: `{}`\n- Started: {}\n- Finished: {}\n- Enabled sources: {}\n- New records: {}\n- Duplicates discarded: {}\n- Skipped (no identity): {}\n\n## New Records by Source\n{}\n",
        run_id,
        started_at,
        finished_at,
        enabled_sources.len(),
        outcome.new_records.len(),
        duplicate_records,
        outcome.skipped_records,
        source_counts
            .iter()
            .map(|(source, count)| format!("- {}: {}", source, count))
            .collect::<Vec<_>>()
            .join("\n")
    );
    write_atomic(reports_dir.join("collection_brief.md"), brief.as_bytes())
        .await
        .context("writing collection_brief.md")?;

    Ok(reports_dir)
}
