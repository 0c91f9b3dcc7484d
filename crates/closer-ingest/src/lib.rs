//! Board-export ingestion: loose collector JSON into `RawListing` values.
//!
//! Each external scraping collaborator dumps one JSON array per run, and no
//! two boards agree on field names (`title` vs `job_title`, `company` vs
//! `company_name`, explicit salary columns vs free text). This crate
//! reconciles those variants at the boundary so the pipeline only ever sees
//! the `RawListing` shape.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use closer_core::{RawListing, Source};
use serde_json::Value as JsonValue;
use thiserror::Error;

pub const CRATE_NAME: &str = "closer-ingest";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("export is not a JSON array of listing records")]
    NotAnArray,
    #[error("invalid export JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load one board-export file into raw listings.
///
/// Records that are not JSON objects are dropped; a record-level field that
/// cannot be reconciled is simply absent on the `RawListing`. Only a file
/// that is unreadable or not an array at all is an error.
pub fn load_board_export(path: impl AsRef<Path>, default_source: Source) -> Result<Vec<RawListing>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let listings = parse_board_export(&text, default_source)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(listings)
}

pub fn parse_board_export(text: &str, default_source: Source) -> Result<Vec<RawListing>, IngestError> {
    let value: JsonValue = serde_json::from_str(text)?;
    let records = value.as_array().ok_or(IngestError::NotAnArray)?;
    Ok(records
        .iter()
        .filter(|record| record.is_object())
        .map(|record| raw_listing_from_export(record, default_source))
        .collect())
}

fn raw_listing_from_export(record: &JsonValue, default_source: Source) -> RawListing {
    let source = first_str(record, &["site", "source"])
        .map(|site| Source::from_site(&site))
        .unwrap_or(default_source);

    RawListing {
        title: first_str(record, &["title", "job_title", "position"]),
        company: first_str(record, &["company", "company_name", "employer"]),
        location: first_str(record, &["location", "job_location"]),
        description: first_str(record, &["description", "job_description"]),
        salary_text: first_str(record, &["salary", "salary_text", "compensation"])
            .or_else(|| compose_salary_text(record)),
        posted_at_text: first_str(record, &["date_posted", "posted_at", "date"]),
        source,
        source_id: first_id(record, &["id", "job_id", "source_id"]),
        url: first_str(record, &["job_url", "url", "link"]),
    }
}

/// Boards that expose structured salary columns (`min_amount`, `max_amount`,
/// `interval`) get those folded back into a salary string so the extractor
/// has a single path. Monthly amounts are annualized here since the fact
/// model only distinguishes hourly from yearly pay.
fn compose_salary_text(record: &JsonValue) -> Option<String> {
    let min = first_f64(record, &["min_amount", "salary_min"]);
    let max = first_f64(record, &["max_amount", "salary_max"]);
    let (min, max) = match (min, max) {
        (None, None) => return None,
        (Some(v), None) | (None, Some(v)) => (v, v),
        (Some(a), Some(b)) => (a, b),
    };

    let interval = first_str(record, &["interval", "salary_interval"])
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();
    let (min, max, period) = match interval.as_str() {
        "hourly" | "hour" => (min, max, " per hour"),
        "yearly" | "year" | "annual" | "annually" => (min, max, " per year"),
        "monthly" | "month" => (min * 12.0, max * 12.0, " per year"),
        _ => (min, max, ""),
    };

    Some(format!(
        "${} - ${}{}",
        fmt_amount(min),
        fmt_amount(max),
        period
    ))
}

fn fmt_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

fn first_str(record: &JsonValue, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        record
            .get(key)
            .and_then(JsonValue::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
    })
}

/// Identifier columns arrive as strings on some boards and numbers on
/// others; both become the string form.
fn first_id(record: &JsonValue, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match record.get(key) {
        Some(JsonValue::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(JsonValue::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn first_f64(record: &JsonValue, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match record.get(key) {
        Some(JsonValue::Number(n)) => n.as_f64(),
        Some(JsonValue::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reconciles_field_name_variants() {
        let text = json!([
            {
                "site": "linkedin",
                "job_title": "Remote Sales Closer",
                "company_name": "Acme Inc",
                "location": "Remote",
                "job_url": "https://example.com/1",
                "id": 12345
            },
            {
                "source": "indeed",
                "title": "Appointment Setter",
                "employer": "Acme Inc",
                "source_id": "in-77",
                "description": "High ticket sales."
            }
        ])
        .to_string();

        let listings = parse_board_export(&text, Source::Direct).unwrap();
        assert_eq!(listings.len(), 2);

        assert_eq!(listings[0].source, Source::Linkedin);
        assert_eq!(listings[0].title.as_deref(), Some("Remote Sales Closer"));
        assert_eq!(listings[0].company.as_deref(), Some("Acme Inc"));
        assert_eq!(listings[0].source_id.as_deref(), Some("12345"));
        assert_eq!(listings[0].url.as_deref(), Some("https://example.com/1"));

        assert_eq!(listings[1].source, Source::Indeed);
        assert_eq!(listings[1].company.as_deref(), Some("Acme Inc"));
        assert_eq!(listings[1].source_id.as_deref(), Some("in-77"));
    }

    #[test]
    fn composes_salary_text_from_structured_columns() {
        let text = json!([
            {"title": "Closer", "min_amount": 80000, "max_amount": 120000, "interval": "yearly"},
            {"title": "Setter", "min_amount": "22.5", "interval": "hourly"},
            {"title": "SDR", "min_amount": 5000, "max_amount": 6000, "interval": "monthly"}
        ])
        .to_string();

        let listings = parse_board_export(&text, Source::ZipRecruiter).unwrap();
        assert_eq!(
            listings[0].salary_text.as_deref(),
            Some("$80000 - $120000 per year")
        );
        // single structured bound is still worth a salary string
        assert_eq!(
            listings[1].salary_text.as_deref(),
            Some("$22.5 - $22.5 per hour")
        );
        // monthly amounts are annualized
        assert_eq!(
            listings[2].salary_text.as_deref(),
            Some("$60000 - $72000 per year")
        );
    }

    #[test]
    fn free_text_salary_wins_over_structured_columns() {
        let text = json!([
            {"title": "Closer", "salary": "$90k-$110k OTE", "min_amount": 1}
        ])
        .to_string();
        let listings = parse_board_export(&text, Source::Direct).unwrap();
        assert_eq!(listings[0].salary_text.as_deref(), Some("$90k-$110k OTE"));
    }

    #[test]
    fn sparse_and_malformed_records_degrade() {
        let text = json!([
            {},
            "not an object",
            {"title": "   ", "company": ""}
        ])
        .to_string();
        let listings = parse_board_export(&text, Source::Glassdoor).unwrap();
        // the bare string is dropped, the empty objects survive as empty listings
        assert_eq!(listings.len(), 2);
        assert!(listings[0].title.is_none());
        assert!(listings[1].title.is_none());
        assert!(listings[1].company.is_none());
        assert_eq!(listings[0].source, Source::Glassdoor);
    }

    #[test]
    fn non_array_export_is_an_error() {
        let err = parse_board_export(r#"{"jobs": []}"#, Source::Direct).unwrap_err();
        assert!(matches!(err, IngestError::NotAnArray));
    }

    #[test]
    fn loads_export_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("indeed.json");
        std::fs::write(&path, r#"[{"title": "Inbound Closer", "id": "a-1"}]"#).unwrap();

        let listings = load_board_export(&path, Source::Indeed).unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].title.as_deref(), Some("Inbound Closer"));
        assert_eq!(listings[0].source, Source::Indeed);
    }
}
