//! Field-level salvage for responses no JSON parser will accept.
//!
//! Each list is located by key and walked bracket by bracket, skipping string
//! literals, so every top-level `{...}` entry is mined independently. A
//! truncated list still yields the entries seen so far. An entry without a
//! label is dropped.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use shared_types::{AnalysisResult, Level, OpportunityItem, RiskItem, UNKNOWN_DETAILS};

use crate::repair::string_end;

/// Summary used when items were recovered but the summary was not.
pub(crate) const PARTIAL_SUMMARY: &str =
    "AI analysis completed with parsing issues - partial results available";

lazy_static! {
    static ref RISKS_OPEN: Regex = Regex::new(r#""risks"\s*:\s*\["#).unwrap();
    static ref OPPORTUNITIES_OPEN: Regex = Regex::new(r#""opportunities"\s*:\s*\["#).unwrap();
    static ref SUMMARY: Regex = Regex::new(r#""summary"\s*:\s*"((?:[^"\\]|\\.)*)""#).unwrap();

    static ref RISK_LABEL: Regex = Regex::new(r#"(?i)"risk"\s*:\s*"((?:[^"\\]|\\.)*)""#).unwrap();
    static ref RISK_DETAILS: Regex =
        Regex::new(r#"(?i)"(?:riskDetails|explanation)"\s*:\s*"((?:[^"\\]|\\.)*)""#).unwrap();
    static ref SEVERITY: Regex = Regex::new(r#"(?i)"severity"\s*:\s*"([^"]*)""#).unwrap();

    static ref OPPORTUNITY_LABEL: Regex =
        Regex::new(r#"(?i)"opportunity"\s*:\s*"((?:[^"\\]|\\.)*)""#).unwrap();
    static ref OPPORTUNITY_DETAILS: Regex =
        Regex::new(r#"(?i)"(?:opportunityDetails|explanation)"\s*:\s*"((?:[^"\\]|\\.)*)""#)
            .unwrap();
    static ref IMPACT: Regex = Regex::new(r#"(?i)"impact"\s*:\s*"([^"]*)""#).unwrap();
}

/// Recover whatever can be found. `None` when nothing at all was found.
pub(crate) fn salvage(text: &str) -> Option<AnalysisResult> {
    let risks: Vec<RiskItem> = entries(&RISKS_OPEN, text)
        .filter_map(|entry| {
            Some(RiskItem {
                label: capture(&RISK_LABEL, entry)?,
                details: capture(&RISK_DETAILS, entry).unwrap_or_else(|| UNKNOWN_DETAILS.into()),
                severity: capture(&SEVERITY, entry)
                    .map(|s| Level::from_token(&s))
                    .unwrap_or_default(),
            })
        })
        .collect();

    let opportunities: Vec<OpportunityItem> = entries(&OPPORTUNITIES_OPEN, text)
        .filter_map(|entry| {
            Some(OpportunityItem {
                label: capture(&OPPORTUNITY_LABEL, entry)?,
                details: capture(&OPPORTUNITY_DETAILS, entry)
                    .unwrap_or_else(|| UNKNOWN_DETAILS.into()),
                impact: capture(&IMPACT, entry)
                    .map(|s| Level::from_token(&s))
                    .unwrap_or_default(),
            })
        })
        .collect();

    let summary = capture(&SUMMARY, text);

    if risks.is_empty() && opportunities.is_empty() && summary.is_none() {
        return None;
    }

    Some(AnalysisResult {
        risks,
        opportunities,
        summary: summary.unwrap_or_else(|| PARTIAL_SUMMARY.to_string()),
        ..Default::default()
    })
}

/// Top-level objects of the array opened by `opening`.
fn entries<'t>(opening: &Regex, text: &'t str) -> impl Iterator<Item = &'t str> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let Some(open) = opening.find(text) else {
        return found.into_iter();
    };

    let mut depth = 0usize;
    let mut entry_start = None;
    let mut i = open.end();
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i = string_end(bytes, i);
                continue;
            }
            c @ (b'{' | b'[') => {
                if depth == 0 && c == b'{' {
                    entry_start = Some(i);
                }
                depth += 1;
            }
            b'}' | b']' => {
                // The list's own closing bracket.
                if depth == 0 {
                    break;
                }
                depth -= 1;
                if depth == 0 {
                    if let Some(start) = entry_start.take() {
                        found.push(&text[start..=i]);
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }
    // Unterminated last entry of a cut-off response.
    if let Some(start) = entry_start {
        found.push(&text[start..]);
    }
    found.into_iter()
}

/// First capture group, unescaped and trimmed; blank counts as absent.
fn capture(pattern: &Regex, haystack: &str) -> Option<String> {
    pattern
        .captures(haystack)
        .map(|caps: Captures<'_>| unescape(&caps[1]))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn unescape(raw: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{raw}\"")).unwrap_or_else(|_| raw.to_string())
}
