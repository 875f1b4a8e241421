//! Resilient parsing of raw model output.
//!
//! Model output is untrusted text: it may be clean JSON, JSON wrapped in a
//! markdown fence with surrounding prose, JSON with commentary prepended,
//! or no JSON at all. [`parse_analysis`] runs an ordered pipeline of
//! independent decode strategies and, when every strategy fails, degrades
//! to a sentinel-valued [`AnalysisResult`] instead of erroring. A parse
//! failure is an in-band outcome here, never an `Err`.
//!
//! The strict variant [`parse_json_payload`] shares the same strategy chain
//! but propagates failure, for operations where a malformed payload cannot
//! be meaningfully degraded.

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{AnalysisResult, Finding, UNKNOWN};

lazy_static! {
    static ref FENCED_JSON: Regex =
        Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("fenced-json regex is valid");
}

/// Errors from strict payload parsing.
///
/// Only the fix / improvement / reagent operations see these; the analysis
/// path never fails.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("no JSON object found in model output")]
    NoJsonFound,

    #[error("JSON payload did not match the expected shape: {0}")]
    Shape(#[source] serde_json::Error),
}

/// Decode strategies, in order. First success wins; each is independent of
/// the others so a new fallback is an additive change to this list.
const STRATEGIES: &[fn(&str) -> Option<&str>] = &[whole_text, fenced_block, brace_span];

/// Strategy 1: the entire output is the payload.
fn whole_text(raw: &str) -> Option<&str> {
    Some(raw)
}

/// Strategy 2: the payload sits inside a ```json fenced block, with prose
/// around it.
fn fenced_block(raw: &str) -> Option<&str> {
    FENCED_JSON
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Strategy 3: take everything from the first `{` to the last `}`. Handles
/// models that prepend or append commentary without fencing.
fn brace_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end >= start).then(|| &raw[start..=end])
}

/// Parse raw model output into a canonical [`AnalysisResult`].
///
/// Never fails: every path, including completely non-JSON input, yields a
/// structurally complete result. Pure function of its input, so parsing the
/// same text twice gives identical results.
pub fn parse_analysis(raw: &str) -> AnalysisResult {
    for strategy in STRATEGIES {
        if let Some(candidate) = strategy(raw) {
            if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(candidate) {
                return normalize(&fields, raw);
            }
        }
    }

    tracing::warn!(
        output_len = raw.len(),
        "no decode strategy matched model output, returning degraded result"
    );
    AnalysisResult::degraded(raw)
}

/// Strictly decode a typed payload from raw model output.
///
/// Runs the same strategy chain as [`parse_analysis`] but returns an error
/// when no candidate decodes into `T`. A candidate that was valid JSON with
/// the wrong shape is reported as [`ParseError::Shape`] so the caller can
/// tell "the model ignored the schema" from "the model returned prose".
pub fn parse_json_payload<T: DeserializeOwned>(raw: &str) -> Result<T, ParseError> {
    let mut shape_error = None;

    for strategy in STRATEGIES {
        if let Some(candidate) = strategy(raw) {
            match serde_json::from_str::<T>(candidate) {
                Ok(payload) => return Ok(payload),
                Err(err) if err.is_data() => shape_error = Some(err),
                Err(_) => {}
            }
        }
    }

    match shape_error {
        Some(err) => Err(ParseError::Shape(err)),
        None => Err(ParseError::NoJsonFound),
    }
}

/// Field-level normalization of a decoded object.
///
/// Missing probability defaults to 0 and out-of-range values clamp into
/// [0, 100]; missing arrays become empty; missing string fields become
/// `"unknown"`; unknown extra fields are ignored for forward compatibility.
fn normalize(fields: &Map<String, Value>, raw: &str) -> AnalysisResult {
    AnalysisResult {
        success_probability: clamped_probability(fields.get("success_probability")),
        critical_issues: findings(fields.get("critical_issues"), "issue"),
        warnings: findings(fields.get("warnings"), "issue"),
        passed_checks: findings(fields.get("passed_checks"), "check"),
        estimated_cost: string_or_unknown(fields.get("estimated_cost")),
        estimated_time: string_or_unknown(fields.get("estimated_time")),
        suggestions: string_list(fields.get("suggestions")),
        raw_analysis: raw.to_string(),
    }
}

fn clamped_probability(value: Option<&Value>) -> u8 {
    value
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
        .unwrap_or(0)
        .clamp(0, 100) as u8
}

/// Extract findings from an array value, reading the category-specific
/// title key (`issue` or `check`). Entries missing the title or the
/// description are dropped silently: one malformed finding must not corrupt
/// the whole result.
fn findings(value: Option<&Value>, title_key: &str) -> Vec<Finding> {
    let Some(Value::Array(entries)) = value else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let title = entry.get(title_key)?.as_str()?;
            let description = entry.get("description")?.as_str()?;
            Some(Finding::new(title, description))
        })
        .collect()
}

fn string_or_unknown(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN)
        .to_string()
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(entries)) = value else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| entry.as_str().map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FixPlan;
    use proptest::prelude::*;

    const WELL_FORMED: &str = r#"{
        "success_probability": 85,
        "critical_issues": [],
        "warnings": [{"issue": "Vague incubation time", "description": "Specify minutes"}],
        "passed_checks": [{"check": "Controls present", "description": "Negative control stated"}],
        "estimated_cost": "$300",
        "estimated_time": "1 day",
        "suggestions": ["State the buffer composition"]
    }"#;

    #[test]
    fn well_formed_json_parses_verbatim() {
        let result = parse_analysis(WELL_FORMED);
        assert_eq!(result.success_probability, 85);
        assert!(result.critical_issues.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].title, "Vague incubation time");
        assert_eq!(result.passed_checks[0].title, "Controls present");
        assert_eq!(result.estimated_cost, "$300");
        assert_eq!(result.estimated_time, "1 day");
        assert_eq!(result.suggestions, vec!["State the buffer composition"]);
        assert_eq!(result.raw_analysis, WELL_FORMED);
    }

    #[test]
    fn fenced_block_is_extracted_from_surrounding_prose() {
        let raw = format!(
            "Here is my analysis of the protocol:\n\n```json\n{}\n```\n\nLet me know if you need more.",
            WELL_FORMED
        );
        let result = parse_analysis(&raw);
        assert_eq!(result.success_probability, 85);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.raw_analysis, raw);
    }

    #[test]
    fn brace_span_handles_unfenced_commentary() {
        let raw = format!("Sure! The analysis follows. {} Hope that helps.", WELL_FORMED);
        let result = parse_analysis(&raw);
        assert_eq!(result.success_probability, 85);
    }

    #[test]
    fn plain_prose_degrades_with_single_diagnostic_suggestion() {
        let raw = "I could not find anything resembling a protocol in this document.";
        let result = parse_analysis(raw);
        assert_eq!(result.success_probability, 0);
        assert!(result.critical_issues.is_empty());
        assert!(result.warnings.is_empty());
        assert!(result.passed_checks.is_empty());
        assert_eq!(result.estimated_cost, UNKNOWN);
        assert_eq!(result.estimated_time, UNKNOWN);
        assert_eq!(result.suggestions.len(), 1);
        assert_eq!(result.raw_analysis, raw);
    }

    #[test]
    fn truncated_json_degrades_instead_of_erroring() {
        let raw = r#"{"success_probability": 85, "critical_issues": [{"issue": "Unf"#;
        let result = parse_analysis(raw);
        assert_eq!(result.success_probability, 0);
        assert_eq!(result.raw_analysis, raw);
    }

    #[test]
    fn probability_clamps_into_range() {
        let low = parse_analysis(r#"{"success_probability": -5}"#);
        assert_eq!(low.success_probability, 0);

        let high = parse_analysis(r#"{"success_probability": 150}"#);
        assert_eq!(high.success_probability, 100);

        let float = parse_analysis(r#"{"success_probability": 72.0}"#);
        assert_eq!(float.success_probability, 72);
    }

    #[test]
    fn missing_probability_defaults_to_zero() {
        let result = parse_analysis(r#"{"warnings": []}"#);
        assert_eq!(result.success_probability, 0);
    }

    #[test]
    fn missing_collections_default_to_empty_not_absent() {
        let result = parse_analysis(r#"{"success_probability": 60}"#);
        assert!(result.warnings.is_empty());
        assert!(result.critical_issues.is_empty());
        assert!(result.passed_checks.is_empty());
        assert!(result.suggestions.is_empty());
        assert_eq!(result.estimated_cost, UNKNOWN);
        assert_eq!(result.estimated_time, UNKNOWN);
    }

    #[test]
    fn malformed_findings_are_dropped_silently() {
        let raw = r#"{
            "success_probability": 70,
            "critical_issues": [
                {"issue": "Valid", "description": "Kept"},
                {"issue": "Missing description"},
                {"description": "Missing title"},
                {"issue": null, "description": "Null title"},
                "not an object"
            ]
        }"#;
        let result = parse_analysis(raw);
        assert_eq!(result.critical_issues.len(), 1);
        assert_eq!(result.critical_issues[0].title, "Valid");
    }

    #[test]
    fn unknown_extra_fields_are_ignored() {
        let raw = r#"{"success_probability": 50, "model_notes": "ignore me", "version": 3}"#;
        let result = parse_analysis(raw);
        assert_eq!(result.success_probability, 50);
    }

    #[test]
    fn parsing_is_idempotent() {
        let raw = format!("Commentary. ```json\n{}\n```", WELL_FORMED);
        assert_eq!(parse_analysis(&raw), parse_analysis(&raw));
    }

    #[test]
    fn non_string_suggestions_are_dropped() {
        let raw = r#"{"suggestions": ["keep", 42, null, "also keep"]}"#;
        let result = parse_analysis(raw);
        assert_eq!(result.suggestions, vec!["keep", "also keep"]);
    }

    #[test]
    fn fenced_strategy_finds_block() {
        let raw = "prose ```json\n{\"a\": 1}\n``` more prose";
        assert_eq!(fenced_block(raw), Some("{\"a\": 1}"));
        assert_eq!(fenced_block("no fence here"), None);
    }

    #[test]
    fn brace_strategy_spans_first_to_last() {
        assert_eq!(brace_span("abc {\"a\": 1} def"), Some("{\"a\": 1}"));
        assert_eq!(brace_span("no braces"), None);
        // Mismatched order yields nothing rather than an invalid slice.
        assert_eq!(brace_span("} before {"), None);
    }

    #[test]
    fn strict_payload_accepts_fenced_json() {
        let raw = "Here you go:\n```json\n{\"fix_suggestion\": \"Add a control\", \"implementation_steps\": [\"step\"]}\n```";
        let plan: FixPlan = parse_json_payload(raw).unwrap();
        assert_eq!(plan.fix_suggestion, "Add a control");
        assert_eq!(plan.implementation_steps, vec!["step"]);
    }

    #[test]
    fn strict_payload_rejects_prose() {
        let err = parse_json_payload::<FixPlan>("I cannot produce JSON today.").unwrap_err();
        assert!(matches!(err, ParseError::NoJsonFound));
    }

    #[test]
    fn strict_payload_reports_wrong_shape() {
        let err = parse_json_payload::<FixPlan>(r#"{"unrelated": true}"#).unwrap_err();
        assert!(matches!(err, ParseError::Shape(_)));
    }

    proptest! {
        #[test]
        fn parse_never_panics_and_always_clamps(raw in ".{0,512}") {
            let result = parse_analysis(&raw);
            prop_assert!(result.success_probability <= 100);
            prop_assert_eq!(result.raw_analysis, raw);
        }

        #[test]
        fn any_probability_value_stays_in_range(p in proptest::num::i64::ANY) {
            let raw = format!(r#"{{"success_probability": {}}}"#, p);
            let result = parse_analysis(&raw);
            prop_assert!(result.success_probability <= 100);
        }
    }
}
