//! Canonical result types for protocol analysis.
//!
//! [`AnalysisResult`] is the shape every backend must produce, no matter how
//! unreliable its raw output was. Its JSON serialization is an external
//! contract: downstream clients key on `critical_issues[].issue`,
//! `warnings[].issue` and `passed_checks[].check`, so the title key differs
//! by category and must be preserved exactly.

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};

/// Sentinel for string fields the model did not provide.
pub const UNKNOWN: &str = "unknown";

/// A single titled observation: a critical issue, a warning, or a passed
/// check, with a human-readable description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Short title of the observation
    pub title: String,

    /// Detailed explanation
    pub description: String,
}

impl Finding {
    /// Create a finding from title and description.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Structured outcome of one protocol analysis.
///
/// Invariants:
/// - `success_probability` is always in `[0, 100]`
/// - the three finding collections may be empty but are never absent
/// - `raw_analysis` retains the full model output, even when parsing
///   degraded, so a human can inspect what the model actually said
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// Estimated probability of experimental success, 0-100
    pub success_probability: u8,

    /// Red flags likely to cause failure
    #[serde(serialize_with = "as_issues")]
    pub critical_issues: Vec<Finding>,

    /// Yellow flags that should be improved
    #[serde(serialize_with = "as_issues")]
    pub warnings: Vec<Finding>,

    /// Green checks the protocol already satisfies
    #[serde(serialize_with = "as_checks")]
    pub passed_checks: Vec<Finding>,

    /// Rough cost estimate, or `"unknown"`
    pub estimated_cost: String,

    /// Rough time estimate, or `"unknown"`
    pub estimated_time: String,

    /// Concrete improvement suggestions
    pub suggestions: Vec<String>,

    /// The full raw model output, retained for diagnostics
    pub raw_analysis: String,
}

impl AnalysisResult {
    /// The degraded result returned when no decode strategy succeeded.
    ///
    /// Carries sentinel values instead of failing the request; the single
    /// suggestion entry tells the caller that automated parsing failed.
    pub fn degraded(raw: impl Into<String>) -> Self {
        Self {
            success_probability: 0,
            critical_issues: Vec::new(),
            warnings: Vec::new(),
            passed_checks: Vec::new(),
            estimated_cost: UNKNOWN.to_string(),
            estimated_time: UNKNOWN.to_string(),
            suggestions: vec![
                "Automated parsing of the model output failed; inspect raw_analysis and retry"
                    .to_string(),
            ],
            raw_analysis: raw.into(),
        }
    }
}

#[derive(Serialize)]
struct IssueEntry<'a> {
    issue: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct CheckEntry<'a> {
    check: &'a str,
    description: &'a str,
}

fn as_issues<S: Serializer>(findings: &[Finding], serializer: S) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(findings.len()))?;
    for f in findings {
        seq.serialize_element(&IssueEntry {
            issue: &f.title,
            description: &f.description,
        })?;
    }
    seq.end()
}

fn as_checks<S: Serializer>(findings: &[Finding], serializer: S) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(findings.len()))?;
    for f in findings {
        seq.serialize_element(&CheckEntry {
            check: &f.title,
            description: &f.description,
        })?;
    }
    seq.end()
}

/// A targeted fix for one identified issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixPlan {
    /// Short explanation of what to add or change
    pub fix_suggestion: String,

    /// Step-by-step implementation instructions
    #[serde(default)]
    pub implementation_steps: Vec<String>,
}

/// A fix the user selected for application to the protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedFix {
    /// Title of the issue being fixed
    pub issue: String,

    /// Description of the issue
    #[serde(default)]
    pub description: String,

    /// The fix to apply
    pub fix_suggestion: String,

    /// Implementation steps for the fix
    #[serde(default)]
    pub implementation_steps: Vec<String>,
}

/// A revised protocol with the selected fixes applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovedProtocol {
    /// The complete revised protocol text
    pub improved_protocol: String,

    /// What was changed, one entry per applied fix
    #[serde(default)]
    pub changes_made: Vec<String>,

    /// Re-estimated success probability after the fixes
    pub new_success_probability: u8,
}

/// One purchasable item extracted from the protocol's Materials section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReagentItem {
    /// Name exactly as written in the protocol
    pub name: String,

    /// Concentration as written, empty if unspecified
    #[serde(default)]
    pub concentration: String,

    /// Quantity as written, empty if unspecified
    #[serde(default)]
    pub quantity: String,

    /// Rough market price in USD
    #[serde(default)]
    pub estimated_price: f64,

    /// Checklist state for the shopping list UI
    #[serde(default)]
    pub checked: bool,
}

/// A named group of reagent items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReagentCategory {
    /// Category name, e.g. "Buffers & Solutions"
    pub name: String,

    /// Items in this category
    #[serde(default)]
    pub items: Vec<ReagentItem>,
}

/// Shopping list generated from the protocol's Materials section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingList {
    /// Items grouped by category
    #[serde(default)]
    pub categories: Vec<ReagentCategory>,

    /// Sum of all item prices; recomputed locally, never trusted from the
    /// model
    #[serde(default)]
    pub total_cost: f64,
}

impl ShoppingList {
    /// Recompute `total_cost` from the individual item prices.
    pub fn recompute_total(&mut self) {
        self.total_cost = self
            .categories
            .iter()
            .flat_map(|c| c.items.iter())
            .map(|i| i.estimated_price)
            .sum();
    }
}
