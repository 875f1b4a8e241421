//! # protoscan-core
//!
//! Deterministic core for experimental protocol analysis.
//!
//! This crate holds everything about an analysis that does not touch the
//! network: the canonical result model, the prompt builders, and the
//! resilient response parser.
//!
//! ## Key Guarantees
//!
//! 1. **No LLM calls**: backends live in `protoscan-runtime`; this crate is
//!    pure data transformation
//! 2. **Never fails on model output**: [`parser::parse_analysis`] always
//!    returns a structurally complete [`AnalysisResult`], degrading instead
//!    of erroring
//! 3. **Stable wire contract**: [`AnalysisResult`] serializes to the exact
//!    key set consumed by downstream clients, including the per-category
//!    `issue`/`check` title keys
//!
//! ## Example
//!
//! ```rust
//! use protoscan_core::parser::parse_analysis;
//!
//! let raw = r#"{"success_probability": 85, "warnings": []}"#;
//! let result = parse_analysis(raw);
//! assert_eq!(result.success_probability, 85);
//! assert!(result.critical_issues.is_empty());
//! ```

pub mod model;
pub mod parser;
pub mod prompts;

// Re-export main types at crate root
pub use model::{
    AnalysisResult, AppliedFix, Finding, FixPlan, ImprovedProtocol, ReagentCategory, ReagentItem,
    ShoppingList,
};
pub use parser::{parse_analysis, parse_json_payload, ParseError};
