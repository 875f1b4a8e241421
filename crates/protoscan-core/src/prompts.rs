//! Prompt construction for protocol analysis.
//!
//! Each operation pairs a system prompt constant (role framing, sent as a
//! system-level instruction) with a builder that renders the instructional
//! body around a truncated protocol excerpt.
//!
//! Truncation is by raw character count, not tokens and not word boundaries.
//! Cutting mid-word is accepted behavior: downstream token budgeting assumes
//! the character limits below, so the limits must not be "improved".

/// Maximum protocol characters included in an analysis prompt.
pub const MAX_ANALYSIS_CHARS: usize = 8000;

/// Maximum protocol context characters in a fix prompt.
pub const MAX_FIX_CONTEXT_CHARS: usize = 4000;

/// Maximum original-protocol characters in an improvement prompt.
pub const MAX_IMPROVEMENT_CHARS: usize = 6000;

/// Maximum protocol characters in a reagent-extraction prompt.
pub const MAX_REAGENT_CHARS: usize = 4000;

/// Role framing for the analysis operation.
pub const ANALYST_SYSTEM_PROMPT: &str = "You are an expert scientific protocol reviewer with \
deep knowledge of experimental design, safety protocols, and common experimental pitfalls. \
Analyze protocols critically but constructively. Return only valid JSON.";

/// Role framing for the fix-generation operation.
pub const FIX_SYSTEM_PROMPT: &str =
    "You are an expert protocol designer who provides clear, actionable solutions.";

/// Role framing for the protocol-improvement operation.
pub const EDITOR_SYSTEM_PROMPT: &str =
    "You are an expert protocol editor who makes precise, targeted improvements.";

/// Role framing for the reagent-extraction operation.
pub const PROCUREMENT_SYSTEM_PROMPT: &str =
    "You are a laboratory procurement specialist who extracts reagent lists from protocols.";

/// Truncate to the first `max` characters.
///
/// Character-based, never byte-based: multibyte input must not be split
/// inside a code point.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Build the analysis prompt for a protocol excerpt.
///
/// Pure function of its input; any string, including empty, produces a valid
/// prompt. An empty excerpt simply leads the model to report missing
/// information.
pub fn build_analysis_prompt(protocol_text: &str) -> String {
    format!(
        r#"Analyze the following experimental protocol for potential issues and success probability.

PROTOCOL TEXT:
{excerpt}

Evaluate the protocol on these criteria:

**CRITICAL ISSUES** (Red flags - likely to cause failure):
- Missing negative control
- Missing positive control
- No replication stated
- Unsafe temperatures or conditions
- Contamination risks
- Incompatible reagents
- Vague or missing concentrations for key reagents

**WARNINGS** (Yellow flags - should improve):
- Unclear sample size
- Vague incubation times
- Missing buffer compositions
- No mention of controls (but could be implied)
- Statistical analysis not specified

**GOOD PRACTICES** (Green checks):
- Appropriate controls present
- Clear replication (n= specified)
- Safety protocols mentioned
- Detailed methodology
- Proper concentrations stated

Based on your analysis, estimate:
1. Success probability (0-100%)
2. Rough cost estimate if possible
3. Time estimate if possible
4. Concrete suggestions for improvement

Return your analysis as a JSON object with this exact structure:
{{
    "success_probability": <integer 0-100>,
    "critical_issues": [
        {{"issue": "<short title>", "description": "<detailed explanation>"}}
    ],
    "warnings": [
        {{"issue": "<short title>", "description": "<detailed explanation>"}}
    ],
    "passed_checks": [
        {{"check": "<what passed>", "description": "<why it's good>"}}
    ],
    "estimated_cost": "<rough USD estimate or 'unknown'>",
    "estimated_time": "<rough time estimate or 'unknown'>",
    "suggestions": ["<concrete actionable suggestion>"]
}}

Be specific and reference actual details from the protocol. If information is missing, flag it."#,
        excerpt = truncate_chars(protocol_text, MAX_ANALYSIS_CHARS)
    )
}

/// Build the fix-generation prompt for one identified issue.
pub fn build_fix_prompt(issue: &str, description: &str, protocol_context: &str) -> String {
    format!(
        r#"A specific issue has been identified in an experimental protocol.

ISSUE: {issue}
DESCRIPTION: {description}

PROTOCOL CONTEXT:
{context}

Generate a concrete, actionable fix for this issue. Provide:
1. A clear fix suggestion (2-3 sentences explaining what to add/change)
2. Step-by-step implementation instructions

Return your response as a JSON object with this exact structure:
{{
    "fix_suggestion": "<clear explanation of the fix>",
    "implementation_steps": [
        "<step 1>",
        "<step 2>",
        "<step 3>"
    ]
}}

Be specific and actionable. Reference actual protocol details when possible."#,
        issue = issue,
        description = description,
        context = truncate_chars(protocol_context, MAX_FIX_CONTEXT_CHARS)
    )
}

/// Render the selected fixes into the summary block used by
/// [`build_improvement_prompt`].
fn render_fixes_summary(fixes: &[crate::model::AppliedFix]) -> String {
    fixes
        .iter()
        .map(|fix| {
            let steps = fix
                .implementation_steps
                .iter()
                .enumerate()
                .map(|(i, step)| format!("  {}. {}", i + 1, step))
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "ISSUE: {}\nDESCRIPTION: {}\nFIX: {}\nIMPLEMENTATION:\n{}",
                fix.issue, fix.description, fix.fix_suggestion, steps
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the improvement prompt that applies selected fixes to a protocol.
pub fn build_improvement_prompt(
    original_protocol: &str,
    fixes: &[crate::model::AppliedFix],
) -> String {
    format!(
        r#"Apply the following fixes to the protocol.

ORIGINAL PROTOCOL:
{original}

SELECTED FIXES TO APPLY:
{fixes}

INSTRUCTIONS:
1. Start with the EXACT original protocol text
2. Make ONLY the specific changes needed for the fixes listed above
3. If a fix introduces new materials, reagents, or controls, reference them consistently:
   in the Materials section, in the step where they are used, and anywhere else relevant
4. Keep everything else exactly as it was in the original
5. The improved protocol MUST be different from the original - the fixes must be visible

Estimate the new success probability based on:
- Original score + (5-10% per critical issue fixed) + (2-3% per warning fixed)
- Don't go above 85-90% unless ALL major issues are fixed

Return your response as a JSON object with this exact structure:
{{
    "improved_protocol": "<the complete protocol with ONLY the selected fixes applied>",
    "changes_made": [
        "<specific change 1 - what was added/modified>",
        "<specific change 2 - what was added/modified>"
    ],
    "new_success_probability": <integer 0-100>
}}"#,
        original = truncate_chars(original_protocol, MAX_IMPROVEMENT_CHARS),
        fixes = render_fixes_summary(fixes)
    )
}

/// Build the reagent-extraction prompt.
///
/// The instructions are deliberately restrictive: the shopping list must be
/// a one-to-one transcription of the Materials section, so the prompt
/// forbids inference of "typical" lab items the model might otherwise add.
pub fn build_reagent_prompt(protocol_text: &str) -> String {
    format!(
        r#"Extract ONLY materials that are EXPLICITLY written word-for-word in the Materials section of the protocol below.

PROTOCOL TEXT:
{excerpt}

RULES - STRICTLY ENFORCE:
- Read ONLY the section labeled "Materials". Ignore Procedure, Methods, Notes, and Quality Control sections.
- DO NOT add materials from your own knowledge or infer materials that "should" be there.
- DO NOT add common lab items (pipette tips, tubes, gloves, timer, ice) unless explicitly listed.
- DO NOT expand abbreviations (if Materials says "BSA", do not write "Bovine Serum Albumin").
- DO NOT add related items (if Materials says "buffer", do not write "wash buffer").
- Copy item names EXACTLY as written, including concentrations and quantities.
- If the Materials section lists N items, your output must contain exactly N items.

Before returning, verify each extracted item can be quoted verbatim from the Materials section.
Remove any item you cannot directly quote.

For PRICING ONLY, use reasonable market prices: Antibodies $150-400, Enzymes $80-250, Buffers $30-90.

Return JSON:
{{
    "categories": [
        {{
            "name": "Antibodies & Proteins",
            "items": [
                {{
                    "name": "<exact name from protocol>",
                    "concentration": "<exact value from protocol or empty>",
                    "quantity": "<exact value from protocol or empty>",
                    "estimated_price": <price>,
                    "checked": false
                }}
            ]
        }},
        {{"name": "Reagents & Substrates", "items": []}},
        {{"name": "Consumables", "items": []}},
        {{"name": "Buffers & Solutions", "items": []}}
    ],
    "total_cost": 0
}}"#,
        excerpt = truncate_chars(protocol_text, MAX_REAGENT_CHARS)
    )
}
