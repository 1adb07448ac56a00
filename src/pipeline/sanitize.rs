//! Response sanitizer: recover a JSON value from free-form model output.
//!
//! Even when told to output "ONLY valid JSON", models wrap replies in
//! ` ```json ` fences, prepend a sentence of prose, or fall back to
//! single-quoted literal syntax. This module narrows the reply step by step
//! and then tries two parsers, strict first.
//!
//! ## Step Order
//!
//! Each step is a pure function returning `Option`; `None` from a narrowing
//! step means "nothing to narrow, keep the current text", while `None` from
//! a parse step means "try the next one". First successful parse wins.
//!
//! 1. Reject empty input
//! 2. Keep only one fenced block (the first `json`-tagged one, else the first)
//! 3. Strict JSON parse of that text as-is
//! 4. Narrow to the span from the first `{` to the last `}`
//! 5. Strict JSON parse of the span
//! 6. Permissive literal parse of the span ([`super::literal`])
//!
//! Text that is already valid JSON is taken whole at step 3, so a top-level
//! array of objects is not cut down to its first-to-last brace span.
//!
//! Step 4 is greedy and does not understand quoting: braces inside string
//! values, or two top-level objects in one reply, can make it over- or
//! under-capture. That is an accepted best-effort limitation.

use super::literal::parse_literal;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// Recover a JSON value from a model reply, or `None` if nothing parses.
///
/// Never panics and never returns an error: the caller decides how to
/// report a failed extraction.
pub fn sanitize(raw: &str) -> Option<Value> {
    let text = non_empty(raw)?;
    let text = fenced_block(text).unwrap_or(text);
    parse_strict(text).or_else(|| {
        let span = brace_span(text).unwrap_or(text);
        parse_strict(span).or_else(|| parse_permissive(span))
    })
}

/// [`sanitize`] for replies that may be absent altogether.
pub fn sanitize_opt(raw: Option<&str>) -> Option<Value> {
    raw.and_then(sanitize)
}

// ── Step 1: Reject empty input ───────────────────────────────────────────────

fn non_empty(raw: &str) -> Option<&str> {
    if raw.trim().is_empty() {
        None
    } else {
        Some(raw)
    }
}

// ── Step 2: Keep one fenced block ────────────────────────────────────────────

/// Opening fence: three backticks, then an optional info word on the same
/// line (`json`, `JSON`, `python`, …) followed by the line break.
static RE_FENCE_INFO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]*([A-Za-z0-9_+.-]*)[ \t]*\r?\n").unwrap());

#[derive(Debug, PartialEq, Eq)]
struct FencedBlock<'a> {
    info: &'a str,
    body: &'a str,
}

/// All fenced blocks in order. An unclosed final fence runs to end of text.
fn fenced_blocks(text: &str) -> Vec<FencedBlock<'_>> {
    let mut blocks = Vec::new();
    let mut cursor = 0;

    while let Some(open) = text[cursor..].find("```") {
        let after_ticks = cursor + open + 3;
        let (info, body_start) = match RE_FENCE_INFO.captures(&text[after_ticks..]) {
            Some(caps) => {
                let info = caps.get(1).map_or("", |m| m.as_str());
                (info, after_ticks + caps[0].len())
            }
            // Inline fence such as ```{"a": 1}``` has no info word.
            None => ("", after_ticks),
        };

        match text[body_start..].find("```") {
            Some(close) => {
                blocks.push(FencedBlock {
                    info,
                    body: &text[body_start..body_start + close],
                });
                cursor = body_start + close + 3;
            }
            None => {
                blocks.push(FencedBlock {
                    info,
                    body: &text[body_start..],
                });
                break;
            }
        }
    }

    blocks
}

fn fenced_block(text: &str) -> Option<&str> {
    if !text.contains("```") {
        return None;
    }
    let blocks = fenced_blocks(text);
    let chosen = blocks
        .iter()
        .find(|b| b.info.eq_ignore_ascii_case("json"))
        .or_else(|| blocks.first())?;
    debug!(
        "Sanitizer: using fenced block (info={:?}, {} bytes)",
        chosen.info,
        chosen.body.len()
    );
    Some(chosen.body.trim())
}

// ── Step 4: Narrow to the outermost brace span ───────────────────────────────

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

// ── Steps 3 and 5: Strict JSON ───────────────────────────────────────────────

fn parse_strict(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

// ── Step 6: Permissive literal syntax ────────────────────────────────────────

fn parse_permissive(text: &str) -> Option<Value> {
    match parse_literal(text) {
        Ok(value) => {
            debug!("Sanitizer: strict parse failed, permissive parse succeeded");
            Some(value)
        }
        Err(e) => {
            debug!("Sanitizer: permissive parse failed: {}", e);
            None
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
