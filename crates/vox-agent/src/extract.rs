//! Response extractor — recover one structured reply from raw model text.
//!
//! Models wrap JSON in code fences, prepend prose, or append commentary. The
//! extractor walks candidate `{...}` spans with a string-aware bracket-depth
//! scan and returns the first one that parses into a valid reply, falling
//! back to the greedy first-`{`/last-`}` span when no balanced candidate
//! parses. Pure function — no I/O, no state, idempotent.

use serde::Deserialize;
use vox_core::{IntentKind, ParsedReply};

/// Tolerant wire shape of a model reply. Field presence is validated after
/// parsing; `input` is accepted as a legacy alias for `userInput`.
#[derive(Debug, Deserialize)]
struct RawReply {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(rename = "userInput", alias = "input")]
    user_input: Option<String>,
    response: Option<String>,
    #[serde(rename = "searchQuery")]
    search_query: Option<String>,
}

impl RawReply {
    /// Validate field presence and normalize into a [`ParsedReply`].
    ///
    /// A reply without a `type` or `response` field is a parse failure;
    /// an unknown intent tag coerces to `general`.
    fn validate(self) -> Option<ParsedReply> {
        let kind = self.kind?;
        let response = self.response?;
        Some(ParsedReply {
            intent: IntentKind::coerce(&kind),
            user_input: self.user_input.unwrap_or_default(),
            response,
            search_query: self.search_query,
        })
    }
}

/// Extract a [`ParsedReply`] from raw model text.
///
/// Returns `None` when no span of the text parses into an object carrying at
/// least a `type` and a `response` field.
#[must_use]
pub fn extract_reply(raw: &str) -> Option<ParsedReply> {
    // Depth-aware pass: first balanced object that validates wins. Balanced
    // spans that fail to parse (brace-containing prose) are skipped.
    let mut search_from = 0;
    while let Some(offset) = raw[search_from..].find('{') {
        let start = search_from + offset;
        // An unclosed candidate (e.g. a stray '{' in prose) is skipped; a
        // balanced object may still start at a later brace.
        if let Some(len) = balanced_object_len(&raw[start..]) {
            if let Some(reply) = parse_span(&raw[start..start + len]) {
                return Some(reply);
            }
        }
        search_from = start + 1;
    }

    // Greedy fallback: first '{' through last '}'.
    parse_span(greedy_span(raw)?)
}

/// Parse one candidate span (after fence stripping) into a validated reply.
fn parse_span(span: &str) -> Option<ParsedReply> {
    let cleaned = strip_code_fences(span);
    serde_json::from_str::<RawReply>(cleaned)
        .ok()
        .and_then(RawReply::validate)
}

/// Byte length of the balanced object starting at `s` (which begins with
/// `{`), or `None` if it never closes.
///
/// Tracks JSON string state and escapes so braces inside string values do
/// not affect depth.
fn balanced_object_len(s: &str) -> Option<usize> {
    let mut depth: u32 = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Greedy fallback span: first `{` through last `}`, inclusive.
fn greedy_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Strip a surrounding code fence (optional `json` language tag) from a span.
fn strip_code_fences(span: &str) -> &str {
    let trimmed = span.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = r#"{"type":"get-time","userInput":"what time is it","response":"I don't know","searchQuery":""}"#;

    #[test]
    fn bare_json_object() {
        let reply = extract_reply(WELL_FORMED).unwrap();
        assert_eq!(reply.intent, IntentKind::GetTime);
        assert_eq!(reply.user_input, "what time is it");
        assert_eq!(reply.response, "I don't know");
    }

    #[test]
    fn fenced_json_round_trips() {
        let reply = ParsedReply {
            intent: IntentKind::GoogleSearch,
            user_input: "search rust".into(),
            response: "Searching for rust.".into(),
            search_query: Some("rust".into()),
        };
        let fenced = format!("```json\n{}\n```", serde_json::to_string(&reply).unwrap());
        assert_eq!(extract_reply(&fenced).unwrap(), reply);
    }

    #[test]
    fn leading_and_trailing_prose() {
        let raw = format!("Sure! Here is the answer:\n{WELL_FORMED}\nHope that helps.");
        let reply = extract_reply(&raw).unwrap();
        assert_eq!(reply.intent, IntentKind::GetTime);
    }

    #[test]
    fn brace_containing_prose_before_payload() {
        // "{get-time}" is balanced but not valid JSON; the scan must skip it
        // and find the real object.
        let raw = format!("I chose {{get-time}} as the type.\n{WELL_FORMED}");
        let reply = extract_reply(&raw).unwrap();
        assert_eq!(reply.intent, IntentKind::GetTime);
        assert_eq!(reply.response, "I don't know");
    }

    #[test]
    fn brace_containing_prose_after_payload() {
        let raw = format!("{WELL_FORMED}\nNote: {{searchQuery}} was left empty.");
        let reply = extract_reply(&raw).unwrap();
        assert_eq!(reply.intent, IntentKind::GetTime);
    }

    #[test]
    fn braces_inside_string_values() {
        let raw = r#"{"type":"general","userInput":"hi","response":"use {braces} like this"}"#;
        let reply = extract_reply(raw).unwrap();
        assert_eq!(reply.response, "use {braces} like this");
    }

    #[test]
    fn escaped_quotes_inside_strings() {
        let raw = r#"{"type":"general","userInput":"hi","response":"she said \"ok\""}"#;
        let reply = extract_reply(raw).unwrap();
        assert_eq!(reply.response, r#"she said "ok""#);
    }

    #[test]
    fn unbalanced_object_returns_none() {
        // Depth never returns to zero; the greedy fallback is also
        // unparseable. Never a panic.
        let raw = r#"{"type":"general","response":"truncated"#;
        assert!(extract_reply(raw).is_none());
    }

    #[test]
    fn no_braces_returns_none() {
        assert!(extract_reply("I am not JSON at all").is_none());
        assert!(extract_reply("").is_none());
    }

    #[test]
    fn missing_type_field_is_rejected() {
        let raw = r#"{"userInput":"hi","response":"hello"}"#;
        assert!(extract_reply(raw).is_none());
    }

    #[test]
    fn missing_response_field_is_rejected() {
        let raw = r#"{"type":"general","userInput":"hi"}"#;
        assert!(extract_reply(raw).is_none());
    }

    #[test]
    fn unknown_intent_tag_coerces_to_general() {
        let raw = r#"{"type":"make-coffee","userInput":"brew","response":"Brewing."}"#;
        let reply = extract_reply(raw).unwrap();
        assert_eq!(reply.intent, IntentKind::General);
    }

    #[test]
    fn legacy_input_alias_accepted() {
        let raw = r#"{"type":"general","input":"hi","response":"hello"}"#;
        let reply = extract_reply(raw).unwrap();
        assert_eq!(reply.user_input, "hi");
    }

    #[test]
    fn idempotent() {
        let raw = format!("```json\n{WELL_FORMED}\n```");
        assert_eq!(extract_reply(&raw), extract_reply(&raw));
    }

    #[test]
    fn nested_objects_kept_whole() {
        let raw = r#"{"type":"general","userInput":"hi","response":"ok","extra":{"nested":true}}"#;
        let reply = extract_reply(raw).unwrap();
        assert_eq!(reply.response, "ok");
    }

    #[test]
    fn first_valid_object_wins() {
        let raw = format!(r#"{WELL_FORMED} {{"type":"general","response":"second"}}"#);
        let reply = extract_reply(&raw).unwrap();
        assert_eq!(reply.intent, IntentKind::GetTime);
    }

    #[test]
    fn missing_user_input_defaults_empty() {
        let raw = r#"{"type":"general","response":"hello"}"#;
        let reply = extract_reply(raw).unwrap();
        assert_eq!(reply.user_input, "");
    }
}
