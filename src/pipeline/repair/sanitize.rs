use std::sync::LazyLock;

use regex::Regex;

/// Envelope tags some models wrap around reasoning or tool output.
const WRAPPER_TAGS: &[&str] = &["think", "thinking", "reasoning", "tool_call"];

const FENCE: &str = "```";

/// One pattern per tag, matching a complete `<tag>…</tag>` region.
static WRAPPER_REGIONS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    WRAPPER_TAGS
        .iter()
        .map(|tag| Regex::new(&format!(r"(?is)<{tag}>.*?</{tag}>")).unwrap())
        .collect()
});

/// Any leftover opening or closing wrapper tag.
static STRAY_WRAPPER_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)</?(?:{})>", WRAPPER_TAGS.join("|"))).unwrap()
});

/// Strip wrapper artifacts from raw model output and isolate the top-level
/// JSON object.
///
/// Never fails. Applying it twice gives the same result as applying it once.
pub fn sanitize(raw: &str) -> String {
    let unwrapped = strip_wrappers(raw);

    let body = extract_fenced(&unwrapped).unwrap_or(unwrapped.as_str());
    let mut text = body.trim();

    // Leading prose before the object, e.g. "Here you go: {...}".
    if !text.starts_with('{') {
        if let Some(start) = text.find('{') {
            text = &text[start..];
        }
    }

    if text.starts_with('{') {
        text = cut_at_depth_zero(text);
    }
    text.to_string()
}

/// Remove complete wrapper regions, then any stray wrapper tag. Repeats
/// until nothing changes so nested or split tags cannot survive.
fn strip_wrappers(raw: &str) -> String {
    let mut current = raw.to_string();
    loop {
        let mut next = current.clone();
        for region in WRAPPER_REGIONS.iter() {
            next = region.replace_all(&next, "").into_owned();
        }
        next = STRAY_WRAPPER_TAG.replace_all(&next, "").into_owned();
        if next == current {
            return next;
        }
        current = next;
    }
}

/// Content between the first and second fence, without the language tag
/// on the opening line. With no closing fence, everything after the first.
fn extract_fenced(text: &str) -> Option<&str> {
    let open = text.find(FENCE)?;
    let after_open = &text[open + FENCE.len()..];

    let content = match after_open.find(FENCE) {
        Some(close) => &after_open[..close],
        None => after_open,
    };

    // Drop an info string like `json` when the opening line carries one.
    match content.find('\n') {
        Some(newline) if is_info_string(&content[..newline]) => Some(&content[newline + 1..]),
        None if is_info_string(content) => Some(""),
        _ => Some(content),
    }
}

fn is_info_string(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty()
        && line
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.'))
}

/// Plain brace counter, deliberately blind to strings: cut where the first
/// `{` is balanced. Unbalanced text is returned whole.
fn cut_at_depth_zero(text: &str) -> &str {
    let mut depth: usize = 0;
    for (i, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return &text[..i + c.len_utf8()];
                }
            }
            _ => {}
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_fenced_json_and_drops_commentary() {
        let raw = "Here is the JSON:\n```json\n{\"a\":1}\n```\nThanks!";
        assert_eq!(sanitize(raw), "{\"a\":1}");
    }

    #[test]
    fn fence_without_language_tag() {
        let raw = "```\n{\"a\": [1, 2]}\n```";
        assert_eq!(sanitize(raw), "{\"a\": [1, 2]}");
    }

    #[test]
    fn unclosed_fence_keeps_remainder() {
        let raw = "```json\n{\"a\": {\"b\": 1";
        assert_eq!(sanitize(raw), "{\"a\": {\"b\": 1");
    }

    #[test]
    fn removes_reasoning_regions() {
        let raw = "<think>maybe {\"x\": 1}?</think>\n{\"a\": true}";
        assert_eq!(sanitize(raw), "{\"a\": true}");
    }

    #[test]
    fn removes_tool_call_envelope_and_stray_tags() {
        let raw = "<tool_call>{\"a\": 2}";
        assert_eq!(sanitize(raw), "{\"a\": 2}");
        let raw = "{\"a\": 3}</reasoning>";
        assert_eq!(sanitize(raw), "{\"a\": 3}");
    }

    #[test]
    fn truncates_trailing_text_after_object() {
        let raw = "{\"a\": {\"b\": 1}} and some closing remarks {not json}";
        assert_eq!(sanitize(raw), "{\"a\": {\"b\": 1}}");
    }

    #[test]
    fn skips_leading_prose() {
        let raw = "Sure, the analysis is: {\"a\": 1} Let me know!";
        assert_eq!(sanitize(raw), "{\"a\": 1}");
    }

    #[test]
    fn brace_counter_ignores_string_boundaries() {
        // A brace inside a string value ends the scan early; the later
        // repair stages deal with what remains.
        let raw = "{\"a\": \"}\", \"b\": 2}";
        assert_eq!(sanitize(raw), "{\"a\": \"}");
    }

    #[test]
    fn text_without_json_is_trimmed_only() {
        assert_eq!(sanitize("  I cannot help with that.  "), "I cannot help with that.");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn sanitize_is_a_fixed_point() {
        let samples = [
            "Here is the JSON:\n```json\n{\"a\":1}\n```\nThanks!",
            "```\n{\"a\": \"```\"}\n```",
            "<think>a</think><think>b</think>{\"k\": [1,2,3]}",
            "<thi<think></think>nk>{}",
            "prefix {\"a\": {\"b\": 2} trailing",
            "{\"a\": \"}\", \"b\": 2}",
            "```json",
            "```\nnote: {\"a\": 1}\n```",
            "no json here",
            "   {\"deep\": {\"deeper\": {\"deepest\": {}}}}   tail ",
            "<tool_call>\n```json\n{\"x\": 1}\n```\n</tool_call>",
        ];
        for sample in samples {
            let once = sanitize(sample);
            assert_eq!(sanitize(&once), once, "not a fixed point for {sample:?}");
        }
    }
}
