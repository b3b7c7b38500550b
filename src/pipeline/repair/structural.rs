use super::scan::DelimiterScanner;
use super::syntax::strip_trailing_commas;

/// Aggressive line-based reconstruction for output the syntax pass could
/// not fix.
///
/// Lines are accepted in order until one closes a structure that is not
/// open at that point; that line and everything after it are discarded.
/// Strings still open at the end of an accepted line are closed there. The
/// kept prefix is then trimmed of dangling commas and keys and every open
/// structure is closed. The result is always balanced.
pub fn repair_structurally(text: &str) -> String {
    let cleaned = strip_control_chars(text);
    let mut scanner = DelimiterScanner::new();
    let mut kept: Vec<String> = Vec::new();
    let mut opened = false;

    'lines: for line in cleaned.split('\n') {
        let mut trial = scanner.clone();
        let mut top_close: Option<usize> = None;

        for (i, c) in line.char_indices() {
            let outside = !trial.in_string();
            if trial.feed(c).is_violation() {
                break 'lines;
            }
            if outside && matches!(c, '{' | '[') {
                opened = true;
            }
            if top_close.is_none()
                && outside
                && opened
                && matches!(c, '}' | ']')
                && trial.depth() == 0
            {
                top_close = Some(i + c.len_utf8());
            }
        }

        // Top-level value finished on this line; the rest is commentary.
        if let Some(end) = top_close {
            kept.push(line[..end].to_string());
            break;
        }

        let mut accepted = line.to_string();
        if trial.in_string() {
            if trial.is_escaping() {
                accepted.pop();
            }
            accepted.push('"');
            trial.close_string();
        }
        scanner = trial;
        kept.push(accepted);
    }

    let body = drop_dangling_tail(kept.join("\n"));

    let mut scanner = DelimiterScanner::new();
    for c in body.chars() {
        scanner.feed(c);
    }
    let mut out = body;
    out.push_str(&scanner.closers());
    strip_trailing_commas(&out)
}

/// Remove non-printable control characters. Newlines are kept for the line
/// scan and tabs become spaces.
fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\n' => Some('\n'),
            '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

/// Trim what cannot end a value: trailing commas, `"key":` with no value,
/// a bare `"key"` inside an object, and a literal or number cut short.
fn drop_dangling_tail(mut text: String) -> String {
    loop {
        let trimmed_len = text.trim_end().len();
        text.truncate(trimmed_len);

        if text.ends_with(',') {
            text.pop();
            continue;
        }
        if text.ends_with(':') {
            text.pop();
            let trimmed_len = text.trim_end().len();
            text.truncate(trimmed_len);
            if let Some(start) = trailing_string_start(&text) {
                text.truncate(start);
            }
            continue;
        }
        if let Some(start) = partial_scalar_start(&text) {
            text.truncate(start);
            continue;
        }
        if let Some(start) = trailing_string_start(&text) {
            if is_object_key_position(&text[..start]) {
                text.truncate(start);
                continue;
            }
        }
        return text;
    }
}

/// Byte offset where a trailing bare value starts, when that value is not a
/// complete literal or number (`fal`, `0.`, `-`).
fn partial_scalar_start(text: &str) -> Option<usize> {
    let start = text
        .char_indices()
        .rev()
        .find(|&(_, c)| c.is_whitespace() || matches!(c, ':' | ',' | '[' | ']' | '{' | '}' | '"'))
        .map_or(0, |(i, c)| i + c.len_utf8());
    let token = &text[start..];
    if token.is_empty() {
        return None;
    }
    let complete = matches!(token, "true" | "false" | "null")
        || serde_json::from_str::<serde_json::Number>(token).is_ok();
    (!complete).then_some(start)
}

/// Byte offset of the opening quote when `text` ends with a complete string.
fn trailing_string_start(text: &str) -> Option<usize> {
    if !text.ends_with('"') {
        return None;
    }
    let mut scanner = DelimiterScanner::new();
    let mut last_open = None;
    for (i, c) in text.char_indices() {
        let was_in_string = scanner.in_string();
        scanner.feed(c);
        if !was_in_string && scanner.in_string() {
            last_open = Some(i);
        }
    }
    if scanner.in_string() {
        return None;
    }
    last_open.filter(|&start| start + 1 < text.len())
}

/// True when a string starting right after `prefix` would be an object key.
fn is_object_key_position(prefix: &str) -> bool {
    let before = prefix.trim_end();
    if !(before.ends_with(',') || before.ends_with('{')) {
        return false;
    }
    let mut scanner = DelimiterScanner::new();
    for c in before.chars() {
        scanner.feed(c);
    }
    scanner.innermost() == Some('{')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::repair::scan::delimiter_counts;

    fn parse_object(text: &str) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(serde_json::Value::Object(map)) => map,
            other => panic!("not an object: {text:?} → {other:?}"),
        }
    }

    #[test]
    fn discards_everything_from_first_broken_line() {
        let out = repair_structurally("{\"a\": 1,\n}}}\n\"b\": 2}");
        assert_eq!(out, "{\"a\": 1}");
        let map = parse_object(&out);
        assert!(!map.contains_key("b"));
    }

    #[test]
    fn closes_nested_structures_after_truncation() {
        let out = repair_structurally("{\n\"x\": {\n\"y\": [1, 2,\n");
        let map = parse_object(&out);
        assert_eq!(map["x"]["y"], serde_json::json!([1, 2]));
    }

    #[test]
    fn closes_string_at_end_of_line() {
        let out = repair_structurally("{\n\"a\": \"unterminated\n");
        assert_eq!(parse_object(&out)["a"], "unterminated");
    }

    #[test]
    fn drops_key_without_value() {
        let out = repair_structurally("{\n\"a\": 1,\n\"b\":");
        assert_eq!(out, "{\n\"a\": 1}");
        let out = repair_structurally("{\n\"a\": [1, 2],\n\"b\"");
        assert_eq!(parse_object(&out).len(), 1);
    }

    #[test]
    fn keeps_trailing_string_values() {
        let out = repair_structurally("{\"tags\": [\"x\", \"y\"");
        assert_eq!(parse_object(&out)["tags"], serde_json::json!(["x", "y"]));
        let out = repair_structurally("{\"name\": \"Nova\"");
        assert_eq!(parse_object(&out)["name"], "Nova");
    }

    #[test]
    fn strips_control_characters() {
        let out = repair_structurally("{\"a\":\u{7} \"b\u{0}c\"}");
        assert_eq!(parse_object(&out)["a"], "bc");
    }

    #[test]
    fn stops_once_top_level_object_closes() {
        let out = repair_structurally("{\n\"a\": 1\n}\"}\" trailing {");
        assert_eq!(parse_object(&out)["a"], 1);
    }

    #[test]
    fn wrong_kind_closer_counts_as_broken_line() {
        let out = repair_structurally("{\n\"a\": [1,\n2}\n}");
        assert_eq!(parse_object(&out)["a"], serde_json::json!([1]));
    }

    #[test]
    fn output_is_always_balanced() {
        let samples = [
            "}{][",
            "{\"a\": [1, {\"b\": 2]",
            "{\n\"a\": [\n{\"b\": \"c\n]]]\n}",
            "[[[{",
            "{\"a\": \"\\",
            "{\n  \"list\": [\"one\", \"two\"\n  \"next\": {\n",
            "not json at all",
            "",
            "{\"k\": \"v\"}}}}",
            "{\n\"a\":\n",
        ];
        for sample in samples {
            let out = repair_structurally(sample);
            let (ro, rc, lo, lc) = delimiter_counts(&out);
            assert_eq!(ro, rc, "record delimiters unbalanced for {sample:?}: {out:?}");
            assert_eq!(lo, lc, "list delimiters unbalanced for {sample:?}: {out:?}");
        }
    }

    #[test]
    fn cut_literals_and_numbers_are_dropped() {
        let out = repair_structurally("{\n\"a\": 1,\n\"is_optimal\": fal");
        assert_eq!(out, "{\n\"a\": 1}");
        let out = repair_structurally("{\"x\": 0.");
        assert_eq!(out, "{}");
        let out = repair_structurally("{\"flags\": [true, nu");
        assert_eq!(parse_object(&out)["flags"], serde_json::json!([true]));
        let out = repair_structurally("{\"n\": -");
        assert_eq!(out, "{}");
    }

    #[test]
    fn complete_scalars_at_the_cut_are_kept() {
        let out = repair_structurally("{\"a\": false");
        assert_eq!(parse_object(&out)["a"], false);
        let out = repair_structurally("{\"a\": [1.5, 12");
        assert_eq!(parse_object(&out)["a"], serde_json::json!([1.5, 12]));
    }

    #[test]
    fn every_prefix_of_a_pretty_document_parses() {
        let full = serde_json::to_string_pretty(&crate::pipeline::structuring::fallback_document())
            .unwrap();
        let cuts = full.char_indices().map(|(i, _)| i).skip(1).chain([full.len()]);
        for cut in cuts {
            let prefix = &full[..cut];
            let out = repair_structurally(prefix);
            let (ro, rc, lo, lc) = delimiter_counts(&out);
            assert_eq!((ro, lo), (rc, lc), "unbalanced at {cut}: {out:?}");
            assert!(
                matches!(serde_json::from_str::<serde_json::Value>(&out), Ok(serde_json::Value::Object(_))),
                "prefix of {cut} bytes did not repair to an object: {out:?}"
            );
            if cut >= full.len() / 2 {
                let repaired = crate::pipeline::repair::parse_model_output(prefix)
                    .unwrap_or_else(|e| panic!("prefix of {cut} bytes exhausted repair: {e}"));
                assert!(repaired.object.contains_key("executive_analysis"));
            }
        }
    }

    #[test]
    fn truncated_documents_become_parseable_objects() {
        let samples = [
            "{\n\"a\": [\n{\"b\": \"c\n]]]\n}",
            "{\"a\": \"\\",
            "{\n\"a\":\n",
            "{\n  \"risk_analysis\": {\n    \"technical_risks\": [\n      {\"risk\": \"Bridge\", \"severity\": \"Hi",
        ];
        for sample in samples {
            parse_object(&repair_structurally(sample));
        }
    }
}
