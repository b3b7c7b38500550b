use std::sync::LazyLock;

use regex::Regex;

use super::scan::DelimiterScanner;

static BARE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(\s*)([A-Za-z_][A-Za-z0-9_]*)(\s*):").unwrap());

/// Best-effort fixes for the usual ways model JSON goes wrong: trailing
/// commas, truncated output, unterminated strings, bare keys.
///
/// Never fails. The result may still be unparseable.
pub fn repair_syntax(text: &str) -> String {
    let text = strip_trailing_commas(text);
    let text = balance_delimiters(&text);
    let text = close_dangling_strings(&text);
    let text = quote_bare_keys(&text);
    strip_trailing_commas(&text)
}

/// Remove a comma that directly precedes `}` or `]`, ignoring commas
/// inside strings.
pub fn strip_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut scanner = DelimiterScanner::new();
    for (i, c) in text.char_indices() {
        let outside = !scanner.in_string();
        scanner.feed(c);
        if outside && c == ',' {
            let next = text[i + 1..].trim_start().chars().next();
            if matches!(next, Some('}' | ']')) {
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Balance `{}` and `[]` together, honouring nesting.
///
/// Too many closers: cut at the last point where everything was closed,
/// or just before the offending closer. Too few: cut at the last balanced
/// point if one exists, otherwise close the open string and append the
/// missing closers innermost first.
fn balance_delimiters(text: &str) -> String {
    let mut scanner = DelimiterScanner::new();
    let mut last_balanced: Option<usize> = None;

    for (i, c) in text.char_indices() {
        if scanner.feed(c).is_violation() {
            return match last_balanced {
                Some(cut) => text[..cut].to_string(),
                None => balance_delimiters(&text[..i]),
            };
        }
        if matches!(c, '}' | ']') && scanner.depth() == 0 && !scanner.in_string() {
            last_balanced = Some(i + c.len_utf8());
        }
    }

    if scanner.depth() == 0 && !scanner.in_string() {
        return text.to_string();
    }
    if let Some(cut) = last_balanced {
        return text[..cut].to_string();
    }

    let mut out = if scanner.in_string() {
        let mut body = text.to_string();
        if scanner.is_escaping() {
            body.pop();
        }
        body.push('"');
        body
    } else {
        text.trim_end().to_string()
    };
    out.push_str(&scanner.closers());
    out
}

/// Close a string left open on a single line: before a trailing comma if
/// there is one, otherwise at end of line.
fn close_dangling_strings(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            if count_unescaped_quotes(line) % 2 == 0 {
                return line.to_string();
            }
            let trimmed = line.trim_end();
            match trimmed.strip_suffix(',') {
                Some(body) => format!("{body}\","),
                None => format!("{trimmed}\""),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn count_unescaped_quotes(line: &str) -> usize {
    let mut count = 0;
    let mut backslashes = 0;
    for c in line.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' => {
                if backslashes % 2 == 0 {
                    count += 1;
                }
                backslashes = 0;
            }
            _ => backslashes = 0,
        }
    }
    count
}

/// `  name: 1` → `  "name": 1`.
fn quote_bare_keys(text: &str) -> String {
    BARE_KEY.replace_all(text, "$1\"$2\"$3:").into_owned()
}
