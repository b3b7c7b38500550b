//! String-aware delimiter tracking shared by the repair stages.

/// Outcome of feeding one character to a [`DelimiterScanner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Ok,
    /// A closer arrived with nothing open.
    Underflow,
    /// A closer arrived that does not match the innermost open structure.
    Mismatch,
}

impl Step {
    pub fn is_violation(self) -> bool {
        !matches!(self, Step::Ok)
    }
}

/// Tracks open `{`/`[` structures and string state over a character stream.
///
/// Delimiters inside strings are ignored. A quote toggles string state only
/// when it is not escaped by an odd run of backslashes.
#[derive(Debug, Clone, Default)]
pub struct DelimiterScanner {
    stack: Vec<char>,
    in_string: bool,
    escaped: bool,
}

impl DelimiterScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, c: char) -> Step {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == '"' {
                self.in_string = false;
            }
            return Step::Ok;
        }

        match c {
            '"' => self.in_string = true,
            '{' | '[' => self.stack.push(c),
            '}' | ']' => {
                let expected = if c == '}' { '{' } else { '[' };
                match self.stack.last() {
                    None => return Step::Underflow,
                    Some(&open) if open != expected => return Step::Mismatch,
                    Some(_) => {
                        self.stack.pop();
                    }
                }
            }
            _ => {}
        }
        Step::Ok
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn in_string(&self) -> bool {
        self.in_string
    }

    /// True when the last character fed was an unescaped backslash inside
    /// a string, so an appended quote would be escaped.
    pub fn is_escaping(&self) -> bool {
        self.escaped
    }

    /// Force the current string closed, as if a quote had been appended.
    pub fn close_string(&mut self) {
        self.in_string = false;
        self.escaped = false;
    }

    /// The innermost open delimiter, if any.
    pub fn innermost(&self) -> Option<char> {
        self.stack.last().copied()
    }

    /// Closing delimiters for every open structure, innermost first.
    pub fn closers(&self) -> String {
        self.stack
            .iter()
            .rev()
            .map(|&open| if open == '{' { '}' } else { ']' })
            .collect()
    }
}

/// Count `(record openers, record closers, list openers, list closers)`
/// outside strings. Used to check balance of repaired output.
pub fn delimiter_counts(text: &str) -> (usize, usize, usize, usize) {
    let mut scanner = DelimiterScanner::new();
    let mut counts = (0, 0, 0, 0);
    for c in text.chars() {
        let outside = !scanner.in_string();
        scanner.feed(c);
        if outside {
            match c {
                '{' => counts.0 += 1,
                '}' => counts.1 += 1,
                '[' => counts.2 += 1,
                ']' => counts.3 += 1,
                _ => {}
            }
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(text: &str) -> (DelimiterScanner, Vec<Step>) {
        let mut scanner = DelimiterScanner::new();
        let steps = text.chars().map(|c| scanner.feed(c)).collect();
        (scanner, steps)
    }

    #[test]
    fn ignores_delimiters_inside_strings() {
        let (scanner, steps) = scan(r#"{"a": "}]{["#);
        assert!(steps.iter().all(|s| !s.is_violation()));
        assert!(scanner.in_string());
        assert_eq!(scanner.depth(), 1);
    }

    #[test]
    fn escaped_quote_keeps_string_open() {
        let (scanner, _) = scan(r#"{"a": "say \"hi"#);
        assert!(scanner.in_string());
    }

    #[test]
    fn escaped_backslash_before_quote_closes_string() {
        let (scanner, _) = scan(r#"{"a": "path\\"#);
        assert!(scanner.in_string());
        let (scanner, _) = scan(r#"{"a": "path\\""#);
        assert!(!scanner.in_string());
    }

    #[test]
    fn reports_underflow_and_mismatch() {
        let (_, steps) = scan("}");
        assert_eq!(steps, vec![Step::Underflow]);
        let (_, steps) = scan("{]");
        assert_eq!(steps[1], Step::Mismatch);
    }

    #[test]
    fn closers_follow_nesting_order() {
        let (scanner, _) = scan(r#"{"a": [{"b": ["#);
        assert_eq!(scanner.closers(), "]}]}");
    }

    #[test]
    fn counts_only_structural_delimiters() {
        assert_eq!(delimiter_counts(r#"{"x": "{[", "y": [1]}"#), (1, 1, 1, 1));
    }
}
