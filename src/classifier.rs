//! Match classification
//!
//! Decides whether a candidate match may be mutated by looking only at the
//! raw text around it. These are line-oriented heuristics: multi-line string
//! literals, raw string literals and code that does not follow the pointer
//! naming convention are not handled.

/// Where a candidate match sits, judged from the text to its left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchContext {
    Code,
    Comment,
    Literal,
}

/// Prefixes that mark pointer variables (`p`, member `mp`, global `gp`)
pub const POINTER_PREFIXES: [&str; 3] = ["p", "mp", "gp"];

/// Classify a match from its left-hand capture.
///
/// Comments are checked before literals.
pub fn classify_context(lhs: &str) -> MatchContext {
    if in_comment(lhs) {
        MatchContext::Comment
    } else if in_string_or_char(lhs) {
        MatchContext::Literal
    } else {
        MatchContext::Code
    }
}

/// True if `lhs` ends inside an unterminated `/*` or `//` comment
pub fn in_comment(lhs: &str) -> bool {
    if let Some(start) = lhs.rfind("/*") {
        if !lhs[start..].contains("*/") {
            return true;
        }
    }

    if let Some(start) = lhs.rfind("//") {
        if !lhs[start..].contains('\n') {
            return true;
        }
    }

    false
}

/// True if `lhs` ends inside an open string or character literal
pub fn in_string_or_char(lhs: &str) -> bool {
    let mut open: Option<u8> = None;
    let mut escaped = false;

    for &ch in lhs.as_bytes() {
        match open {
            Some(quote) => {
                if escaped {
                    escaped = false;
                } else if ch == b'\\' {
                    escaped = true;
                } else if ch == quote {
                    open = None;
                }
            }
            None => {
                if ch == b'"' || ch == b'\'' {
                    open = Some(ch);
                }
            }
        }
    }

    open.is_some()
}

/// Subtracting two pointers yields a distance; swapping the operator
/// produces code that does not compile.
pub fn is_invalid_pointer_subtraction(operator: &str, lhs: &str, rhs: &str) -> bool {
    operator == "-" && is_pointer_name(lhs) && is_pointer_name(rhs)
}

/// `+` next to a string or char literal is concatenation, not arithmetic.
pub fn is_invalid_string_concatenation(operator: &str, lhs: &str, rhs: &str) -> bool {
    operator == "+" && (ends_with_quote(lhs) || ends_with_quote(rhs))
}

/// Either of the semantic rejections above
pub fn is_invalid_candidate(operator: &str, lhs: &str, rhs: &str) -> bool {
    is_invalid_pointer_subtraction(operator, lhs, rhs)
        || is_invalid_string_concatenation(operator, lhs, rhs)
}

fn is_pointer_name(operand: &str) -> bool {
    POINTER_PREFIXES
        .iter()
        .any(|prefix| operand.starts_with(prefix))
}

fn ends_with_quote(operand: &str) -> bool {
    operand.ends_with('"') || operand.ends_with('\'')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_comment() {
        assert!(in_comment("int x = 1; // a"));
        assert!(!in_comment("// note\nint x = a"));
        assert!(!in_comment("int x = a"));
    }

    #[test]
    fn test_block_comment() {
        assert!(in_comment("/* width"));
        assert!(in_comment("x = 1; /* old */ y = 2; /* width"));
        assert!(!in_comment("/* width */ x = a"));
    }

    #[test]
    fn test_string_literal() {
        assert!(in_string_or_char(r#"printf("a"#));
        assert!(!in_string_or_char(r#"printf("a") + b"#));
        assert!(in_string_or_char(r#"s = "say \"hi"#));
        assert!(!in_string_or_char(r#"s = "dir\\" "#));
    }

    #[test]
    fn test_char_literal() {
        assert!(in_string_or_char("c == '"));
        assert!(!in_string_or_char("c == '+' && d"));
        assert!(!in_string_or_char(r"c == '\'' && d"));
    }

    #[test]
    fn test_classify_prefers_comment() {
        assert_eq!(classify_context(r#"// "quoted"#), MatchContext::Comment);
        assert_eq!(classify_context(r#"log("x"#), MatchContext::Literal);
        assert_eq!(classify_context("total = a"), MatchContext::Code);
    }

    #[test]
    fn test_pointer_subtraction() {
        assert!(is_invalid_pointer_subtraction("-", "pEnd", "pBegin"));
        assert!(is_invalid_pointer_subtraction("-", "mpTail", "gpHead"));
        assert!(!is_invalid_pointer_subtraction("-", "pEnd", "count"));
        assert!(!is_invalid_pointer_subtraction("+", "pEnd", "pBegin"));
    }

    #[test]
    fn test_string_concatenation() {
        assert!(is_invalid_string_concatenation("+", r#""abc""#, "name"));
        assert!(is_invalid_string_concatenation("+", "c", "'x'"));
        assert!(!is_invalid_string_concatenation("+", "a", "b"));
        assert!(!is_invalid_string_concatenation("-", r#""abc""#, "b"));
    }
}
