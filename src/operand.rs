//! Operand boundary scanning
//!
//! A rule pattern captures everything on either side of an operator. These
//! scanners cut that capture down to the operand itself: the nearest token,
//! including any bracketed call, index or group attached to it.

/// Left capture split at the start of the operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeftOperand<'a> {
    pub pre_operand: &'a str,
    pub operand: &'a str,
}

/// Right capture split at the end of the operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RightOperand<'a> {
    pub operand: &'a str,
    pub post_operand: &'a str,
}

fn is_open_bracket(ch: u8) -> bool {
    matches!(ch, b'{' | b'[' | b'(')
}

fn is_close_bracket(ch: u8) -> bool {
    matches!(ch, b'}' | b']' | b')')
}

fn is_quote(ch: u8) -> bool {
    ch == b'"' || ch == b'\''
}

fn is_separator(ch: u8) -> bool {
    matches!(ch, b' ' | b'\t' | b'\r' | b'\n' | b',')
}

/// Whether the byte at `pos` is preceded by an odd run of backslashes
fn is_escaped(bytes: &[u8], pos: usize) -> bool {
    bytes[..pos]
        .iter()
        .rev()
        .take_while(|&&ch| ch == b'\\')
        .count()
        % 2
        == 1
}

/// Scan right to left for the start of the operand.
///
/// The scan stops at the first separator or unmatched opening bracket; that
/// byte stays in `pre_operand`.
pub fn parse_left_operand(text: &str) -> LeftOperand<'_> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut open_quote: Option<u8> = None;
    let mut split = None;

    for pos in (0..bytes.len()).rev() {
        let ch = bytes[pos];

        if let Some(quote) = open_quote {
            if ch == quote && !is_escaped(bytes, pos) {
                open_quote = None;
            }
            continue;
        }

        if is_quote(ch) {
            open_quote = Some(ch);
        } else if is_close_bracket(ch) {
            depth += 1;
        } else if is_open_bracket(ch) {
            if depth == 0 {
                split = Some(pos + 1);
                break;
            }
            depth -= 1;
        } else if is_separator(ch) && depth == 0 {
            split = Some(pos + 1);
            break;
        }
    }

    match split {
        Some(at) => LeftOperand {
            pre_operand: &text[..at],
            operand: &text[at..],
        },
        None => LeftOperand {
            pre_operand: "",
            operand: text,
        },
    }
}

/// Scan left to right for the end of the operand.
///
/// The scan stops at the first separator or unmatched closing bracket; that
/// byte starts `post_operand`.
pub fn parse_right_operand(text: &str) -> RightOperand<'_> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut open_quote: Option<u8> = None;
    let mut escaped = false;
    let mut split = None;

    for (pos, &ch) in bytes.iter().enumerate() {
        if let Some(quote) = open_quote {
            if escaped {
                escaped = false;
            } else if ch == b'\\' {
                escaped = true;
            } else if ch == quote {
                open_quote = None;
            }
            continue;
        }

        if is_quote(ch) {
            open_quote = Some(ch);
        } else if is_open_bracket(ch) {
            depth += 1;
        } else if is_close_bracket(ch) {
            if depth == 0 {
                split = Some(pos);
                break;
            }
            depth -= 1;
        } else if is_separator(ch) && depth == 0 {
            split = Some(pos);
            break;
        }
    }

    match split {
        Some(at) => RightOperand {
            operand: &text[..at],
            post_operand: &text[at..],
        },
        None => RightOperand {
            operand: text,
            post_operand: "",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_left_stops_at_space() {
        let left = parse_left_operand("result = a");
        assert_eq!(left.pre_operand, "result = ");
        assert_eq!(left.operand, "a");
    }

    #[test]
    fn test_left_stops_at_open_bracket() {
        let left = parse_left_operand("if (count");
        assert_eq!(left.pre_operand, "if (");
        assert_eq!(left.operand, "count");
    }

    #[test]
    fn test_left_keeps_nested_call() {
        let left = parse_left_operand("x = values[get(i, j)]");
        assert_eq!(left.pre_operand, "x = ");
        assert_eq!(left.operand, "values[get(i, j)]");
    }

    #[test]
    fn test_left_skips_quoted_brackets() {
        let left = parse_left_operand(r#"x = f("(, ")"#);
        assert_eq!(left.pre_operand, "x = ");
        assert_eq!(left.operand, r#"f("(, ")"#);
    }

    #[test]
    fn test_left_whole_text() {
        let left = parse_left_operand("total");
        assert_eq!(left.pre_operand, "");
        assert_eq!(left.operand, "total");
    }

    #[test]
    fn test_right_stops_at_space() {
        let right = parse_right_operand("b > 0) {");
        assert_eq!(right.operand, "b");
        assert_eq!(right.post_operand, " > 0) {");
    }

    #[test]
    fn test_right_stops_at_close_bracket() {
        let right = parse_right_operand("offset)");
        assert_eq!(right.operand, "offset");
        assert_eq!(right.post_operand, ")");
    }

    #[test]
    fn test_right_keeps_member_access_and_call() {
        let right = parse_right_operand("obj->size(a, b), next");
        assert_eq!(right.operand, "obj->size(a, b)");
        assert_eq!(right.post_operand, ", next");
    }

    #[test]
    fn test_right_skips_escaped_quote() {
        let right = parse_right_operand(r#""a\" b" c"#);
        assert_eq!(right.operand, r#""a\" b""#);
        assert_eq!(right.post_operand, " c");
    }

    #[test]
    fn test_right_whole_text() {
        let right = parse_right_operand("b");
        assert_eq!(right.operand, "b");
        assert_eq!(right.post_operand, "");
    }
}
