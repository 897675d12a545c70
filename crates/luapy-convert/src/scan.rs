//! String-aware scanning helpers shared by the block machine and table parser.
//!
//! All helpers skip over quoted strings (`"..."`, `'...'`) and single-line
//! long brackets (`[[...]]`), so separators inside literals are never seen.

/// Visit every character outside string literals.
///
/// The callback receives the byte offset, the character and the bracket
/// depth before that character is applied. Returning `false` stops the walk.
fn walk(text: &str, mut visit: impl FnMut(usize, char, i32) -> bool) {
    let bytes = text.as_bytes();
    let mut chars = text.char_indices().peekable();
    let mut depth = 0i32;
    while let Some((i, c)) = chars.next() {
        match c {
            '"' | '\'' => {
                let mut escaped = false;
                for (_, inner) in chars.by_ref() {
                    if escaped {
                        escaped = false;
                    } else if inner == '\\' {
                        escaped = true;
                    } else if inner == c {
                        break;
                    }
                }
            }
            '[' if bytes.get(i + 1) == Some(&b'[') => {
                let close = text[i + 2..].find("]]").map(|p| i + 2 + p + 2);
                let end = close.unwrap_or(text.len());
                while chars.peek().is_some_and(|&(j, _)| j < end) {
                    chars.next();
                }
            }
            _ => {
                if !visit(i, c, depth) {
                    return;
                }
                match c {
                    '(' | '[' | '{' => depth += 1,
                    ')' | ']' | '}' => depth -= 1,
                    _ => {}
                }
            }
        }
    }
}

/// Split off a trailing `-- comment`. Returns the code and the comment text.
pub fn split_comment(line: &str) -> (&str, Option<&str>) {
    let bytes = line.as_bytes();
    let mut found = None;
    walk(line, |i, c, _| {
        if c == '-' && bytes.get(i + 1) == Some(&b'-') {
            found = Some(i);
            return false;
        }
        true
    });
    match found {
        Some(i) => (line[..i].trim_end(), Some(line[i + 2..].trim())),
        None => (line, None),
    }
}

/// Split at separators that sit outside every bracket and string.
pub fn split_top_level<'a>(text: &'a str, separators: &[char]) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut start = 0;
    walk(text, |i, c, depth| {
        if depth == 0 && separators.contains(&c) {
            parts.push(&text[start..i]);
            start = i + c.len_utf8();
        }
        true
    });
    parts.push(&text[start..]);
    parts
}

/// Net count of `{` minus `}` outside strings.
pub fn brace_balance(text: &str) -> i32 {
    let mut balance = 0;
    walk(text, |_, c, _| {
        match c {
            '{' => balance += 1,
            '}' => balance -= 1,
            _ => {}
        }
        true
    });
    balance
}

/// Byte offset of the first top-level assignment `=` (not `==`, `~=`, `<=`, `>=`).
pub fn find_assignment(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut found = None;
    walk(text, |i, c, depth| {
        if depth == 0 && c == '=' {
            let prev = i.checked_sub(1).map(|p| bytes[p]);
            let next = bytes.get(i + 1).copied();
            let compound = matches!(prev, Some(b'=' | b'~' | b'<' | b'>')) || next == Some(b'=');
            if !compound {
                found = Some(i);
                return false;
            }
        }
        true
    });
    found
}

/// Byte offset of a standalone keyword outside strings and brackets.
pub fn find_keyword(text: &str, keyword: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut found = None;
    walk(text, |i, _, depth| {
        if depth == 0 && text[i..].starts_with(keyword) {
            let before = i.checked_sub(1).map(|p| bytes[p]);
            let after = bytes.get(i + keyword.len()).copied();
            let is_word = |b: Option<u8>| b.is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_');
            if !is_word(before) && !is_word(after) {
                found = Some(i);
                return false;
            }
        }
        true
    });
    found
}

/// ASCII Lua identifier.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Whether `text` ends with the keyword `end` as a whole word.
pub fn strip_trailing_end(text: &str) -> Option<&str> {
    let body = text.strip_suffix("end")?;
    match body.chars().last() {
        None => Some(body),
        Some(c) if c.is_whitespace() || c == ';' || c == ')' => Some(body.trim_end()),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_outside_strings_only() {
        assert_eq!(
            split_comment(r#"x = "a -- b" -- note"#),
            (r#"x = "a -- b""#, Some("note"))
        );
        assert_eq!(split_comment("x = 1"), ("x = 1", None));
    }

    #[test]
    fn top_level_split_respects_nesting() {
        assert_eq!(
            split_top_level(r#"f(a, b), {1, 2}, "x, y""#, &[',']),
            vec!["f(a, b)", " {1, 2}", r#" "x, y""#]
        );
    }

    #[test]
    fn brace_balance_ignores_strings() {
        assert_eq!(brace_balance(r#"t = { "}" "#), 1);
        assert_eq!(brace_balance("t = {a = {1}}"), 0);
    }

    #[test]
    fn assignment_skips_comparisons() {
        assert_eq!(find_assignment("a == b"), None);
        assert_eq!(find_assignment("a ~= b"), None);
        assert_eq!(find_assignment("x = a >= b"), Some(2));
        assert_eq!(find_assignment("f(a = 1)"), None);
    }

    #[test]
    fn keyword_requires_word_boundary() {
        assert_eq!(find_keyword("a else b", "else"), Some(2));
        assert_eq!(find_keyword("elsewhere", "else"), None);
        assert_eq!(find_keyword(r#""else""#, "else"), None);
    }

    #[test]
    fn trailing_end_is_a_word() {
        assert_eq!(strip_trailing_end("return x end"), Some("return x"));
        assert_eq!(strip_trailing_end("end"), Some(""));
        assert_eq!(strip_trailing_end("append"), None);
    }
}
