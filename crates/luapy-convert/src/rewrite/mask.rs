//! Hide string-literal contents from the rewrite rules.
//!
//! Each literal body is swapped for a token built from private-use code
//! points, which no rule pattern can match with `\w`, `\d` or `.` runs that
//! look for code. Quotes stay in place, so rules expecting `"..."` arguments
//! still see a quoted value.

const OPEN: char = '\u{E000}';
const CLOSE: char = '\u{E001}';
const DIGIT_BASE: u32 = 0xE010;

pub(crate) fn token(index: usize) -> String {
    let mut out = String::new();
    out.push(OPEN);
    for digit in format!("{index:x}").chars() {
        let value = digit.to_digit(16).unwrap_or(0);
        out.push(char::from_u32(DIGIT_BASE + value).unwrap_or(OPEN));
    }
    out.push(CLOSE);
    out
}

/// Replace every literal body with `stash(body)`.
///
/// Single-line long brackets `[[...]]` are emitted as triple-quoted strings.
pub(crate) fn mask(text: &str, mut stash: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(['"', '\'', '[']) {
        let (before, at) = rest.split_at(pos);
        out.push_str(before);
        let quote = at.as_bytes()[0];
        if quote == b'[' {
            match at.strip_prefix("[[").and_then(|s| s.split_once("]]")) {
                Some((body, after)) => {
                    out.push_str("\"\"\"");
                    out.push_str(&stash(body));
                    out.push_str("\"\"\"");
                    rest = after;
                }
                None => {
                    out.push('[');
                    rest = &at[1..];
                }
            }
            continue;
        }
        let body_start = 1;
        let mut end = None;
        let mut escaped = false;
        for (i, b) in at.bytes().enumerate().skip(body_start) {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == quote {
                end = Some(i);
                break;
            }
        }
        let quote = quote as char;
        out.push(quote);
        match end {
            Some(end) => {
                let body = &at[body_start..end];
                if !body.is_empty() {
                    out.push_str(&stash(body));
                }
                out.push(quote);
                rest = &at[end + 1..];
            }
            None => {
                let body = &at[body_start..];
                if !body.is_empty() {
                    out.push_str(&stash(body));
                }
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Put literal bodies back.
pub(crate) fn unmask(text: &str, strings: &[String]) -> String {
    if !text.contains(OPEN) {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != OPEN {
            out.push(c);
            continue;
        }
        let mut index = 0usize;
        for d in chars.by_ref() {
            if d == CLOSE {
                break;
            }
            index = index * 16 + (d as u32).saturating_sub(DIGIT_BASE) as usize;
        }
        if let Some(s) = strings.get(index) {
            out.push_str(s);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(text: &str) -> (String, Vec<String>) {
        let mut strings = Vec::new();
        let masked = mask(text, |body| {
            strings.push(body.to_string());
            token(strings.len() - 1)
        });
        (masked, strings)
    }

    #[test]
    fn hides_code_like_text_in_strings() {
        let (masked, strings) = roundtrip(r#"print("nil or true", 'a..b')"#);
        assert!(!masked.contains("nil"));
        assert!(masked.starts_with("print(\""));
        assert_eq!(strings, vec!["nil or true", "a..b"]);
        assert_eq!(unmask(&masked, &strings), r#"print("nil or true", 'a..b')"#);
    }

    #[test]
    fn escaped_quotes_stay_inside() {
        let (_, strings) = roundtrip(r#"x = "say \"hi\"""#);
        assert_eq!(strings, vec![r#"say \"hi\""#]);
    }

    #[test]
    fn long_bracket_becomes_triple_quoted() {
        let (masked, strings) = roundtrip("s = [[raw]]");
        assert_eq!(unmask(&masked, &strings), r#"s = """raw""""#);
    }

    #[test]
    fn index_brackets_are_left_alone() {
        let (masked, strings) = roundtrip("t[i] = a[b[1]]");
        assert!(strings.is_empty());
        assert_eq!(masked, "t[i] = a[b[1]]");
    }

    #[test]
    fn tokens_survive_many_entries() {
        let text = (0..20).map(|i| format!("\"s{i}\"")).collect::<Vec<_>>().join(", ");
        let (masked, strings) = roundtrip(&text);
        assert_eq!(unmask(&masked, &strings), text);
    }
}
