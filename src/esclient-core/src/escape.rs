use std::fmt::Write as _;

/// Escape free text for interpolation between quotes in a hand-built JSON body.
///
/// Backslash and quote get a leading backslash, the usual control characters get
/// their short escapes, and everything below 0x20, in U+0080..U+009F or in
/// U+2000..U+20FF becomes `\uXXXX` (lowercase hex). A `/` right after `<` is
/// escaped so `</script>` never appears verbatim.
pub fn escape_json(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 10);
    let mut prev = '\0';

    for c in input.chars() {
        match c {
            '\\' | '"' => {
                out.push('\\');
                out.push(c);
            }
            '/' => {
                if prev == '<' {
                    out.push('\\');
                }
                out.push(c);
            }
            '\u{08}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\u{0C}' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            c if needs_unicode_escape(c) => {
                // Writing to a String cannot fail
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
        prev = c;
    }

    out
}

fn needs_unicode_escape(c: char) -> bool {
    c < ' ' || ('\u{80}'..'\u{A0}').contains(&c) || ('\u{2000}'..'\u{2100}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(escape_json(""), "");
        assert_eq!(escape_json("hello world"), "hello world");
        assert_eq!(escape_json("héllo ünïcode 日本"), "héllo ünïcode 日本");
    }

    #[test]
    fn test_quote_and_backslash() {
        assert_eq!(escape_json(r#"say "hi" \ bye"#), r#"say \"hi\" \\ bye"#);
    }

    #[test]
    fn test_named_escapes() {
        assert_eq!(escape_json("a\u{08}b\tc\nd\u{0C}e\rf"), "a\\bb\\tc\\nd\\fe\\rf");
    }

    #[test]
    fn test_unicode_escapes() {
        assert_eq!(escape_json("\u{01}"), "\\u0001");
        assert_eq!(escape_json("\u{1f}"), "\\u001f");
        assert_eq!(escape_json("\u{85}"), "\\u0085");
        assert_eq!(escape_json("\u{2028}"), "\\u2028");
        assert_eq!(escape_json("\u{20ac}"), "\\u20ac");
        // Just outside the escaped ranges
        assert_eq!(escape_json("\u{a0}"), "\u{a0}");
        assert_eq!(escape_json("\u{2100}"), "\u{2100}");
    }

    #[test]
    fn test_slash_only_escaped_after_angle_bracket() {
        assert_eq!(escape_json("a/b"), "a/b");
        assert_eq!(escape_json("</script>"), "<\\/script>");
        assert_eq!(escape_json("< /"), "< /");
    }

    #[test]
    fn test_decodes_back_to_original() {
        let original = "quote \" backslash \\ tab \t dash \u{2014} end </tag>";
        let encoded = format!("\"{}\"", escape_json(original));
        let decoded: String = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, original);
    }
}
