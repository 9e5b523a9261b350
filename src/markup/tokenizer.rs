//! Markup tokenizer and escaping
//!
//! Splits a markup string into text and tag tokens. Tags are matched with
//! `regex`; text between tags is unescaped.

use crate::error::DecodeError;
use regex::Regex;
use std::sync::OnceLock;

/// Tag at the start of the haystack: `<name attrs>`, `</name>` or `<name attrs/>`.
const TAG_PATTERN: &str =
    r#"^<(/?)([A-Za-z_][\w.:-]*)((?:\s+[A-Za-z_][\w.:-]*\s*=\s*"[^"]*")*)\s*(/?)>"#;

/// One `name="value"` pair inside a tag.
const ATTRIBUTE_PATTERN: &str = r#"([A-Za-z_][\w.:-]*)\s*=\s*"([^"]*)""#;

fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(TAG_PATTERN).expect("tag pattern is valid"))
}

fn attribute_regex() -> &'static Regex {
    static ATTRIBUTE: OnceLock<Regex> = OnceLock::new();
    ATTRIBUTE.get_or_init(|| Regex::new(ATTRIBUTE_PATTERN).expect("attribute pattern is valid"))
}

/// A whole tag name, nothing else.
const TAG_NAME_PATTERN: &str = r"^[A-Za-z_][\w.:-]*$";

fn tag_name_regex() -> &'static Regex {
    static TAG_NAME: OnceLock<Regex> = OnceLock::new();
    TAG_NAME.get_or_init(|| Regex::new(TAG_NAME_PATTERN).expect("tag name pattern is valid"))
}

/// Whether `name` can be written as a tag and read back.
pub fn is_valid_tag_name(name: &str) -> bool {
    tag_name_regex().is_match(name)
}

/// Turn `name` into a valid tag name.
///
/// Unusable chars become `-`, and a name that does not start with an ASCII
/// letter or `_` gets a leading `_`. Valid names come back unchanged.
pub fn repair_tag_name(name: &str) -> String {
    if is_valid_tag_name(name) {
        return name.to_string();
    }
    let mut repaired: String = name
        .chars()
        .map(|c| {
            if c.is_alphabetic() || c.is_ascii_digit() || matches!(c, '_' | '.' | ':' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if !repaired.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        repaired.insert(0, '_');
    }
    repaired
}

// ─────────────────────────────────────────────────────────────────────────────
// Tokens
// ─────────────────────────────────────────────────────────────────────────────

/// A lexical unit of markup. Offsets are byte offsets into the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Text(String),
    Open {
        name: String,
        attributes: Vec<(String, String)>,
        offset: usize,
    },
    Close {
        name: String,
        offset: usize,
    },
    Empty {
        name: String,
        attributes: Vec<(String, String)>,
        offset: usize,
    },
}

/// Split `source` into tokens.
///
/// A `<` that does not start a well-formed tag is a [`DecodeError::MalformedTag`].
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, DecodeError> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < source.len() {
        let rest = &source[pos..];
        let Some(lt) = rest.find('<') else {
            tokens.push(Token::Text(unescape(rest)));
            break;
        };
        if lt > 0 {
            tokens.push(Token::Text(unescape(&rest[..lt])));
        }

        let offset = pos + lt;
        let captures = tag_regex()
            .captures(&source[offset..])
            .ok_or(DecodeError::MalformedTag { offset })?;

        let closing = !captures[1].is_empty();
        let self_closing = !captures[4].is_empty();
        let name = captures[2].to_string();
        let attributes = parse_attributes(&captures[3]);

        let token = match (closing, self_closing) {
            (true, false) if attributes.is_empty() => Token::Close { name, offset },
            (true, _) => return Err(DecodeError::MalformedTag { offset }),
            (false, true) => Token::Empty {
                name,
                attributes,
                offset,
            },
            (false, false) => Token::Open {
                name,
                attributes,
                offset,
            },
        };
        tokens.push(token);
        pos = offset + captures[0].len();
    }

    Ok(tokens)
}

fn parse_attributes(source: &str) -> Vec<(String, String)> {
    attribute_regex()
        .captures_iter(source)
        .map(|c| (c[1].to_string(), unescape(&c[2])))
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Escaping
// ─────────────────────────────────────────────────────────────────────────────

/// Escape text content.
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape an attribute value for use inside double quotes.
pub fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

/// Undo [`escape_text`] / [`escape_attribute`]. Unknown entities are kept verbatim.
pub fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn open(name: &str, offset: usize) -> Token {
        Token::Open {
            name: name.to_string(),
            attributes: Vec::new(),
            offset,
        }
    }

    #[test]
    fn test_tag_name_validation() {
        assert!(is_valid_tag_name("bold"));
        assert!(is_valid_tag_name("x:note-1.a"));
        assert!(!is_valid_tag_name(""));
        assert!(!is_valid_tag_name("my tag"));
        assert!(!is_valid_tag_name("1st"));
    }

    #[test]
    fn test_repair_tag_name() {
        assert_eq!(repair_tag_name("bold"), "bold");
        assert_eq!(repair_tag_name("my tag"), "my-tag");
        assert_eq!(repair_tag_name(""), "_");
        assert_eq!(repair_tag_name("1st"), "_1st");
        assert_eq!(repair_tag_name("<x>"), "_-x-");
        assert!(is_valid_tag_name(&repair_tag_name("a b/c\"d")));
    }

    #[test]
    fn test_tokenize_nested() {
        let tokens = tokenize("a<bold>b</bold>").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Text("a".to_string()),
                open("bold", 1),
                Token::Text("b".to_string()),
                Token::Close {
                    name: "bold".to_string(),
                    offset: 8
                },
            ]
        );
    }

    #[test]
    fn test_tokenize_attributes() {
        let tokens = tokenize(r#"<a href="x?a=1&amp;b=2" title = "T">"#).unwrap();
        let Token::Open { attributes, .. } = &tokens[0] else {
            panic!("expected open tag");
        };
        assert_eq!(
            attributes,
            &vec![
                ("href".to_string(), "x?a=1&b=2".to_string()),
                ("title".to_string(), "T".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_self_closing() {
        let tokens = tokenize("<br/>").unwrap();
        assert!(matches!(&tokens[0], Token::Empty { name, .. } if name == "br"));
    }

    #[test]
    fn test_stray_angle_bracket_is_malformed() {
        assert_eq!(
            tokenize("1 < 2"),
            Err(DecodeError::MalformedTag { offset: 2 })
        );
        assert_eq!(
            tokenize("<bold"),
            Err(DecodeError::MalformedTag { offset: 0 })
        );
        assert_eq!(
            tokenize(r#"x</b a="1">"#),
            Err(DecodeError::MalformedTag { offset: 1 })
        );
    }

    #[test]
    fn test_empty_source() {
        assert!(tokenize("").unwrap().is_empty());
    }

    #[test]
    fn test_escape_roundtrip() {
        let text = r#"a < b && c > "d" 'e'"#;
        assert_eq!(unescape(&escape_attribute(text)), text);
        assert_eq!(escape_text("<&>"), "&lt;&amp;&gt;");
        assert_eq!(unescape("&amp;lt;"), "&lt;");
        assert_eq!(unescape("&nbsp;"), "&nbsp;");
    }
}
