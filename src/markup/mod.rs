//! Markup codec
//!
//! Maps a [`StyledBuffer`] to and from nested-tag markup. Style keys become
//! the tags named in the style table; the active-key markers on runs are
//! never written out, the tags are their serialized form.
//!
//! ```text
//! <h1>Title</h1>
//! Some <strong>bold <em>and italic</em></strong> text
//! <ul>first
//! second</ul>
//! ```

mod decode;
mod encode;
mod pending;
mod tokenizer;

pub use pending::{DecodeResult, PendingDecode};
pub use tokenizer::{escape_attribute, escape_text, is_valid_tag_name, repair_tag_name, unescape};

use crate::attributes::AttributeResolver;
use crate::buffer::StyledBuffer;
use crate::config::StyleSettings;
use crate::error::DecodeError;
use crate::style::StyleTable;
use log::{debug, warn};
use std::fmt;
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread;

/// Bidirectional buffer/markup mapping for one style vocabulary.
///
/// Cheap to clone: the table and resolver are shared.
#[derive(Clone)]
pub struct MarkupCodec {
    table: StyleTable,
    resolver: Arc<dyn AttributeResolver>,
    root_tag: String,
}

impl fmt::Debug for MarkupCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkupCodec")
            .field("table", &self.table)
            .field("root_tag", &self.root_tag)
            .finish_non_exhaustive()
    }
}

impl MarkupCodec {
    pub fn new(
        table: StyleTable,
        resolver: Arc<dyn AttributeResolver>,
        root_tag: impl Into<String>,
    ) -> Self {
        let mut root_tag = root_tag.into();
        if !is_valid_tag_name(&root_tag) {
            let repaired = repair_tag_name(&root_tag);
            warn!("Invalid root tag name {:?}, using <{}>", root_tag, repaired);
            root_tag = repaired;
        }
        Self {
            table,
            resolver,
            root_tag,
        }
    }

    pub fn from_settings(settings: &StyleSettings, resolver: Arc<dyn AttributeResolver>) -> Self {
        Self::new(settings.table(), resolver, settings.root_tag.clone())
    }

    pub fn table(&self) -> &StyleTable {
        &self.table
    }

    /// Tag that wraps a whole document; transparent on decode.
    pub fn root_tag(&self) -> &str {
        &self.root_tag
    }

    /// Encode `buffer`, optionally wrapped in one extra `wrapper` element.
    ///
    /// Output is canonical: decoding it and encoding again yields the same
    /// string.
    pub fn encode(&self, buffer: &StyledBuffer, wrapper: Option<&str>) -> String {
        encode::encode(&self.table, self.resolver.as_ref(), buffer, wrapper)
    }

    /// Encode `buffer` as a complete document wrapped in the root tag.
    pub fn encode_document(&self, buffer: &StyledBuffer) -> String {
        self.encode(buffer, Some(&self.root_tag))
    }

    /// Decode markup into a buffer. Empty input gives an empty buffer.
    ///
    /// # Errors
    ///
    /// Any malformed, unknown, mismatched or unterminated tag fails the
    /// whole decode; no partial buffer is produced.
    pub fn decode(&self, source: &str) -> Result<StyledBuffer, DecodeError> {
        let result = decode::decode(&self.table, self.resolver.as_ref(), &self.root_tag, source);
        match &result {
            Ok(buffer) => debug!(
                "Decoded {} chars into {} runs",
                buffer.len(),
                buffer.runs().len()
            ),
            Err(e) => warn!("Markup decode failed: {}", e),
        }
        result
    }

    /// Decode on a worker thread.
    pub fn spawn_decode(&self, source: impl Into<String>) -> PendingDecode {
        let (tx, rx) = channel();
        let codec = self.clone();
        let source = source.into();
        thread::spawn(move || {
            // Send the result back; nobody may be listening anymore
            let _ = tx.send(codec.decode(&source));
        });
        PendingDecode::new(rx)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{ActiveKeys, AttributeBag, AttributeValue, ConfiguredResolver, TextAttributes};
    use crate::style::StyleDefinition;

    fn table() -> StyleTable {
        StyleTable::new(
            vec![
                StyleDefinition::inline("b", "bold").with_attribute("font-weight", "bold"),
                StyleDefinition::inline("i", "italic"),
                StyleDefinition::inline("link", "a"),
                StyleDefinition::block("quote", "blockquote"),
                StyleDefinition::block("h1", "h1"),
            ],
            "none",
        )
    }

    fn codec() -> MarkupCodec {
        let table = table();
        let resolver = Arc::new(ConfiguredResolver::new(table.clone()));
        MarkupCodec::new(table, resolver, "doc")
    }

    fn attrs(codec: &MarkupCodec, keys: &[&str]) -> TextAttributes {
        let keys: ActiveKeys = codec.table().ordered(keys.iter().copied());
        TextAttributes::new(codec.resolver.resolve_attributes(&keys), keys)
    }

    fn keys_at(buffer: &StyledBuffer, index: usize) -> Vec<String> {
        buffer
            .attributes_at(index)
            .marker()
            .map(|k| k.as_slice().to_vec())
            .unwrap_or_default()
    }

    fn roundtrip_stable(codec: &MarkupCodec, markup: &str) {
        let buffer = codec.decode(markup).unwrap();
        assert_eq!(codec.encode(&buffer, None), markup);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Encode
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_encode_inline_run() {
        let codec = codec();
        let buffer = StyledBuffer::from_text("text", attrs(&codec, &["b", "none"]));
        assert_eq!(codec.encode(&buffer, None), "<bold>text</bold>");
    }

    #[test]
    fn test_encode_default_has_no_markup() {
        let codec = codec();
        let buffer = StyledBuffer::from_text("plain", attrs(&codec, &["none"]));
        assert_eq!(codec.encode(&buffer, None), "plain");
        assert_eq!(codec.encode(&StyledBuffer::new(), None), "");
    }

    #[test]
    fn test_encode_shares_open_inline_prefix() {
        let codec = codec();
        let mut buffer = StyledBuffer::new();
        buffer.push_str("a", attrs(&codec, &["none", "b"]));
        buffer.push_str("b", attrs(&codec, &["none", "b", "i"]));
        buffer.push_str("c", attrs(&codec, &["none", "i"]));
        assert_eq!(
            codec.encode(&buffer, None),
            "<bold>a<italic>b</italic></bold><italic>c</italic>"
        );
    }

    #[test]
    fn test_encode_wrapper_and_escaping() {
        let codec = codec();
        let buffer = StyledBuffer::from_text("1 < 2 & 3", attrs(&codec, &["none"]));
        assert_eq!(
            codec.encode_document(&buffer),
            "<doc>1 &lt; 2 &amp; 3</doc>"
        );
    }

    #[test]
    fn test_encode_blocks_wrap_paragraphs() {
        let codec = codec();
        let mut buffer = StyledBuffer::new();
        buffer.push_str("Title\n", attrs(&codec, &["none", "h1"]));
        buffer.push_str("one\ntwo\n", attrs(&codec, &["none", "quote"]));
        buffer.push_str("end", attrs(&codec, &["none"]));
        assert_eq!(
            codec.encode(&buffer, None),
            "<h1>Title</h1>\n<blockquote>one\ntwo</blockquote>\nend"
        );
    }

    #[test]
    fn test_encode_never_writes_marker() {
        let codec = codec();
        let buffer = StyledBuffer::from_text("x", attrs(&codec, &["none", "b", "i"]));
        let markup = codec.encode(&buffer, None);
        assert!(!markup.contains("none"));
        assert!(!markup.contains("font-weight"));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Decode
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_decode_empty_input() {
        let buffer = codec().decode("").unwrap();
        assert!(buffer.is_empty());
        assert!(buffer.runs().is_empty());
    }

    #[test]
    fn test_decode_assigns_keys_and_attributes() {
        let codec = codec();
        let buffer = codec.decode("x<bold>y<italic>z</italic></bold>").unwrap();
        assert_eq!(buffer.text(), "xyz");
        assert_eq!(keys_at(&buffer, 0), vec!["none"]);
        assert_eq!(keys_at(&buffer, 1), vec!["none", "b"]);
        assert_eq!(keys_at(&buffer, 2), vec!["none", "b", "i"]);
        assert_eq!(
            buffer.attributes_at(1).bag.get("font-weight"),
            Some(&AttributeValue::from("bold"))
        );
    }

    #[test]
    fn test_decode_root_tag_is_transparent() {
        let codec = codec();
        let buffer = codec.decode("<doc><bold>x</bold></doc>").unwrap();
        assert_eq!(buffer.text(), "x");
        assert_eq!(keys_at(&buffer, 0), vec!["none", "b"]);
    }

    #[test]
    fn test_decode_root_tag_only_outermost() {
        let codec = codec();
        assert_eq!(
            codec.decode("<bold><doc>x</doc></bold>"),
            Err(DecodeError::UnknownTag {
                tag: "doc".to_string(),
                offset: 6,
            })
        );
        assert_eq!(
            codec.decode("x<doc>y</doc>"),
            Err(DecodeError::UnknownTag {
                tag: "doc".to_string(),
                offset: 1,
            })
        );
    }

    #[test]
    fn test_unusable_tag_names_still_roundtrip() {
        let table = StyleTable::new(vec![StyleDefinition::inline("b", "my tag")], "none");
        let resolver = Arc::new(ConfiguredResolver::new(table.clone()));
        let codec = MarkupCodec::new(table, resolver, "my doc");
        assert_eq!(codec.root_tag(), "my-doc");

        let mut buffer = StyledBuffer::new();
        buffer.push_str("x", attrs(&codec, &["none", "b"]));
        let markup = codec.encode_document(&buffer);
        assert_eq!(markup, "<my-doc><my-tag>x</my-tag></my-doc>");
        assert_eq!(codec.decode(&markup), Ok(buffer));
    }

    #[test]
    fn test_decode_unescapes_text() {
        let buffer = codec().decode("a &lt;b&gt; &amp; &quot;c&quot;").unwrap();
        assert_eq!(buffer.text(), "a <b> & \"c\"");
    }

    #[test]
    fn test_decode_newline_after_block_belongs_to_block() {
        let codec = codec();
        let buffer = codec.decode("<h1>T</h1>\nx").unwrap();
        assert_eq!(keys_at(&buffer, 1), vec!["none", "h1"]);
        assert_eq!(keys_at(&buffer, 2), vec!["none"]);
    }

    #[test]
    fn test_decode_errors() {
        let codec = codec();
        assert_eq!(
            codec.decode("<bold>x"),
            Err(DecodeError::UnterminatedTag {
                tag: "bold".to_string()
            })
        );
        assert_eq!(
            codec.decode("<bold>x</italic>"),
            Err(DecodeError::MismatchedClose {
                expected: "bold".to_string(),
                found: "italic".to_string(),
                offset: 7
            })
        );
        assert_eq!(
            codec.decode("x</bold>"),
            Err(DecodeError::UnexpectedClose {
                tag: "bold".to_string(),
                offset: 1
            })
        );
        assert_eq!(
            codec.decode("<blink>x</blink>"),
            Err(DecodeError::UnknownTag {
                tag: "blink".to_string(),
                offset: 0
            })
        );
        assert_eq!(
            codec.decode("a <b"),
            Err(DecodeError::MalformedTag { offset: 2 })
        );
    }

    #[test]
    fn test_decode_link_target_roundtrips() {
        let codec = codec();
        let markup = r#"see <a href="https://example.com/?a=1&amp;b=2">here</a>"#;
        let buffer = codec.decode(markup).unwrap();
        assert_eq!(
            buffer.attributes_at(4).bag.get("link.href"),
            Some(&AttributeValue::from("https://example.com/?a=1&b=2"))
        );
        assert_eq!(codec.encode(&buffer, None), markup);
    }

    #[test]
    fn test_custom_tag_hook() {
        struct NoteResolver;

        impl AttributeResolver for NoteResolver {
            fn resolve_attributes(&self, _: &ActiveKeys) -> AttributeBag {
                AttributeBag::new()
            }

            fn remap_on_import(
                &self,
                tag_key: &str,
                raw: &[(String, String)],
                _current: &AttributeBag,
            ) -> Option<AttributeBag> {
                (tag_key == "note").then(|| {
                    raw.iter()
                        .map(|(k, v)| (format!("note-{}", k), v.as_str()))
                        .collect()
                })
            }
        }

        let codec = MarkupCodec::new(table(), Arc::new(NoteResolver), "doc");
        let buffer = codec
            .decode(r#"a<note author="kim">b</note>c"#)
            .unwrap();
        assert_eq!(buffer.text(), "abc");
        assert_eq!(
            buffer.attributes_at(1).bag.get("note-author"),
            Some(&AttributeValue::from("kim"))
        );
        assert!(buffer.attributes_at(2).bag.is_empty());
        assert!(codec.decode("<other>x</other>").is_err());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Round Trip
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_roundtrip_preserves_keys_per_position() {
        let codec = codec();
        let mut original = StyledBuffer::new();
        original.push_str("Head", attrs(&codec, &["none", "h1", "b"]));
        original.push_str("\n", attrs(&codec, &["none", "h1"]));
        original.push_str("quoted ", attrs(&codec, &["none", "quote"]));
        original.push_str("bold", attrs(&codec, &["none", "quote", "b"]));
        original.push_str("\n", attrs(&codec, &["none", "quote"]));
        original.push_str("\n", attrs(&codec, &["none"]));
        original.push_str("tail", attrs(&codec, &["none", "i"]));

        let markup = codec.encode(&original, None);
        let decoded = codec.decode(&markup).unwrap();

        assert_eq!(decoded.text(), original.text());
        for index in 0..original.len() {
            assert_eq!(keys_at(&decoded, index), keys_at(&original, index), "at {}", index);
        }
        assert_eq!(codec.encode(&decoded, None), markup);
    }

    #[test]
    fn test_canonical_markup_is_stable() {
        let codec = codec();
        roundtrip_stable(&codec, "<bold>a\nb</bold>");
        roundtrip_stable(&codec, "<blockquote>a</blockquote>\n<h1>b</h1>");
        roundtrip_stable(&codec, "<blockquote><h1></h1></blockquote>\nx");
        roundtrip_stable(&codec, "<blockquote><bold>a</bold></blockquote><bold>\nb</bold>");
    }

    #[test]
    fn test_spawn_decode_delivers_result() {
        let codec = codec();
        let pending = codec.spawn_decode("<italic>x</italic>");
        let buffer = pending.wait().unwrap();
        assert_eq!(keys_at(&buffer, 0), vec!["none", "i"]);
    }
}
