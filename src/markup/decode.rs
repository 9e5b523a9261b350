//! Markup to buffer
//!
//! Tags are resolved to style keys through the style table; tags outside
//! the vocabulary go to the resolver's import hook. Every char carries the
//! default key plus the keys of all enclosing style tags.

use super::tokenizer::{tokenize, Token};
use crate::attributes::{AttributeBag, AttributeResolver, TextAttributes};
use crate::buffer::StyledBuffer;
use crate::error::DecodeError;
use crate::style::StyleTable;

/// An open element during decoding.
#[derive(Debug, Clone)]
enum Frame {
    /// The document wrapper; contributes nothing
    Root { tag: String },
    Style {
        tag: String,
        key: String,
        block: bool,
        overlay: AttributeBag,
    },
    /// A tag outside the vocabulary accepted by the import hook
    Custom { tag: String, overlay: AttributeBag },
}

impl Frame {
    fn tag(&self) -> &str {
        match self {
            Frame::Root { tag } | Frame::Style { tag, .. } | Frame::Custom { tag, .. } => tag,
        }
    }

    fn is_block(&self) -> bool {
        matches!(self, Frame::Style { block: true, .. })
    }
}

struct Decoder<'a> {
    table: &'a StyleTable,
    resolver: &'a dyn AttributeResolver,
    root_tag: &'a str,
    stack: Vec<Frame>,
    /// Block frames open just before the latest run of block closes; the
    /// next `\n` belongs to the paragraph they wrapped
    pending_blocks: Option<Vec<Frame>>,
    buffer: StyledBuffer,
}

pub(crate) fn decode(
    table: &StyleTable,
    resolver: &dyn AttributeResolver,
    root_tag: &str,
    source: &str,
) -> Result<StyledBuffer, DecodeError> {
    let mut decoder = Decoder {
        table,
        resolver,
        root_tag,
        stack: Vec::new(),
        pending_blocks: None,
        buffer: StyledBuffer::new(),
    };

    for token in tokenize(source)? {
        match token {
            Token::Text(text) => decoder.text(&text),
            Token::Open {
                name,
                attributes,
                offset,
            } => {
                let frame = decoder.frame_for(name, &attributes, offset)?;
                if frame.is_block() {
                    decoder.pending_blocks = None;
                }
                decoder.stack.push(frame);
            }
            Token::Empty {
                name,
                attributes,
                offset,
            } => {
                decoder.frame_for(name, &attributes, offset)?;
            }
            Token::Close { name, offset } => decoder.close(name, offset)?,
        }
    }

    if let Some(frame) = decoder.stack.last() {
        return Err(DecodeError::UnterminatedTag {
            tag: frame.tag().to_string(),
        });
    }
    Ok(decoder.buffer)
}

impl Decoder<'_> {
    fn frame_for(
        &self,
        name: String,
        raw_attributes: &[(String, String)],
        offset: usize,
    ) -> Result<Frame, DecodeError> {
        // Root wraps the whole document only
        if name == self.root_tag && self.stack.is_empty() && self.buffer.is_empty() {
            return Ok(Frame::Root { tag: name });
        }

        if let Some(key) = self.table.key_for_tag(&name) {
            let overlay = if raw_attributes.is_empty() {
                AttributeBag::new()
            } else {
                let current = self.attributes_for(&self.stack).bag;
                self.resolver
                    .remap_on_import(key, raw_attributes, &current)
                    .unwrap_or_default()
            };
            return Ok(Frame::Style {
                key: key.to_string(),
                block: self.table.is_block(key),
                tag: name,
                overlay,
            });
        }

        let current = self.attributes_for(&self.stack).bag;
        match self.resolver.remap_on_import(&name, raw_attributes, &current) {
            Some(overlay) => Ok(Frame::Custom { tag: name, overlay }),
            None => Err(DecodeError::UnknownTag { tag: name, offset }),
        }
    }

    fn close(&mut self, name: String, offset: usize) -> Result<(), DecodeError> {
        let Some(top) = self.stack.last() else {
            return Err(DecodeError::UnexpectedClose { tag: name, offset });
        };
        if top.tag() != name {
            return Err(DecodeError::MismatchedClose {
                expected: top.tag().to_string(),
                found: name,
                offset,
            });
        }
        if top.is_block() && self.pending_blocks.is_none() {
            self.pending_blocks = Some(self.stack.iter().filter(|f| f.is_block()).cloned().collect());
        }
        self.stack.pop();
        Ok(())
    }

    fn text(&mut self, text: &str) {
        let here = self.attributes_for(&self.stack);
        let mut segment = String::new();

        for ch in text.chars() {
            if ch == '\n' {
                if let Some(blocks) = self.pending_blocks.take() {
                    self.buffer.push_str(&segment, here.clone());
                    segment.clear();
                    let frames: Vec<Frame> = blocks
                        .into_iter()
                        .chain(self.stack.iter().filter(|f| !f.is_block()).cloned())
                        .collect();
                    let attributes = self.attributes_for(&frames);
                    self.buffer.push_str("\n", attributes);
                    continue;
                }
            } else {
                self.pending_blocks = None;
            }
            segment.push(ch);
        }
        self.buffer.push_str(&segment, here);
    }

    /// Attributes of text enclosed by `frames`.
    fn attributes_for(&self, frames: &[Frame]) -> TextAttributes {
        let default_key = self.table.default_key();
        let keys = self.table.ordered(
            std::iter::once(default_key).chain(frames.iter().filter_map(|f| match f {
                Frame::Style { key, .. } => Some(key.as_str()),
                _ => None,
            })),
        );
        let mut bag = self.resolver.resolve_attributes(&keys);
        for frame in frames {
            match frame {
                Frame::Style { overlay, .. } | Frame::Custom { overlay, .. } => bag.merge(overlay),
                Frame::Root { .. } => {}
            }
        }
        TextAttributes::new(bag, keys)
    }
}
