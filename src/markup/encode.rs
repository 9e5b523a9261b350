//! Buffer to markup
//!
//! Block tags open at paragraph starts and wrap whole paragraphs. Inline
//! tags wrap runs and stay open while consecutive runs share them. Both
//! nest in declaration order. The default key has no markup.

use super::tokenizer::{escape_attribute, escape_text};
use crate::attributes::{AttributeResolver, TextAttributes};
use crate::buffer::{Paragraph, StyledBuffer};
use crate::style::StyleTable;

/// An element on one of the encoder's open-tag stacks.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenTag {
    tag: String,
    attributes: Vec<(String, String)>,
}

struct Encoder<'a> {
    table: &'a StyleTable,
    resolver: &'a dyn AttributeResolver,
    out: String,
    blocks: Vec<OpenTag>,
    inlines: Vec<OpenTag>,
}

pub(crate) fn encode(
    table: &StyleTable,
    resolver: &dyn AttributeResolver,
    buffer: &StyledBuffer,
    wrapper: Option<&str>,
) -> String {
    let mut encoder = Encoder {
        table,
        resolver,
        out: String::new(),
        blocks: Vec::new(),
        inlines: Vec::new(),
    };

    if let Some(root) = wrapper {
        encoder.out.push_str(&format!("<{}>", root));
    }

    let paragraphs = buffer.paragraphs();
    let block_sets: Vec<Vec<OpenTag>> = paragraphs
        .iter()
        .map(|p| encoder.paragraph_blocks(buffer, p))
        .collect();

    for (index, paragraph) in paragraphs.iter().enumerate() {
        let blocks = &block_sets[index];
        if encoder.blocks != *blocks {
            encoder.close_inlines(0);
            encoder.enter_blocks(blocks);
        }

        for (range, attributes) in buffer.runs_in(paragraph.content.clone()) {
            let inlines = encoder.tags_for(attributes, false);
            encoder.enter_inlines(&inlines);
            encoder.out.push_str(&escape_text(buffer.slice(range)));
        }

        if paragraph.terminated {
            let next = block_sets.get(index + 1).map_or(&[][..], Vec::as_slice);
            let keep = common_prefix(blocks, next);
            if keep < encoder.blocks.len() {
                encoder.close_inlines(0);
                encoder.close_blocks(keep);
            }
            let newline = buffer.attributes_at(paragraph.content.end);
            let inlines = encoder.tags_for(&newline, false);
            encoder.enter_inlines(&inlines);
            encoder.out.push('\n');
        }
    }

    encoder.close_inlines(0);
    encoder.close_blocks(0);
    if let Some(root) = wrapper {
        encoder.out.push_str(&format!("</{}>", root));
    }
    encoder.out
}

fn common_prefix(a: &[OpenTag], b: &[OpenTag]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

impl Encoder<'_> {
    /// Block tags of a paragraph, taken from its first char (or from its
    /// terminator when it has no content).
    fn paragraph_blocks(&self, buffer: &StyledBuffer, paragraph: &Paragraph) -> Vec<OpenTag> {
        let probe = if !paragraph.content.is_empty() {
            paragraph.content.start
        } else if paragraph.terminated {
            paragraph.content.end
        } else {
            return Vec::new();
        };
        self.tags_for(&buffer.attributes_at(probe), true)
    }

    /// Tags of the block or inline keys recorded on a run, outermost first.
    fn tags_for(&self, attributes: &TextAttributes, block: bool) -> Vec<OpenTag> {
        let Some(marker) = attributes.marker() else {
            return Vec::new();
        };
        self.table
            .ordered(marker.iter())
            .iter()
            .filter(|key| *key != self.table.default_key() && self.table.is_block(key) == block)
            .filter_map(|key| {
                let tag = self.table.tag_for_key(key)?;
                Some(OpenTag {
                    tag: tag.to_string(),
                    attributes: self.resolver.export_tag_attributes(key, &attributes.bag),
                })
            })
            .collect()
    }

    fn enter_blocks(&mut self, target: &[OpenTag]) {
        let keep = common_prefix(&self.blocks, target);
        self.close_blocks(keep);
        for tag in &target[keep..] {
            write_open(&mut self.out, tag);
            self.blocks.push(tag.clone());
        }
    }

    fn enter_inlines(&mut self, target: &[OpenTag]) {
        let keep = common_prefix(&self.inlines, target);
        self.close_inlines(keep);
        for tag in &target[keep..] {
            write_open(&mut self.out, tag);
            self.inlines.push(tag.clone());
        }
    }

    fn close_blocks(&mut self, keep: usize) {
        while self.blocks.len() > keep {
            if let Some(tag) = self.blocks.pop() {
                write_close(&mut self.out, &tag);
            }
        }
    }

    fn close_inlines(&mut self, keep: usize) {
        while self.inlines.len() > keep {
            if let Some(tag) = self.inlines.pop() {
                write_close(&mut self.out, &tag);
            }
        }
    }
}

fn write_open(out: &mut String, tag: &OpenTag) {
    out.push('<');
    out.push_str(&tag.tag);
    for (name, value) in &tag.attributes {
        out.push_str(&format!(" {}=\"{}\"", name, escape_attribute(value)));
    }
    out.push('>');
}

fn write_close(out: &mut String, tag: &OpenTag) {
    out.push_str("</");
    out.push_str(&tag.tag);
    out.push('>');
}
