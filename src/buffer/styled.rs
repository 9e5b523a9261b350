//! Attributed text storage
//!
//! A [`StyledBuffer`] is text plus a run-length list of attributes. Runs
//! partition the whole text contiguously with no gaps, no empty runs, and
//! no two adjacent runs carrying equal attributes. All positions are char
//! indices.

use crate::attributes::TextAttributes;
use crate::string_utils::{char_count, char_range_to_bytes, char_slice};
use std::ops::Range;

// ─────────────────────────────────────────────────────────────────────────────
// Runs, Edits and Paragraphs
// ─────────────────────────────────────────────────────────────────────────────

/// One attribute run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRun {
    pub range: Range<usize>,
    pub attributes: TextAttributes,
}

/// Notification of a committed character splice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditInfo {
    /// Range now occupied by the inserted text
    pub range: Range<usize>,
    /// Change in buffer length, in chars
    pub delta: isize,
}

/// A paragraph: `content` excludes the `\n` terminator, which, when
/// present, sits at `content.end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub content: Range<usize>,
    pub terminated: bool,
}

impl Paragraph {
    /// Content plus terminator.
    pub fn full_range(&self) -> Range<usize> {
        let end = if self.terminated {
            self.content.end + 1
        } else {
            self.content.end
        };
        self.content.start..end
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Styled Buffer
// ─────────────────────────────────────────────────────────────────────────────

/// Text with attribute runs covering every character.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledBuffer {
    text: String,
    len: usize,
    runs: Vec<AttributeRun>,
}

impl StyledBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer whose whole text carries `attributes`.
    pub fn from_text(text: &str, attributes: TextAttributes) -> Self {
        let mut buffer = Self::new();
        buffer.push_str(text, attributes);
        buffer
    }

    /// Append `text` styled with `attributes`.
    pub fn push_str(&mut self, text: &str, attributes: TextAttributes) {
        let added = char_count(text);
        if added == 0 {
            return;
        }
        let start = self.len;
        self.text.push_str(text);
        self.len += added;
        match self.runs.last_mut() {
            Some(last) if last.attributes == attributes => last.range.end = self.len,
            _ => self.runs.push(AttributeRun {
                range: start..self.len,
                attributes,
            }),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in chars.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn runs(&self) -> &[AttributeRun] {
        &self.runs
    }

    /// Text of a char range (clamped).
    pub fn slice(&self, range: Range<usize>) -> &str {
        char_slice(&self.text, range.start, range.end)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Attribute Reads
    // ─────────────────────────────────────────────────────────────────────────

    pub fn run_at(&self, index: usize) -> Option<&AttributeRun> {
        self.runs.iter().find(|run| run.range.contains(&index))
    }

    /// Attributes of the char at `index`; an empty bag past the end.
    pub fn attributes_at(&self, index: usize) -> TextAttributes {
        self.run_at(index)
            .map(|run| run.attributes.clone())
            .unwrap_or_default()
    }

    /// Runs overlapping `range`, clipped to it.
    pub fn runs_in(&self, range: Range<usize>) -> Vec<(Range<usize>, &TextAttributes)> {
        self.runs
            .iter()
            .filter(|run| run.range.start < range.end && run.range.end > range.start)
            .map(|run| {
                let start = run.range.start.max(range.start);
                let end = run.range.end.min(range.end);
                (start..end, &run.attributes)
            })
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Attribute Writes
    // ─────────────────────────────────────────────────────────────────────────

    /// Overwrite the attributes of `range`.
    ///
    /// Empty ranges and ranges reaching past the end are rejected: the buffer
    /// is left untouched and `false` is returned.
    pub fn set_attributes(&mut self, range: Range<usize>, attributes: TextAttributes) -> bool {
        self.update_attributes(range, |_| attributes.clone())
    }

    /// Rewrite the attributes of every run segment inside `range`.
    ///
    /// Same bounds rules as [`set_attributes`](Self::set_attributes).
    pub fn update_attributes(
        &mut self,
        range: Range<usize>,
        mut f: impl FnMut(&TextAttributes) -> TextAttributes,
    ) -> bool {
        if range.start >= range.end || range.end > self.len {
            return false;
        }
        self.split_at(range.start);
        self.split_at(range.end);
        for run in &mut self.runs {
            if run.range.start >= range.start && run.range.end <= range.end {
                run.attributes = f(&run.attributes);
            }
        }
        self.normalize();
        true
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Character Splices
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the chars in `range` with `text`.
    ///
    /// The range is clamped to the buffer. Replacement text inherits the
    /// attributes of the first replaced char; an insertion inherits from the
    /// char before it (or after it, at the very start).
    pub fn replace_characters(&mut self, range: Range<usize>, text: &str) -> EditInfo {
        let start = range.start.min(self.len);
        let end = range.end.max(start).min(self.len);
        let inserted = char_count(text);

        let inherited = if end > start || start == 0 {
            self.attributes_at(start)
        } else {
            self.attributes_at(start - 1)
        };

        let bytes = char_range_to_bytes(&self.text, start..end);
        self.text.replace_range(bytes, text);

        self.split_at(start);
        self.split_at(end);
        let removed = end - start;
        let delta = inserted as isize - removed as isize;

        let mut runs = Vec::with_capacity(self.runs.len() + 1);
        for run in self.runs.drain(..) {
            if run.range.end <= start {
                runs.push(run);
            } else if run.range.start >= end {
                runs.push(AttributeRun {
                    range: (run.range.start - removed + inserted)..(run.range.end - removed + inserted),
                    attributes: run.attributes,
                });
            }
        }
        if inserted > 0 {
            let at = runs.partition_point(|run| run.range.end <= start);
            runs.insert(
                at,
                AttributeRun {
                    range: start..start + inserted,
                    attributes: inherited,
                },
            );
        }
        self.runs = runs;
        self.len = self.len - removed + inserted;
        self.normalize();

        EditInfo {
            range: start..start + inserted,
            delta,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Paragraphs
    // ─────────────────────────────────────────────────────────────────────────

    /// Paragraphs in order. There is always at least one; text ending in
    /// `\n` ends with an empty, unterminated paragraph.
    pub fn paragraphs(&self) -> Vec<Paragraph> {
        let mut paragraphs = Vec::new();
        let mut start = 0;
        for (index, ch) in self.text.chars().enumerate() {
            if ch == '\n' {
                paragraphs.push(Paragraph {
                    content: start..index,
                    terminated: true,
                });
                start = index + 1;
            }
        }
        paragraphs.push(Paragraph {
            content: start..self.len,
            terminated: false,
        });
        paragraphs
    }

    /// Paragraphs touched by `range`; a collapsed range selects the
    /// paragraph holding that position.
    pub fn paragraphs_in(&self, range: Range<usize>) -> Vec<Paragraph> {
        self.paragraphs()
            .into_iter()
            .filter(|p| {
                let full = p.full_range();
                if range.start == range.end {
                    full.contains(&range.start)
                        || (!p.terminated && range.start == p.content.end)
                } else {
                    full.start < range.end && full.end > range.start
                }
            })
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Run Maintenance
    // ─────────────────────────────────────────────────────────────────────────

    /// Ensure a run boundary at `index`.
    fn split_at(&mut self, index: usize) {
        let Some(pos) = self
            .runs
            .iter()
            .position(|run| run.range.start < index && index < run.range.end)
        else {
            return;
        };
        let tail = AttributeRun {
            range: index..self.runs[pos].range.end,
            attributes: self.runs[pos].attributes.clone(),
        };
        self.runs[pos].range.end = index;
        self.runs.insert(pos + 1, tail);
    }

    /// Drop empty runs and merge equal neighbours.
    fn normalize(&mut self) {
        let mut merged: Vec<AttributeRun> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            if run.range.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(last) if last.attributes == run.attributes && last.range.end == run.range.start => {
                    last.range.end = run.range.end;
                }
                _ => merged.push(run),
            }
        }
        self.runs = merged;
        debug_assert!(self.runs_are_contiguous(), "attribute runs must partition the text");
    }

    fn runs_are_contiguous(&self) -> bool {
        let mut expected = 0;
        for run in &self.runs {
            if run.range.start != expected {
                return false;
            }
            expected = run.range.end;
        }
        expected == self.len
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{ActiveKeys, AttributeBag};

    fn attrs(keys: &[&str]) -> TextAttributes {
        let bag = keys.iter().map(|k| (*k, true)).collect::<AttributeBag>();
        TextAttributes::new(bag, keys.iter().copied().collect::<ActiveKeys>())
    }

    fn sample() -> StyledBuffer {
        let mut buffer = StyledBuffer::new();
        buffer.push_str("Hello", attrs(&["b"]));
        buffer.push_str(" world", attrs(&["plain"]));
        buffer
    }

    fn spans(buffer: &StyledBuffer) -> Vec<(Range<usize>, &str)> {
        buffer
            .runs()
            .iter()
            .map(|run| {
                let key = run.attributes.marker().map_or("", |k| k.as_slice()[0].as_str());
                (run.range.clone(), key)
            })
            .collect()
    }

    #[test]
    fn test_push_merges_equal_attributes() {
        let mut buffer = StyledBuffer::new();
        buffer.push_str("ab", attrs(&["b"]));
        buffer.push_str("cd", attrs(&["b"]));
        buffer.push_str("", attrs(&["i"]));
        assert_eq!(buffer.runs().len(), 1);
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn test_attributes_at_edges() {
        let buffer = sample();
        assert_eq!(buffer.attributes_at(4), attrs(&["b"]));
        assert_eq!(buffer.attributes_at(5), attrs(&["plain"]));
        assert_eq!(buffer.attributes_at(11), TextAttributes::empty());
        assert_eq!(StyledBuffer::new().attributes_at(0), TextAttributes::empty());
    }

    #[test]
    fn test_set_attributes_splits_runs() {
        let mut buffer = sample();
        assert!(buffer.set_attributes(2..7, attrs(&["i"])));
        assert_eq!(
            spans(&buffer),
            vec![(0..2, "b"), (2..7, "i"), (7..11, "plain")]
        );
    }

    #[test]
    fn test_set_attributes_out_of_bounds_is_noop() {
        let mut buffer = sample();
        let before = buffer.clone();
        assert!(!buffer.set_attributes(8..20, attrs(&["i"])));
        assert!(!buffer.set_attributes(3..3, attrs(&["i"])));
        assert_eq!(buffer, before);
    }

    #[test]
    fn test_set_attributes_merges_back() {
        let mut buffer = sample();
        buffer.set_attributes(5..11, attrs(&["b"]));
        assert_eq!(spans(&buffer), vec![(0..11, "b")]);
    }

    #[test]
    fn test_insert_inherits_from_left() {
        let mut buffer = sample();
        let edit = buffer.replace_characters(5..5, "!!");
        assert_eq!(edit, EditInfo { range: 5..7, delta: 2 });
        assert_eq!(buffer.text(), "Hello!! world");
        assert_eq!(spans(&buffer), vec![(0..7, "b"), (7..13, "plain")]);
    }

    #[test]
    fn test_insert_at_start_inherits_first_char() {
        let mut buffer = sample();
        buffer.replace_characters(0..0, ">");
        assert_eq!(spans(&buffer), vec![(0..6, "b"), (6..12, "plain")]);
    }

    #[test]
    fn test_delete_keeps_neighbours() {
        let mut buffer = sample();
        let edit = buffer.replace_characters(3..8, "");
        assert_eq!(edit, EditInfo { range: 3..3, delta: -5 });
        assert_eq!(buffer.text(), "Helrld");
        assert_eq!(spans(&buffer), vec![(0..3, "b"), (3..6, "plain")]);
    }

    #[test]
    fn test_replace_inherits_first_replaced_char() {
        let mut buffer = sample();
        buffer.replace_characters(4..7, "XY");
        assert_eq!(buffer.text(), "HellXYorld");
        assert_eq!(spans(&buffer), vec![(0..6, "b"), (6..10, "plain")]);
    }

    #[test]
    fn test_replace_clamps_range() {
        let mut buffer = sample();
        let edit = buffer.replace_characters(9..40, "");
        assert_eq!(edit.delta, -2);
        assert_eq!(buffer.text(), "Hello wor");
    }

    #[test]
    fn test_multibyte_splice() {
        let mut buffer = StyledBuffer::from_text("Hei på deg", attrs(&["plain"]));
        buffer.replace_characters(4..6, "你好");
        assert_eq!(buffer.text(), "Hei 你好 deg");
        assert_eq!(buffer.len(), 10);
        assert_eq!(buffer.slice(4..6), "你好");
    }

    #[test]
    fn test_insert_into_empty_buffer() {
        let mut buffer = StyledBuffer::new();
        buffer.replace_characters(0..0, "abc");
        assert_eq!(buffer.runs().len(), 1);
        assert_eq!(buffer.runs()[0].attributes, TextAttributes::empty());
    }

    #[test]
    fn test_paragraphs() {
        let buffer = StyledBuffer::from_text("ab\n\ncd\n", attrs(&["plain"]));
        let paragraphs = buffer.paragraphs();
        let ranges: Vec<_> = paragraphs.iter().map(|p| (p.content.clone(), p.terminated)).collect();
        assert_eq!(
            ranges,
            vec![(0..2, true), (3..3, true), (4..6, true), (7..7, false)]
        );
        assert_eq!(paragraphs[0].full_range(), 0..3);
    }

    #[test]
    fn test_paragraphs_in() {
        let buffer = StyledBuffer::from_text("ab\ncd\nef", attrs(&["plain"]));
        let caret = buffer.paragraphs_in(4..4);
        assert_eq!(caret.len(), 1);
        assert_eq!(caret[0].content, 3..5);

        let end = buffer.paragraphs_in(8..8);
        assert_eq!(end[0].content, 6..8);

        let span = buffer.paragraphs_in(1..4);
        assert_eq!(span.len(), 2);
    }

    #[test]
    fn test_runs_in_clips() {
        let buffer = sample();
        let runs = buffer.runs_in(3..7);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].0, 3..5);
        assert_eq!(runs[1].0, 5..7);
    }
}
