//! Edit-time glue between the styled buffer and the style state machine
//!
//! The controller owns the buffer, decides which attributes newly typed
//! text receives, follows the caret to keep the state machine in step with
//! the text under it, and moves the buffer in and out of markup.

use super::styled::{EditInfo, StyledBuffer};
use crate::attributes::{ActiveKeys, AttributeResolver, ConfiguredResolver, TextAttributes};
use crate::config::StyleSettings;
use crate::error::{DecodeError, StyleError};
use crate::markup::{MarkupCodec, PendingDecode};
use crate::style::{AttributeTarget, EventStream, StyleStateMachine, ToggleOutcome};
use log::{debug, info, warn};
use std::ops::Range;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// Typing Status
// ─────────────────────────────────────────────────────────────────────────────

/// What kind of edit is in progress. Reset to `None` after every edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypingStatus {
    #[default]
    None,
    /// Characters are being inserted
    Typing,
    /// Characters are being deleted
    Removing,
    /// Content is being installed programmatically
    Installing,
}

impl TypingStatus {
    /// Whether attribute writes are honoured in this status.
    pub fn allows_attribute_writes(self) -> bool {
        matches!(self, TypingStatus::Typing | TypingStatus::Installing)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Controller
// ─────────────────────────────────────────────────────────────────────────────

/// A styled buffer kept in sync with a style state machine.
#[derive(Debug)]
pub struct StyledBufferController {
    machine: StyleStateMachine,
    codec: MarkupCodec,
    buffer: StyledBuffer,
    typing_status: TypingStatus,
    /// Attributes the next typed characters receive
    typing_attributes: TextAttributes,
    selection: Range<usize>,
    /// Caret position seen by the last location update
    last_location: Option<usize>,
    /// Bumped on every committed change to the buffer
    generation: u64,
    pending_import: Option<(u64, PendingDecode)>,
    edits: EventStream<EditInfo>,
}

impl StyledBufferController {
    /// Build a controller for `settings` using `resolver` for attributes.
    pub fn new(settings: &StyleSettings, resolver: Arc<dyn AttributeResolver>) -> Self {
        let machine = StyleStateMachine::from_settings(settings, resolver);
        Self::with_machine(machine, settings.root_tag.clone())
    }

    /// Build a controller whose attributes come from the style definitions.
    pub fn from_settings(settings: &StyleSettings) -> Self {
        Self::new(settings, Arc::new(ConfiguredResolver::new(settings.table())))
    }

    /// Build a controller around an existing machine.
    pub fn with_machine(machine: StyleStateMachine, root_tag: impl Into<String>) -> Self {
        let codec = MarkupCodec::new(machine.table().clone(), machine.resolver().clone(), root_tag);
        let typing_attributes = machine.default_attributes();
        Self {
            machine,
            codec,
            buffer: StyledBuffer::new(),
            typing_status: TypingStatus::None,
            typing_attributes,
            selection: 0..0,
            last_location: None,
            generation: 0,
            pending_import: None,
            edits: EventStream::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Toggles
    // ─────────────────────────────────────────────────────────────────────────

    /// Toggle a style and apply the result.
    ///
    /// Inline styles become the typing attribute and are applied to a
    /// non-empty selection. Block styles are applied to every paragraph the
    /// selection touches. Panics on unknown keys, like
    /// [`StyleStateMachine::toggle`].
    pub fn toggle(&mut self, key: &str) -> Option<ToggleOutcome> {
        let outcome = self.machine.toggle(key)?;
        self.apply_outcome(&outcome);
        Some(outcome)
    }

    /// Like [`toggle`](Self::toggle), but unknown keys are an error.
    pub fn try_toggle(&mut self, key: &str) -> Result<Option<ToggleOutcome>, StyleError> {
        let outcome = self.machine.try_toggle(key)?;
        if let Some(outcome) = &outcome {
            self.apply_outcome(outcome);
        }
        Ok(outcome)
    }

    fn apply_outcome(&mut self, outcome: &ToggleOutcome) {
        let keys = outcome
            .attributes
            .marker()
            .cloned()
            .unwrap_or_else(|| self.machine.active_keys());
        self.typing_attributes = self
            .machine
            .rederive_attributes(&keys, &self.typing_attributes);
        match outcome.target {
            AttributeTarget::Typing => {
                self.replace_attributes_if_needed();
            }
            AttributeTarget::Block => self.apply_block_attributes(&outcome.attributes),
        }
    }

    /// Give every paragraph touched by the selection the block keys of
    /// `attributes`, keeping each run's inline keys.
    fn apply_block_attributes(&mut self, attributes: &TextAttributes) {
        let table = self.machine.table().clone();
        let blocks: Vec<String> = attributes
            .marker()
            .map(|keys| keys.iter().filter(|k| table.is_block(k)).map(String::from).collect())
            .unwrap_or_default();

        let paragraphs = self.buffer.paragraphs_in(self.selection.clone());
        self.typing_status = TypingStatus::Installing;
        let mut written = false;
        for paragraph in &paragraphs {
            let machine = &self.machine;
            written |= self.buffer.update_attributes(paragraph.full_range(), |run| {
                let current = run.marker().cloned().unwrap_or_else(|| table.default_keys());
                let keys: ActiveKeys = table.ordered(
                    current
                        .iter()
                        .filter(|k| !table.is_block(k))
                        .chain(blocks.iter().map(String::as_str)),
                );
                machine.rederive_attributes(&keys, run)
            });
        }
        self.typing_status = TypingStatus::None;
        if written {
            self.bump_generation();
        }
        debug!(
            "Applied block keys {:?} to {} paragraph(s)",
            blocks,
            paragraphs.len()
        );
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Character Edits
    // ─────────────────────────────────────────────────────────────────────────

    /// Splice `text` over `range` and commit the edit.
    ///
    /// Typed text always receives the typing attribute; deletions leave the
    /// surviving runs alone. The caret ends up after the inserted text.
    pub fn replace_characters(&mut self, range: Range<usize>, text: &str) -> EditInfo {
        if self.typing_status != TypingStatus::Installing {
            self.typing_status = if text.is_empty() {
                TypingStatus::Removing
            } else {
                TypingStatus::Typing
            };
        }

        let edit = self.buffer.replace_characters(range, text);
        self.process_editing(&edit);
        self.typing_status = TypingStatus::None;
        self.bump_generation();

        let caret = edit.range.end;
        self.selection = caret..caret;
        self.last_location = Some(caret);
        self.edits.emit(edit.clone());
        edit
    }

    /// Replace the current selection with `text`.
    pub fn insert_at_selection(&mut self, text: &str) -> EditInfo {
        self.replace_characters(self.selection.clone(), text)
    }

    fn process_editing(&mut self, edit: &EditInfo) {
        if self.typing_status == TypingStatus::Typing && !edit.range.is_empty() {
            let attributes = self.typing_attributes.clone();
            self.set_attributes(edit.range.clone(), attributes);
        }
    }

    /// Overwrite the attributes of `range`.
    ///
    /// Only honoured while typing or installing; otherwise nothing happens
    /// and `false` is returned. Out-of-bounds ranges are ignored too.
    pub fn set_attributes(&mut self, range: Range<usize>, attributes: TextAttributes) -> bool {
        if !self.typing_status.allows_attribute_writes() {
            debug!(
                "Ignoring attribute write to {:?} outside an edit ({:?})",
                range, self.typing_status
            );
            return false;
        }
        let written = self.buffer.set_attributes(range, attributes);
        if written {
            self.bump_generation();
        }
        written
    }

    /// Make any import started before now stale.
    fn bump_generation(&mut self) {
        self.generation += 1;
    }

    /// Replace the whole buffer.
    ///
    /// Any import still in flight becomes stale.
    pub fn set_attributed_buffer(&mut self, buffer: StyledBuffer) {
        self.typing_status = TypingStatus::Installing;
        let old_len = self.buffer.len();
        self.buffer = buffer;
        self.bump_generation();
        self.typing_status = TypingStatus::None;

        let len = self.buffer.len();
        self.selection = self.selection.start.min(len)..self.selection.end.min(len);
        self.last_location = None;
        self.edits.emit(EditInfo {
            range: 0..len,
            delta: len as isize - old_len as isize,
        });
        debug!("Installed buffer of {} chars (generation {})", len, self.generation);
    }

    /// Apply the typing attribute's keys to a non-empty selection.
    ///
    /// Each run keeps the imported entries (link targets and the like) of
    /// keys that stay active. Returns `true` if anything was written.
    pub fn replace_attributes_if_needed(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        let keys = self
            .typing_attributes
            .marker()
            .cloned()
            .unwrap_or_else(|| self.machine.table().default_keys());

        self.typing_status = TypingStatus::Installing;
        let machine = &self.machine;
        let written = self
            .buffer
            .update_attributes(self.selection.clone(), |run| {
                machine.rederive_attributes(&keys, run)
            });
        self.typing_status = TypingStatus::None;
        if written {
            self.bump_generation();
        }
        written
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Caret Tracking
    // ─────────────────────────────────────────────────────────────────────────

    /// Record a new selection and follow the caret.
    pub fn set_selection(&mut self, selection: Range<usize>) -> bool {
        let len = self.buffer.len();
        let start = selection.start.min(len);
        let end = selection.end.min(len).max(start);
        self.selection = start..end;
        self.update_current_location_attributes_if_needed(end)
    }

    /// Adopt the styles of the text left of the caret.
    ///
    /// Acts only for a collapsed selection when the caret jumped by more
    /// than one position (or was never seen). The char before the caret
    /// decides: its key marker is synced into the state machine, and text
    /// without a marker resets the machine to the default style. The caret
    /// is recorded either way. Returns `true` if the typing attribute was
    /// re-derived.
    pub fn update_current_location_attributes_if_needed(&mut self, caret: usize) -> bool {
        let moved = self
            .last_location
            .map_or(true, |last| caret.abs_diff(last) > 1);
        self.last_location = Some(caret);
        if !self.selection.is_empty() || !moved {
            return false;
        }

        let attributes = self.buffer.attributes_at(caret.saturating_sub(1));
        match attributes.marker() {
            Some(keys) => {
                self.machine.sync_active(keys);
                self.typing_attributes = attributes;
            }
            None => {
                self.typing_attributes = self.machine.reset();
            }
        }
        true
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Markup
    // ─────────────────────────────────────────────────────────────────────────

    /// Encode the buffer, optionally wrapped in `wrapper`.
    pub fn export_markup(&self, wrapper: Option<&str>) -> String {
        self.codec.encode(&self.buffer, wrapper)
    }

    /// Encode the buffer wrapped in the configured root tag.
    pub fn export_document(&self) -> String {
        self.codec.encode_document(&self.buffer)
    }

    /// Decode `source` and install it. The buffer is untouched on failure.
    pub fn import_markup(&mut self, source: &str) -> Result<(), DecodeError> {
        let buffer = self.codec.decode(source)?;
        self.set_attributed_buffer(buffer);
        Ok(())
    }

    /// Start decoding `source` in the background; see [`poll_import`](Self::poll_import).
    ///
    /// Replaces any import already in flight.
    pub fn begin_import(&mut self, source: impl Into<String>) {
        if self.pending_import.is_some() {
            debug!("Abandoning previous import");
        }
        let pending = self.codec.spawn_decode(source);
        self.pending_import = Some((self.generation, pending));
    }

    /// Install the background decode if it has finished.
    ///
    /// Returns `None` while nothing has finished. A decode that completes
    /// after the buffer was replaced is discarded and reported as
    /// [`DecodeError::Cancelled`].
    pub fn poll_import(&mut self) -> Option<Result<(), DecodeError>> {
        let (started_at, pending) = self.pending_import.as_mut()?;
        let result = pending.try_take()?;
        let started_at = *started_at;
        self.pending_import = None;

        if started_at != self.generation {
            info!(
                "Discarding stale import (started at generation {}, now {})",
                started_at, self.generation
            );
            return Some(Err(DecodeError::Cancelled));
        }

        Some(match result {
            Ok(buffer) => {
                self.set_attributed_buffer(buffer);
                Ok(())
            }
            Err(e) => {
                warn!("Background import failed: {}", e);
                Err(e)
            }
        })
    }

    /// Drop any import in flight.
    pub fn cancel_import(&mut self) {
        self.pending_import = None;
    }

    pub fn is_importing(&self) -> bool {
        self.pending_import.is_some()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Receive an [`EditInfo`] for every committed edit.
    pub fn subscribe_edits(&mut self) -> Receiver<EditInfo> {
        self.edits.subscribe()
    }

    pub fn buffer(&self) -> &StyledBuffer {
        &self.buffer
    }

    pub fn text(&self) -> &str {
        self.buffer.text()
    }

    pub fn machine(&self) -> &StyleStateMachine {
        &self.machine
    }

    /// Direct access to the machine, e.g. to subscribe to its streams.
    pub fn machine_mut(&mut self) -> &mut StyleStateMachine {
        &mut self.machine
    }

    pub fn codec(&self) -> &MarkupCodec {
        &self.codec
    }

    pub fn typing_status(&self) -> TypingStatus {
        self.typing_status
    }

    pub fn typing_attributes(&self) -> &TextAttributes {
        &self.typing_attributes
    }

    pub fn selection(&self) -> Range<usize> {
        self.selection.clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
