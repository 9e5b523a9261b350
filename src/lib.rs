//! richstyle - rich-text styling engine
//!
//! Tracks a vocabulary of interacting style toggles (bold, italic, headings,
//! lists, ...), mirrors the active toggles into the attribute runs of a
//! styled text buffer as it is edited, and converts that buffer to and from
//! nested-tag markup.
//!
//! - [`style::StyleStateMachine`] resolves toggles through a pluggable
//!   [`style::ConflictPolicy`] and publishes the resulting key sets.
//! - [`buffer::StyledBufferController`] applies the typing attribute to new
//!   text and follows the caret.
//! - [`markup::MarkupCodec`] encodes and decodes markup.
//!
//! ```no_run
//! use richstyle::buffer::StyledBufferController;
//! use richstyle::config::load_config;
//!
//! let mut controller = StyledBufferController::from_settings(&load_config());
//! controller.toggle("bold");
//! controller.insert_at_selection("Hello");
//! println!("{}", controller.export_markup(None));
//! ```

pub mod attributes;
pub mod buffer;
pub mod config;
pub mod error;
pub mod markup;
pub mod presets;
pub mod string_utils;
pub mod style;

pub use attributes::{ActiveKeys, AttributeBag, AttributeResolver, AttributeValue, TextAttributes};
pub use buffer::{StyledBuffer, StyledBufferController};
pub use config::StyleSettings;
pub use error::{DecodeError, Error, Result, StyleError};
pub use markup::MarkupCodec;
pub use style::{StyleStateMachine, StyleStatus};
