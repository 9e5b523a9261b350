//! Styled text buffer and its edit controller

mod controller;
mod styled;

pub use controller::{StyledBufferController, TypingStatus};
pub use styled::{AttributeRun, EditInfo, Paragraph, StyledBuffer};
