//! Style vocabulary and the typing-context state machine
//!
//! This module holds the configured style identities ([`StyleDefinition`],
//! [`StyleTable`]), their statuses, the conflict policies that decide how
//! toggles interact, and the [`StyleStateMachine`] tying them together.

mod context;
pub mod events;
mod machine;
mod policy;

pub use context::*;
pub use events::{drain, EventStream};
pub use machine::*;
pub use policy::*;
