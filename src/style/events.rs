//! Multicast notification streams
//!
//! Each stream fans a value out to every live subscriber over a
//! `std::sync::mpsc` channel. Subscribers poll their receiver without
//! blocking, the same way workspace file events are drained.

use std::sync::mpsc::{channel, Receiver, Sender};

/// A discrete multicast notification of the latest value.
///
/// Late subscribers only see subsequent emissions, unless they subscribe
/// with [`EventStream::subscribe_with_replay`].
#[derive(Debug)]
pub struct EventStream<T> {
    subscribers: Vec<Sender<T>>,
    last: Option<T>,
}

impl<T> Default for EventStream<T> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
            last: None,
        }
    }
}

impl<T: Clone> EventStream<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every value emitted from now on.
    pub fn subscribe(&mut self) -> Receiver<T> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    /// Like [`subscribe`](Self::subscribe), but the most recent value (if
    /// any) is delivered first.
    pub fn subscribe_with_replay(&mut self) -> Receiver<T> {
        let (tx, rx) = channel();
        if let Some(last) = &self.last {
            let _ = tx.send(last.clone());
        }
        self.subscribers.push(tx);
        rx
    }

    /// Deliver `value` to all subscribers, forgetting the ones that hung up.
    pub fn emit(&mut self, value: T) {
        self.subscribers.retain(|tx| tx.send(value.clone()).is_ok());
        self.last = Some(value);
    }

    pub fn latest(&self) -> Option<&T> {
        self.last.as_ref()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Drain all pending values from a receiver. Non-blocking.
pub fn drain<T>(receiver: &Receiver<T>) -> Vec<T> {
    let mut values = Vec::new();
    while let Ok(value) = receiver.try_recv() {
        values.push(value);
    }
    values
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
