//! Background markup decoding
//!
//! A decode runs on a worker thread and reports back over a channel. The
//! owner polls for the result without blocking.

use crate::buffer::StyledBuffer;
use crate::error::DecodeError;
use std::sync::mpsc::{Receiver, TryRecvError};

/// Result delivered by a background decode.
pub type DecodeResult = Result<StyledBuffer, DecodeError>;

/// Handle to a decode running on a worker thread.
///
/// Dropping the handle abandons the decode; the worker finishes and its
/// result is discarded.
#[derive(Debug)]
pub struct PendingDecode {
    receiver: Receiver<DecodeResult>,
    finished: bool,
}

impl PendingDecode {
    pub(crate) fn new(receiver: Receiver<DecodeResult>) -> Self {
        Self {
            receiver,
            finished: false,
        }
    }

    /// Take the result if the worker is done.
    ///
    /// Returns `None` while the decode is running and after the result has
    /// been taken. A worker that died without reporting yields
    /// [`DecodeError::Cancelled`].
    pub fn try_take(&mut self) -> Option<DecodeResult> {
        if self.finished {
            return None;
        }
        let result = match self.receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(DecodeError::Cancelled),
        };
        self.finished = true;
        Some(result)
    }

    /// Block until the worker reports.
    pub fn wait(self) -> DecodeResult {
        if self.finished {
            return Err(DecodeError::Cancelled);
        }
        self.receiver.recv().unwrap_or(Err(DecodeError::Cancelled))
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn test_try_take_before_and_after_result() {
        let (tx, rx) = channel();
        let mut pending = PendingDecode::new(rx);
        assert!(pending.try_take().is_none());

        tx.send(Ok(StyledBuffer::new())).unwrap();
        assert!(matches!(pending.try_take(), Some(Ok(_))));
        assert!(pending.is_finished());
        assert!(pending.try_take().is_none());
    }

    #[test]
    fn test_dead_worker_is_cancelled() {
        let (tx, rx) = channel::<DecodeResult>();
        drop(tx);
        let mut pending = PendingDecode::new(rx);
        assert_eq!(pending.try_take(), Some(Err(DecodeError::Cancelled)));
    }
}
