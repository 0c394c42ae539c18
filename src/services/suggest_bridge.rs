//! Bridge between background fetch threads and the synchronous main loop.
//!
//! Continuation requests run on background threads (blocking HTTP); the main
//! loop stays synchronous (input, buffer manipulation, rendering). A
//! `std::sync::mpsc` channel carries the results back, and the main loop
//! drains it once per iteration. The candidate list and popup state are only
//! ever touched on the main loop, so no locking is needed around them.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};

/// Messages sent from fetch threads to the main loop.
#[derive(Debug)]
pub enum SuggestMessage {
    /// A continuation response arrived.
    Continuations {
        request_id: u64,
        /// The in-progress word at the time the request was dispatched,
        /// used for case matching.
        current_word: String,
        items: Vec<String>,
    },

    /// The fetch failed (transport error, timeout, or malformed body).
    FetchFailed { request_id: u64, error: String },
}

/// Channel pair bridging fetch threads and the main loop.
///
/// The sender is cheap to clone and is handed to each fetch thread; the
/// receiver is drained non-blockingly each main-loop iteration.
#[derive(Clone)]
pub struct SuggestBridge {
    sender: mpsc::Sender<SuggestMessage>,
    // Receiver wrapped in Arc<Mutex<>> to allow cloning
    receiver: Arc<Mutex<mpsc::Receiver<SuggestMessage>>>,
}

impl SuggestBridge {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }

    /// A cloneable sender for fetch threads.
    pub fn sender(&self) -> mpsc::Sender<SuggestMessage> {
        self.sender.clone()
    }

    /// Drain all pending messages without blocking.
    pub fn try_recv_all(&self) -> Vec<SuggestMessage> {
        let mut messages = Vec::new();

        if let Ok(receiver) = self.receiver.lock() {
            while let Ok(msg) = receiver.try_recv() {
                messages.push(msg);
            }
        }

        messages
    }
}

impl Default for SuggestBridge {
    fn default() -> Self {
        Self::new()
    }
}
