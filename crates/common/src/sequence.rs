//! Process-wide sequence counters for unique test-data labels.
//!
//! Parallel tests share these counters, so every label handed out within a
//! process is distinct: `message-1`, `message-2`, `conversation-1`, ...

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter with a label prefix.
///
/// `const`-constructible so it can back a `static`.
#[derive(Debug)]
pub struct SequenceGenerator {
    prefix: &'static str,
    last: AtomicU64,
}

impl SequenceGenerator {
    pub const fn new(prefix: &'static str) -> Self {
        Self { prefix, last: AtomicU64::new(0) }
    }

    /// Next number in the sequence, starting at 1
    pub fn next(&self) -> u64 {
        self.last.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Next label, formatted as `<prefix>-<n>`
    pub fn next_id(&self) -> String {
        format!("{}-{}", self.prefix, self.next())
    }

    /// Most recently issued number, 0 before the first call
    pub fn current(&self) -> u64 {
        self.last.load(Ordering::Relaxed)
    }

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }
}

/// Counter for chat message labels
pub static MESSAGES: SequenceGenerator = SequenceGenerator::new("message");

/// Counter for conversation labels
pub static CONVERSATIONS: SequenceGenerator = SequenceGenerator::new("conversation");

pub fn next_message_id() -> String {
    MESSAGES.next_id()
}

pub fn next_conversation_id() -> String {
    CONVERSATIONS.next_id()
}
