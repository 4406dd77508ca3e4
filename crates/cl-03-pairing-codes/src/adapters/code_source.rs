//! `CodeSource` implementations.

use crate::ports::CodeSource;
use parking_lot::Mutex;
use rand::Rng;
use std::collections::VecDeque;

/// Uniformly random digits from the thread RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodeSource;

impl CodeSource for RandomCodeSource {
    fn next_code(&self, length: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }
}

/// Scripted candidates for tests and fixtures.
///
/// Hands out queued codes in order, then falls back to random ones.
#[derive(Debug, Default)]
pub struct SequenceCodeSource {
    queue: Mutex<VecDeque<String>>,
}

impl SequenceCodeSource {
    /// Source yielding `codes` first.
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queue: Mutex::new(codes.into_iter().map(Into::into).collect()),
        }
    }

    /// Append a candidate.
    pub fn push(&self, code: impl Into<String>) {
        self.queue.lock().push_back(code.into());
    }
}

impl CodeSource for SequenceCodeSource {
    fn next_code(&self, length: usize) -> String {
        self.queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| RandomCodeSource.next_code(length))
    }
}
