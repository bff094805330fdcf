//! A bounded buffer of worker output lines for display in a console view.

use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

const MAX_CONSOLE_LINES: usize = 1000;

/// One line of worker output with its arrival time.
#[derive(Clone, Debug)]
pub struct ConsoleEntry {
    /// Local wall-clock time the line arrived.
    pub timestamp: DateTime<Local>,
    /// The line, verbatim, without its terminator.
    pub text: String,
}

/// A thread-safe, fixed-capacity console line buffer.
///
/// The session's log sink pushes from the reader task; display collaborators
/// read under the guard or take a snapshot. Oldest lines are evicted once
/// the capacity is reached.
#[derive(Clone)]
pub struct ConsoleBuffer(Arc<Mutex<VecDeque<ConsoleEntry>>>);

impl Default for ConsoleBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(VecDeque::with_capacity(
            MAX_CONSOLE_LINES,
        ))))
    }

    /// Appends a line, evicting the oldest entry when full.
    pub fn push(&self, text: impl Into<String>) {
        let mut buffer = self.0.lock().unwrap();
        if buffer.len() >= MAX_CONSOLE_LINES {
            buffer.pop_front();
        }
        buffer.push_back(ConsoleEntry {
            timestamp: Local::now(),
            text: text.into(),
        });
    }

    /// Locks the buffer for reading.
    pub fn read(&self) -> std::sync::MutexGuard<'_, VecDeque<ConsoleEntry>> {
        self.0.lock().unwrap()
    }

    /// Number of buffered lines.
    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    /// True if no lines are buffered.
    pub fn is_empty(&self) -> bool {
        self.0.lock().unwrap().is_empty()
    }

    /// Snapshot of the buffered line texts, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().iter().map(|e| e.text.clone()).collect()
    }

    /// Drops all buffered lines.
    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}
