//! Thread-safe sequence counter for outbound frames.
//!
//! # What is the sequence field? (for beginners)
//!
//! Bytes 12..16 of every frame header carry a sequence id chosen by the sender.
//! The server does not require the ids to be meaningful, but stamping each
//! outbound frame with an increasing number makes captured traffic much easier
//! to read: the enter frame is 1, the first heartbeat is 2, and so on.
//!
//! # Thread safety
//!
//! The heartbeat loop and the reconnect path both send frames, possibly from
//! different worker threads.  The counter uses `AtomicU32`, so `next()` can be
//! called concurrently without a lock and never hands out the same value twice.

use std::sync::atomic::{AtomicU32, Ordering};

/// A thread-safe, monotonically increasing counter for frame sequence ids.
///
/// Sequence ids start at 1 and increment by 1 with each call to [`next`].
/// The counter wraps around at `u32::MAX` back to 0 without panicking.
///
/// [`next`]: SequenceCounter::next
///
/// # Examples
///
/// ```rust
/// use danmaku_core::protocol::SequenceCounter;
///
/// let counter = SequenceCounter::new();
/// assert_eq!(counter.next(), 1);
/// assert_eq!(counter.next(), 2);
/// ```
#[derive(Debug)]
pub struct SequenceCounter {
    inner: AtomicU32,
}

impl SequenceCounter {
    /// Creates a new counter whose first value is 1.
    pub fn new() -> Self {
        Self {
            inner: AtomicU32::new(1),
        }
    }

    /// Returns the next sequence id and atomically increments the counter.
    ///
    /// `Ordering::Relaxed` is enough: the value only labels frames and is
    /// never used to synchronise memory between threads.
    pub fn next(&self) -> u32 {
        // `fetch_add` returns the value *before* the addition and wraps on overflow.
        self.inner.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns the value the next call to [`SequenceCounter::next`] would hand out.
    pub fn current(&self) -> u32 {
        self.inner.load(Ordering::Relaxed)
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_sequence_counter_starts_at_one() {
        // Arrange
        let counter = SequenceCounter::new();

        // Act
        let first = counter.next();

        // Assert
        assert_eq!(first, 1);
    }

    #[test]
    fn test_sequence_counter_wraps_at_u32_max() {
        // Arrange – start the counter one step before overflow
        let counter = SequenceCounter {
            inner: AtomicU32::new(u32::MAX),
        };

        // Act
        let before_wrap = counter.next();
        let after_wrap = counter.next();

        // Assert
        assert_eq!(before_wrap, u32::MAX);
        assert_eq!(after_wrap, 0, "counter must wrap to 0 after u32::MAX");
    }

    #[test]
    fn test_sequence_counter_is_thread_safe() {
        // Arrange
        let counter = Arc::new(SequenceCounter::new());
        let thread_count = 8;
        let increments_per_thread = 500;

        // Act – increment from many threads simultaneously
        let handles: Vec<_> = (0..thread_count)
            .map(|_| {
                let c = Arc::clone(&counter);
                thread::spawn(move || {
                    (0..increments_per_thread)
                        .map(|_| c.next())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all_values: Vec<u32> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("thread panicked"))
            .collect();

        // Assert – no two threads got the same id
        all_values.sort_unstable();
        all_values.dedup();
        assert_eq!(all_values.len(), thread_count * increments_per_thread);
    }

    #[test]
    fn test_current_does_not_increment() {
        let counter = SequenceCounter::default();
        counter.next();

        assert_eq!(counter.current(), 2);
        assert_eq!(counter.next(), 2);
    }
}
