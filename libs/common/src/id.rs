use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Prefix used when a connection id is rendered for logs.
pub const CONNECTION_PREFIX: &str = "conn";

/// Process-unique identifier for one accepted connection.
///
/// Ids are handed out by [`IdAllocator`] and are never reused, even after the
/// connection they named has closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", CONNECTION_PREFIX, self.0)
    }
}

/// Monotonic connection id source, safe to share across accept tasks.
///
/// Starts at 1; 0 is never issued.
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Allocate the next id. Concurrent callers always observe distinct values.
    pub fn next_id(&self) -> ConnectionId {
        ConnectionId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let ids = IdAllocator::new();
        assert_eq!(ids.next_id().as_u64(), 1);
        assert_eq!(ids.next_id().as_u64(), 2);
        assert_eq!(ids.next_id().as_u64(), 3);
    }

    #[test]
    fn test_display_format() {
        assert_eq!(ConnectionId::from_raw(42).to_string(), "conn-42");
    }

    #[test]
    fn test_uniqueness_across_threads() {
        let ids = Arc::new(IdAllocator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = ids.clone();
                thread::spawn(move || (0..500).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 8 * 500);
    }
}
