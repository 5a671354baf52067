//! Generation counter for discarding results of superseded requests.
//!
//! A view calls [`Epoch::begin`] before starting a load and checks the
//! returned [`Ticket`] when the load finishes. If another load began in the
//! meantime, the older result is dropped instead of overwriting newer state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default, Clone)]
pub struct Epoch {
    current: Arc<AtomicU64>,
}

#[derive(Debug, Clone)]
pub struct Ticket {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl Epoch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new generation, superseding every outstanding ticket.
    pub fn begin(&self) -> Ticket {
        let generation = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        Ticket {
            generation,
            current: Arc::clone(&self.current),
        }
    }

    pub fn generation(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.generation
    }

    /// Passes `value` through only while this ticket is still current.
    pub fn accept<T>(&self, value: T) -> Option<T> {
        self.is_current().then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_newer_ticket_supersedes() {
        let epoch = Epoch::new();
        let first = epoch.begin();
        assert!(first.is_current());

        let second = epoch.begin();
        assert!(!first.is_current());
        assert!(second.is_current());
        assert_eq!(first.accept(1), None);
        assert_eq!(second.accept(2), Some(2));
        assert_eq!(epoch.generation(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_result_discarded() {
        let epoch = Epoch::new();
        let slot = Arc::new(tokio::sync::Mutex::new(None));

        let load = |ticket: Ticket, delay: u64, value: &'static str| {
            let slot = Arc::clone(&slot);
            async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                if let Some(v) = ticket.accept(value) {
                    *slot.lock().await = Some(v);
                }
            }
        };

        let slow = load(epoch.begin(), 100, "fid 1");
        let fast = load(epoch.begin(), 10, "fid 2");
        tokio::join!(slow, fast);

        assert_eq!(*slot.lock().await, Some("fid 2"));
    }
}
