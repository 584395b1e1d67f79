//! Per-key locks for single-flight memoization

use dashmap::DashMap;
use std::sync::Arc;

/// Map of in-flight keys to the lock guarding their computation.
///
/// Entries are created on first use and removed when the last
/// [`FlightTicket`] for the key is dropped, including tickets held by a
/// panicking call or a future dropped before completion.
#[derive(Debug)]
pub(crate) struct SingleFlight<L> {
    locks: DashMap<String, Arc<L>>,
}

impl<L: Default> SingleFlight<L> {
    pub(crate) fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Join the callers currently working on `key`
    pub(crate) fn ticket(&self, key: &str) -> FlightTicket<'_, L> {
        let lock = Arc::clone(self.locks.entry(key.to_string()).or_default().value());
        FlightTicket {
            flights: self,
            key: key.to_string(),
            lock,
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.len()
    }
}

/// A caller's share of an in-flight key.
///
/// Guards taken from [`FlightTicket::lock`] borrow the ticket, so they are
/// always released before it.
pub(crate) struct FlightTicket<'a, L: Default> {
    flights: &'a SingleFlight<L>,
    key: String,
    lock: Arc<L>,
}

impl<L: Default> FlightTicket<'_, L> {
    pub(crate) fn lock(&self) -> &L {
        &self.lock
    }
}

impl<L: Default> Drop for FlightTicket<'_, L> {
    fn drop(&mut self) {
        // The map's clone plus this ticket's. The shard stays write-locked
        // inside remove_if, so no new ticket can be issued in between.
        self.flights.locks.remove_if(&self.key, |_, current| {
            Arc::ptr_eq(current, &self.lock) && Arc::strong_count(current) == 2
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_same_key_shares_lock() {
        let flights: SingleFlight<Mutex<()>> = SingleFlight::new();

        let first = flights.ticket("k");
        let second = flights.ticket("k");
        let other = flights.ticket("j");

        assert!(std::ptr::eq(first.lock(), second.lock()));
        assert!(!std::ptr::eq(first.lock(), other.lock()));
        assert_eq!(flights.len(), 2);
    }

    #[test]
    fn test_last_ticket_removes_entry() {
        let flights: SingleFlight<Mutex<()>> = SingleFlight::new();
        let first = flights.ticket("k");
        let second = flights.ticket("k");

        drop(first);
        assert_eq!(flights.len(), 1);

        drop(second);
        assert_eq!(flights.len(), 0);
    }

    #[test]
    fn test_ticket_dropped_during_panic_removes_entry() {
        let flights: SingleFlight<Mutex<()>> = SingleFlight::new();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let ticket = flights.ticket("k");
            let _held = ticket.lock().lock();
            panic!("computation failed");
        }));

        assert!(outcome.is_err());
        assert_eq!(flights.len(), 0);
    }

    #[test]
    fn test_reissued_key_gets_fresh_lock() {
        let flights: SingleFlight<Mutex<()>> = SingleFlight::new();
        drop(flights.ticket("k"));
        assert_eq!(flights.len(), 0);

        let second = flights.ticket("k");

        assert_eq!(flights.len(), 1);
        assert!(second.lock().try_lock().is_some());
        drop(second);
        assert_eq!(flights.len(), 0);
    }
}
