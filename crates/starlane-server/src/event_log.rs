//! Bounded log of sequenced level events, for clients catching up.

use std::collections::VecDeque;

use starlane_core::constants::EVENT_LOG_CAPACITY;
use starlane_core::events::SequencedEvent;

/// The requested events were evicted; the client must fetch a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("events before {oldest} are no longer retained (requested {requested})")]
pub struct Expired {
    pub requested: u64,
    pub oldest: u64,
}

#[derive(Debug)]
pub struct EventLog {
    capacity: usize,
    entries: VecDeque<SequencedEvent>,
    /// Lowest sequence number still answerable.
    oldest: u64,
}

impl EventLog {
    /// A log whose first entry will carry sequence number `start`.
    pub fn new(start: u64) -> Self {
        Self::with_capacity(start, EVENT_LOG_CAPACITY)
    }

    pub fn with_capacity(start: u64, capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::with_capacity(capacity.min(EVENT_LOG_CAPACITY)),
            oldest: start,
        }
    }

    pub fn push(&mut self, event: SequencedEvent) {
        if self.entries.len() == self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                self.oldest = evicted.seq + 1;
            }
        }
        self.entries.push_back(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = SequencedEvent>) {
        for event in events {
            self.push(event);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every retained event with `seq >= since`, oldest first.
    pub fn since(&self, since: u64) -> Result<Vec<SequencedEvent>, Expired> {
        if since < self.oldest {
            return Err(Expired {
                requested: since,
                oldest: self.oldest,
            });
        }
        Ok(self
            .entries
            .iter()
            .filter(|e| e.seq >= since)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starlane_core::events::LevelEvent;

    fn update(seq: u64) -> SequencedEvent {
        SequencedEvent {
            seq,
            tick: seq,
            event: LevelEvent::Update { tick: seq },
        }
    }

    #[test]
    fn test_since_returns_tail() {
        let mut log = EventLog::new(0);
        log.extend((0..5).map(update));
        let tail = log.since(3).unwrap();
        assert_eq!(tail.iter().map(|e| e.seq).collect::<Vec<_>>(), vec![3, 4]);
        assert!(log.since(5).unwrap().is_empty(), "caught-up client gets nothing");
    }

    #[test]
    fn test_eviction_expires_old_requests() {
        let mut log = EventLog::with_capacity(0, 3);
        log.extend((0..5).map(update));
        assert_eq!(log.len(), 3);
        assert_eq!(
            log.since(1),
            Err(Expired {
                requested: 1,
                oldest: 2
            })
        );
        assert_eq!(log.since(2).unwrap().len(), 3);
    }

    #[test]
    fn test_log_resumed_from_loaded_level() {
        let log = EventLog::new(100);
        assert!(log.since(99).is_err(), "events before the load are unknown");
        assert!(log.since(100).unwrap().is_empty());
    }
}
