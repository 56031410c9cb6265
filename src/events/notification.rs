//! Notification records and the append-only log
//!
//! Notifications describe state changes after they are committed. They are a
//! side channel for observers and are never replayed to rebuild state.

use crate::escrow::LedgerEvent;
use crate::registry::{RectangleSnapshot, RegistryEvent};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default number of notifications retained in memory
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

/// Change published by one of the contracts
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "source", content = "event", rename_all = "snake_case")]
pub enum Event {
    Registry(RegistryEvent<RectangleSnapshot>),
    Ledger(LedgerEvent),
}

impl Event {
    /// Short name of the event, used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Event::Registry(RegistryEvent::EntityCreated(_)) => "EntityCreated",
            Event::Registry(RegistryEvent::EntityChanged(_)) => "EntityChanged",
            Event::Ledger(LedgerEvent::Deposited(_)) => "Deposited",
            Event::Ledger(LedgerEvent::Withdrawn(_)) => "Withdrawn",
            Event::Ledger(LedgerEvent::RecipientChanged(_)) => "RecipientChanged",
            Event::Ledger(LedgerEvent::HaltChanged(_)) => "HaltChanged",
        }
    }
}

impl From<RegistryEvent<RectangleSnapshot>> for Event {
    fn from(event: RegistryEvent<RectangleSnapshot>) -> Self {
        Event::Registry(event)
    }
}

impl From<LedgerEvent> for Event {
    fn from(event: LedgerEvent) -> Self {
        Event::Ledger(event)
    }
}

/// Sequenced notification
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub sequence: u64,
    pub event: Event,
}

/// Bounded, append-only notification history
///
/// Sequence numbers keep increasing when old entries are dropped, so
/// observers can resume with [`NotificationLog::since`].
#[derive(Clone, Debug)]
pub struct NotificationLog {
    entries: VecDeque<Notification>,
    capacity: usize,
    next_sequence: u64,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            next_sequence: 0,
        }
    }

    /// Append an event and return the sequenced record
    pub fn append(&mut self, event: Event) -> Notification {
        let notification = Notification {
            sequence: self.next_sequence,
            event,
        };
        self.next_sequence += 1;

        self.entries.push_back(notification.clone());
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }

        notification
    }

    /// Retained notifications with `sequence >= from`
    pub fn since(&self, from: u64) -> Vec<Notification> {
        self.entries
            .iter()
            .filter(|n| n.sequence >= from)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sequence number the next notification will receive
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }
}

impl Default for NotificationLog {
    fn default() -> Self {
        Self::new()
    }
}
