// File: src/dedup.rs

use std::collections::{HashSet, VecDeque};

use tracing::trace;

use chatwarden_common::models::RawMessage;
use crate::Error;

/// Bounded set of recently seen message fingerprints.
///
/// Membership is O(1) through the hash set; the deque keeps insertion order so the
/// oldest fingerprint is the one evicted once `capacity` is reached. A fingerprint
/// that has been evicted is treated as new again.
#[derive(Debug)]
pub struct DedupWindow {
    seen: HashSet<String>,
    order: VecDeque<String>,
    capacity: usize,
}

impl DedupWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            seen: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns `true` if the message has not been seen inside the window, recording it.
    pub fn accept(&mut self, msg: &RawMessage) -> bool {
        self.accept_fingerprint(msg.fingerprint())
    }

    pub fn accept_fingerprint(&mut self, fingerprint: String) -> bool {
        if self.seen.contains(&fingerprint) {
            trace!("duplicate dropped: {}", fingerprint);
            return false;
        }

        while self.order.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.seen.remove(&oldest);
                }
                None => break,
            }
        }

        self.seen.insert(fingerprint.clone());
        self.order.push_back(fingerprint);
        true
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.seen.contains(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The set and the order queue must always agree and stay within capacity.
    pub fn check_invariants(&self) -> Result<(), Error> {
        if self.seen.len() != self.order.len() {
            return Err(Error::Invariant(format!(
                "dedup window out of sync: {} fingerprints in set, {} in order queue",
                self.seen.len(),
                self.order.len()
            )));
        }
        if self.order.len() > self.capacity {
            return Err(Error::Invariant(format!(
                "dedup window holds {} fingerprints, capacity is {}",
                self.order.len(),
                self.capacity
            )));
        }
        Ok(())
    }
}
