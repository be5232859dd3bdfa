// File: src/counters.rs

use std::collections::HashMap;

use chrono::{Local, NaiveDate};

#[derive(Debug, Clone, Copy)]
struct DailyCounter {
    count: u32,
    day: NaiveDate,
}

/// Per-user counters that reset when the calendar day changes.
///
/// The reset is lazy: a stale counter is only zeroed when it is next touched.
/// Days are local-time calendar days.
#[derive(Debug)]
pub struct DailyCounterStore {
    counters: HashMap<String, DailyCounter>,
    cap: u32,
}

impl DailyCounterStore {
    pub fn new(cap: u32) -> Self {
        Self {
            counters: HashMap::new(),
            cap,
        }
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    /// Bumps today's count for `user`. Returns the new count and whether it is within the cap.
    pub fn increment(&mut self, user: &str) -> (u32, bool) {
        self.increment_on(user, today())
    }

    pub fn increment_on(&mut self, user: &str, day: NaiveDate) -> (u32, bool) {
        let counter = self
            .counters
            .entry(user.to_string())
            .or_insert(DailyCounter { count: 0, day });

        if counter.day != day {
            counter.count = 0;
            counter.day = day;
        }
        counter.count = counter.count.saturating_add(1);

        (counter.count, counter.count <= self.cap)
    }

    pub fn current_count(&self, user: &str) -> u32 {
        self.current_count_on(user, today())
    }

    pub fn current_count_on(&self, user: &str, day: NaiveDate) -> u32 {
        self.counters
            .get(user)
            .filter(|c| c.day == day)
            .map(|c| c.count)
            .unwrap_or(0)
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
