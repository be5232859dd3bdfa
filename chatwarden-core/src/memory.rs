use std::collections::VecDeque;

/// One remembered chat line.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryEntry {
    pub user: String,
    pub text: String,
}

/// Rolling window of the most recent chat lines, oldest first.
///
/// Feeds the answer prompt with context and gives the meaningfulness check
/// something to compare new lines against.
#[derive(Debug)]
pub struct ChatMemory {
    entries: VecDeque<MemoryEntry>,
    max_entries: usize,
}

impl ChatMemory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_entries),
            max_entries,
        }
    }

    pub fn store(&mut self, user: &str, text: &str) {
        if self.max_entries == 0 {
            return;
        }
        self.entries.push_back(MemoryEntry {
            user: user.to_string(),
            text: text.to_string(),
        });
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    pub fn texts(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.text.clone()).collect()
    }

    /// `user: text` lines, suitable for prompt context.
    pub fn context(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| format!("{}: {}", e.user, e.text))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
