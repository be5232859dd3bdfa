//! Runtime knobs for the chat pipeline and the poll loop.
//!
//! The binary fills these from CLI flags and environment variables; tests build
//! them directly and override the fields they care about.

use std::path::PathBuf;
use std::time::Duration;

/// Settings consumed by [`crate::pipeline::ClassifierPipeline`].
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Exact (trimmed) message text that earns a novelty reward.
    pub trigger: String,
    pub points_per_reward: f64,
    pub max_points_per_day: f64,
    /// Authors whose lines are dropped without scoring. Compared case-sensitively.
    pub ignored_users: Vec<String>,
    /// Lower-case substrings that mark a message as a possible credential leak.
    pub sensitive_tokens: Vec<String>,
    /// Questions shorter than this (after trimming) are not sent for an answer.
    pub min_chars_for_response: usize,
    pub chat_memory_size: usize,
    pub similarity_threshold: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            trigger: "777".to_string(),
            points_per_reward: 0.5,
            max_points_per_day: 5.0,
            ignored_users: vec![
                "Nightbot".to_string(),
                "StreamElements".to_string(),
                "Restream.io".to_string(),
            ],
            sensitive_tokens: vec![
                "api".to_string(),
                "key".to_string(),
                "token".to_string(),
                "secret".to_string(),
            ],
            min_chars_for_response: 3,
            chat_memory_size: 30,
            similarity_threshold: 0.3,
        }
    }
}

impl PipelineConfig {
    /// Number of rewards a user can be credited per day.
    pub fn daily_reward_cap(&self) -> u32 {
        if self.points_per_reward <= 0.0 {
            return 0;
        }
        (self.max_points_per_day / self.points_per_reward).floor().max(0.0) as u32
    }
}

/// Settings consumed by [`crate::tasks::processor::ChatProcessor`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorConfig {
    pub dedup_capacity: usize,
    pub leaderboard_every: usize,
    pub leaderboard_size: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            dedup_capacity: 100,
            leaderboard_every: 10,
            leaderboard_size: 3,
        }
    }
}

/// Timing for [`crate::tasks::poll_loop::PollLoop`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollConfig {
    pub primary_interval: Duration,
    pub fallback_interval: Duration,
    /// Wait between discovery attempts while nothing is live.
    pub idle_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            primary_interval: Duration::from_secs(2),
            fallback_interval: Duration::from_millis(500),
            idle_interval: Duration::from_secs(30),
        }
    }
}

/// Where the on-disk artifacts live.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    pub ledger_path: PathBuf,
    pub quotes_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from("data/chat_history.csv"),
            quotes_path: PathBuf::from("data/quotes_and_verses.txt"),
        }
    }
}
