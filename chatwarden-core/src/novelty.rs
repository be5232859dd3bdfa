// File: src/novelty.rs

use std::path::Path;

use rand::seq::IndexedRandom;
use tracing::{info, warn};

pub const FALLBACK_QUOTE: &str = "🌟 Stay positive and keep pushing forward!";

pub const LUCKY_EMOJIS: &[&str] = &[
    "⭐️", "🧠", "😎", "♥️", "💙", "💚", "😇", "🌟", "✨", "💫", "❤️‍🔥",
];

/// Pool of quotes handed out with novelty rewards.
#[derive(Debug, Clone, Default)]
pub struct QuoteBook {
    quotes: Vec<String>,
}

impl QuoteBook {
    /// One quote per line; blank lines and `#` comment lines are skipped.
    pub fn parse(contents: &str) -> Self {
        let quotes = contents
            .lines()
            .filter(|line| !line.starts_with('#'))
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { quotes }
    }

    /// Reads the quote file. A missing or unreadable file yields an empty book,
    /// which still answers with [`FALLBACK_QUOTE`].
    pub async fn load(path: &Path) -> Self {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => {
                let book = Self::parse(&contents);
                if book.is_empty() {
                    warn!("No quotes found in {}", path.display());
                } else {
                    info!("Loaded {} quotes from {}", book.len(), path.display());
                }
                book
            }
            Err(e) => {
                warn!("Could not read quotes from {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn pick(&self) -> String {
        self.quotes
            .choose(&mut rand::rng())
            .cloned()
            .unwrap_or_else(|| FALLBACK_QUOTE.to_string())
    }
}

/// `count` distinct emojis from [`LUCKY_EMOJIS`].
pub fn lucky_emojis(count: usize) -> Vec<String> {
    LUCKY_EMOJIS
        .choose_multiple(&mut rand::rng(), count)
        .map(|e| e.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_comments_and_blanks() {
        let book = QuoteBook::parse("# Quotes\n\nFirst quote\n  \n# Verses\nSecond quote\n");
        assert_eq!(book.len(), 2);
        let picked = book.pick();
        assert!(picked == "First quote" || picked == "Second quote");
    }

    #[test]
    fn empty_book_falls_back() {
        assert_eq!(QuoteBook::default().pick(), FALLBACK_QUOTE);
    }

    #[test]
    fn lucky_emojis_are_distinct() {
        let set = lucky_emojis(3);
        assert_eq!(set.len(), 3);
        assert_ne!(set[0], set[1]);
        assert_ne!(set[1], set[2]);
        assert_ne!(set[0], set[2]);
    }

    #[tokio::test]
    async fn missing_file_gives_empty_book() {
        let book = QuoteBook::load(Path::new("/definitely/not/here.txt")).await;
        assert!(book.is_empty());
    }
}
