// File: src/ledger.rs
//
// Flat CSV score log plus the leaderboard aggregation over it.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use chatwarden_common::models::{LedgerEntry, ScoreAggregate};
use chatwarden_common::traits::LedgerStore;
use crate::Error;

pub const LEDGER_HEADER: &str = "timestamp,user,message,score";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only CSV file with header `timestamp,user,message,score`.
///
/// Readers take a whole-file snapshot and only trust newline-terminated rows,
/// so a row being written concurrently is never half-read.
pub struct CsvLedger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LedgerStore for CsvLedger {
    async fn append(&self, entry: &LedgerEntry) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let mut chunk = String::new();
        if file.metadata().await?.len() == 0 {
            chunk.push_str(LEDGER_HEADER);
            chunk.push('\n');
        }
        chunk.push_str(&format_row(entry));
        chunk.push('\n');

        file.write_all(chunk.as_bytes()).await?;
        file.flush().await?;
        debug!("ledger += {} {} ({})", entry.user, entry.score, self.path.display());
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<LedgerEntry>, Error> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(parse_snapshot(&contents))
    }
}

/// Parses a full-file snapshot. The trailing segment after the last newline is
/// ignored; malformed rows are skipped with a warning.
pub fn parse_snapshot(contents: &str) -> Vec<LedgerEntry> {
    let complete = match contents.rfind('\n') {
        Some(idx) => &contents[..idx],
        None => return Vec::new(),
    };

    let mut entries = Vec::new();
    for (line_no, line) in complete.split('\n').enumerate() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || (line_no == 0 && line == LEDGER_HEADER) {
            continue;
        }
        match parse_row(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!("Skipping ledger line {}: {}", line_no + 1, e),
        }
    }
    entries
}

fn parse_row(line: &str) -> Result<LedgerEntry, Error> {
    let fields = split_fields(line)?;
    if fields.len() != 4 {
        return Err(Error::Ledger(format!("expected 4 fields, found {}", fields.len())));
    }
    let timestamp = NaiveDateTime::parse_from_str(&fields[0], TIMESTAMP_FORMAT)?;
    let score: f64 = fields[3].trim().parse()?;
    Ok(LedgerEntry {
        timestamp,
        user: fields[1].clone(),
        message: fields[2].clone(),
        score,
    })
}

fn format_row(entry: &LedgerEntry) -> String {
    format!(
        "{},{},{},{}",
        entry.timestamp.format(TIMESTAMP_FORMAT),
        quote_field(&entry.user),
        quote_field(&entry.message),
        entry.score
    )
}

/// Rows are single-line, so embedded line breaks become spaces before quoting.
fn quote_field(raw: &str) -> String {
    let flat: String = raw
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    if flat.contains(',') || flat.contains('"') {
        format!("\"{}\"", flat.replace('"', "\"\""))
    } else {
        flat
    }
}

fn split_fields(line: &str) -> Result<Vec<String>, Error> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.is_empty() => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if in_quotes {
        return Err(Error::Ledger("unterminated quoted field".into()));
    }
    fields.push(current);
    Ok(fields)
}

/// Sums scores per user and returns the `n` highest totals.
/// Ties keep the order in which users first appear in the ledger.
pub fn top_n(entries: &[LedgerEntry], n: usize) -> Vec<ScoreAggregate> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<ScoreAggregate> = Vec::new();

    for entry in entries {
        match index.get(entry.user.as_str()) {
            Some(&i) => totals[i].total += entry.score,
            None => {
                index.insert(entry.user.as_str(), totals.len());
                totals.push(ScoreAggregate {
                    user: entry.user.clone(),
                    total: entry.score,
                });
            }
        }
    }

    totals.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal));
    totals.truncate(n);
    totals
}

/// Full scan of `store` followed by [`top_n`].
pub async fn leaderboard(store: &dyn LedgerStore, n: usize) -> Result<Vec<ScoreAggregate>, Error> {
    let entries = store.entries().await?;
    Ok(top_n(&entries, n))
}

/// Ledger kept in memory; handy for tests and dry runs.
#[derive(Default)]
pub struct MemoryLedger {
    entries: Mutex<Vec<LedgerEntry>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn append(&self, entry: &LedgerEntry) -> Result<(), Error> {
        self.entries.lock().await.push(entry.clone());
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<LedgerEntry>, Error> {
        Ok(self.entries.lock().await.clone())
    }
}
