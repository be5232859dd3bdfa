// tests/test_utils/mod.rs
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;

use chatwarden_ai::RetryPolicy;
use chatwarden_common::error::{ClassifierError, TransportError};
use chatwarden_common::models::{RawMessage, SessionHandle, TransportSource};
use chatwarden_common::traits::{ChatTransport, Classifier};
use chatwarden_core::config::PipelineConfig;
use chatwarden_core::novelty::QuoteBook;
use chatwarden_core::pipeline::ClassifierPipeline;
use chatwarden_core::platforms::widget::{ElementId, WidgetDriver};

mock! {
    pub Classifier {}
    #[async_trait]
    impl Classifier for Classifier {
        async fn moderation_check(&self, text: &str) -> Result<bool, ClassifierError>;
        async fn answer(&self, text: &str, context: &[String]) -> Result<String, ClassifierError>;
    }
}

/// Classifier that never flags anything and is never asked a question.
pub fn friendly_classifier() -> MockClassifier {
    let mut mock = MockClassifier::new();
    mock.expect_moderation_check().returning(|_| Ok(false));
    mock.expect_answer().returning(|_, _| Ok("glad you asked!".to_string()));
    mock
}

pub fn quick_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::ZERO)
}

pub fn pipeline_with(classifier: MockClassifier) -> ClassifierPipeline {
    ClassifierPipeline::new(
        PipelineConfig::default(),
        Arc::new(classifier),
        quick_retry(),
        QuoteBook::parse("Only quote\n"),
    )
}

pub fn msg(user: &str, text: &str) -> RawMessage {
    RawMessage::new(user, text)
}

/// Shared counters so a test can keep observing a transport after handing it off.
#[derive(Clone, Default)]
pub struct CallLog {
    pub discover: Arc<AtomicUsize>,
    pub fetch: Arc<AtomicUsize>,
    pub close: Arc<AtomicUsize>,
}

impl CallLog {
    pub fn discovers(&self) -> usize {
        self.discover.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetch.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.close.load(Ordering::SeqCst)
    }
}

/// Transport that replays scripted results. When a script runs dry the last
/// discovery result repeats and fetches return empty batches.
pub struct ScriptedTransport {
    source: TransportSource,
    discoveries: VecDeque<Result<Option<SessionHandle>, TransportError>>,
    fetches: VecDeque<Result<Vec<RawMessage>, TransportError>>,
    last_discovery: Result<Option<SessionHandle>, TransportError>,
    pub calls: CallLog,
}

impl ScriptedTransport {
    pub fn new(source: TransportSource) -> Self {
        Self {
            source,
            discoveries: VecDeque::new(),
            fetches: VecDeque::new(),
            last_discovery: Ok(None),
            calls: CallLog::default(),
        }
    }

    pub fn discovers(mut self, result: Result<Option<SessionHandle>, TransportError>) -> Self {
        self.discoveries.push_back(result);
        self
    }

    pub fn fetches(mut self, result: Result<Vec<RawMessage>, TransportError>) -> Self {
        self.fetches.push_back(result);
        self
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    fn source(&self) -> TransportSource {
        self.source
    }

    async fn discover(&mut self) -> Result<Option<SessionHandle>, TransportError> {
        self.calls.discover.fetch_add(1, Ordering::SeqCst);
        if let Some(next) = self.discoveries.pop_front() {
            self.last_discovery = next;
        }
        self.last_discovery.clone()
    }

    async fn fetch_new_messages(&mut self) -> Result<Vec<RawMessage>, TransportError> {
        self.calls.fetch.fetch_add(1, Ordering::SeqCst);
        self.fetches.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.calls.close.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn handle(id: &str) -> Option<SessionHandle> {
    Some(SessionHandle(id.to_string()))
}

/// In-memory DOM for the widget scraper: rows of `(author, text)` rendered under
/// one row selector, with `.message-sender` / `.chat-text-normal` child nodes.
#[derive(Clone)]
pub struct FakeDom {
    pub row_selector: String,
    pub rows: Arc<Mutex<Vec<(String, String)>>>,
    pub opened: Arc<Mutex<Vec<String>>>,
    pub quits: Arc<AtomicUsize>,
    lost: Arc<Mutex<Option<String>>>,
}

impl FakeDom {
    pub fn new(row_selector: &str) -> Self {
        Self {
            row_selector: row_selector.to_string(),
            rows: Arc::new(Mutex::new(Vec::new())),
            opened: Arc::new(Mutex::new(Vec::new())),
            quits: Arc::new(AtomicUsize::new(0)),
            lost: Arc::new(Mutex::new(None)),
        }
    }

    /// Makes every DOM query fail the way chromedriver does after a browser crash,
    /// until the widget is opened again.
    pub fn lose_session(&self) {
        *self.lost.lock().unwrap() =
            Some("invalid session id: session deleted because of page crash".to_string());
    }

    pub fn quit_count(&self) -> usize {
        self.quits.load(Ordering::SeqCst)
    }

    pub fn render(&self, user: &str, text: &str) {
        self.rows
            .lock()
            .unwrap()
            .push((user.to_string(), text.to_string()));
    }

    fn row(&self, id: &str) -> Option<(String, String)> {
        let index: usize = id.split('-').nth(1)?.parse().ok()?;
        self.rows.lock().unwrap().get(index).cloned()
    }
}

#[async_trait]
impl WidgetDriver for FakeDom {
    async fn open(&mut self, url: &str) -> Result<(), TransportError> {
        self.opened.lock().unwrap().push(url.to_string());
        *self.lost.lock().unwrap() = None;
        Ok(())
    }

    async fn find_all(&self, css: &str) -> Result<Vec<ElementId>, TransportError> {
        if let Some(reason) = self.lost.lock().unwrap().clone() {
            return Err(TransportError::SessionEnded(reason));
        }
        if css != self.row_selector {
            return Ok(Vec::new());
        }
        let count = self.rows.lock().unwrap().len();
        Ok((0..count).map(|i| ElementId(format!("row-{i}"))).collect())
    }

    async fn find_all_within(&self, parent: &ElementId, css: &str) -> Result<Vec<ElementId>, TransportError> {
        let index = parent.0.trim_start_matches("row-");
        match css {
            ".message-sender" => Ok(vec![ElementId(format!("user-{index}"))]),
            ".chat-text-normal" => Ok(vec![ElementId(format!("text-{index}"))]),
            _ => Ok(Vec::new()),
        }
    }

    async fn text(&self, element: &ElementId) -> Result<String, TransportError> {
        let (user, text) = self
            .row(&element.0)
            .ok_or_else(|| TransportError::Driver("stale element reference".into()))?;
        if element.0.starts_with("user-") {
            Ok(user)
        } else {
            Ok(text)
        }
    }

    async fn quit(&mut self) -> Result<(), TransportError> {
        self.quits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
