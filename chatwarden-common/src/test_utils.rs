//! Canned-response HTTP client for tests across the workspace.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::http::{HttpClient, HttpResponse};
use crate::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: Option<serde_json::Value>,
}

enum Scripted {
    Reply(HttpResponse),
    ConnectionRefused,
}

struct Route {
    method: String,
    url_fragment: String,
    replies: VecDeque<Scripted>,
}

/// Answers requests from a script of routes. A route matches on method and a URL
/// substring; its replies are consumed in order and the last one repeats.
#[derive(Default)]
pub struct ScriptedHttpClient {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, method: &str, url_fragment: &str, status: u16, body: impl Into<String>) -> &Self {
        self.push(method, url_fragment, Scripted::Reply(HttpResponse::new(status, body)));
        self
    }

    pub fn on_refused(&self, method: &str, url_fragment: &str) -> &Self {
        self.push(method, url_fragment, Scripted::ConnectionRefused);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn request_count(&self, url_fragment: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.url.contains(url_fragment))
            .count()
    }

    fn push(&self, method: &str, url_fragment: &str, reply: Scripted) {
        let mut routes = self.routes.lock().expect("routes poisoned");
        if let Some(route) = routes
            .iter_mut()
            .find(|r| r.method == method && r.url_fragment == url_fragment)
        {
            route.replies.push_back(reply);
            return;
        }
        routes.push(Route {
            method: method.to_string(),
            url_fragment: url_fragment.to_string(),
            replies: VecDeque::from([reply]),
        });
    }

    fn answer(&self, method: &str, url: &str, body: Option<serde_json::Value>) -> Result<HttpResponse, Error> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(RecordedRequest {
                method: method.to_string(),
                url: url.to_string(),
                body,
            });
        }

        let mut routes = self.routes.lock().expect("routes poisoned");
        let route = routes
            .iter_mut()
            .find(|r| r.method == method && url.contains(&r.url_fragment))
            .ok_or_else(|| Error::NotFound(format!("no scripted reply for {method} {url}")))?;

        let reply = if route.replies.len() > 1 {
            route.replies.pop_front()
        } else {
            route.replies.front().map(|r| match r {
                Scripted::Reply(resp) => Scripted::Reply(resp.clone()),
                Scripted::ConnectionRefused => Scripted::ConnectionRefused,
            })
        };

        match reply {
            Some(Scripted::Reply(resp)) => Ok(resp),
            Some(Scripted::ConnectionRefused) => Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))),
            None => Err(Error::NotFound(format!("script exhausted for {method} {url}"))),
        }
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn get(&self, url: &str, _headers: HashMap<String, String>) -> Result<HttpResponse, Error> {
        self.answer("GET", url, None)
    }

    async fn post_json(
        &self,
        url: &str,
        _headers: HashMap<String, String>,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, Error> {
        self.answer("POST", url, Some(body.clone()))
    }

    async fn delete(&self, url: &str) -> Result<HttpResponse, Error> {
        self.answer("DELETE", url, None)
    }
}
