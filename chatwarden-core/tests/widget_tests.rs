// tests/widget_tests.rs
mod test_utils;

use chatwarden_common::error::TransportError;
use chatwarden_common::traits::ChatTransport;
use chatwarden_core::platforms::{WidgetConfig, WidgetTransport};

use test_utils::FakeDom;

const URL: &str = "https://chat.example.test/embed?theme=dark";

fn transport(dom: &FakeDom) -> WidgetTransport {
    WidgetTransport::new(WidgetConfig::new(URL), Box::new(dom.clone()))
}

#[tokio::test]
async fn discovery_keeps_first_locator_with_rows() {
    let dom = FakeDom::new(".chat-line");
    dom.render("alice", "hello there");
    let mut widget = transport(&dom);

    let handle = widget.discover().await.unwrap().expect("session");
    assert_eq!(widget.active_locator(), Some("chat-line"));
    assert!(handle.as_str().starts_with(URL));
    assert_eq!(dom.opened.lock().unwrap().as_slice(), [URL.to_string()]);
}

#[tokio::test]
async fn empty_widget_has_no_session_yet() {
    let dom = FakeDom::new(".chat-line");
    let mut widget = transport(&dom);

    assert_eq!(widget.discover().await, Ok(None));
    assert_eq!(widget.fetch_new_messages().await, Err(TransportError::NotConnected));
}

#[tokio::test]
async fn first_poll_reads_backlog_then_only_new_rows() {
    let dom = FakeDom::new(".message-info-container");
    for i in 0..15 {
        dom.render(&format!("user{i}"), &format!("line {i}"));
    }
    let mut widget = transport(&dom);
    widget.discover().await.unwrap();

    let backlog = widget.fetch_new_messages().await.unwrap();
    assert_eq!(backlog.len(), 10);
    assert_eq!(backlog[0].text, "line 5");
    assert_eq!(backlog[9].text, "line 14");

    assert!(widget.fetch_new_messages().await.unwrap().is_empty());

    dom.render("zoe", "fresh line");
    dom.render("Restream.io", "Zoe joined the chat");
    let next = widget.fetch_new_messages().await.unwrap();
    assert_eq!(next.len(), 1);
    assert_eq!(next[0].source_user, "zoe");
    assert_eq!(next[0].text, "fresh line");
}

#[tokio::test]
async fn later_polls_only_look_at_the_tail() {
    let dom = FakeDom::new(".message-info-container");
    dom.render("alice", "one");
    let mut widget = transport(&dom);
    widget.discover().await.unwrap();
    assert_eq!(widget.fetch_new_messages().await.unwrap().len(), 1);

    for i in 0..8 {
        dom.render("bob", &format!("burst {i}"));
    }
    let tail = widget.fetch_new_messages().await.unwrap();
    let texts: Vec<&str> = tail.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["burst 3", "burst 4", "burst 5", "burst 6", "burst 7"]);
}

#[tokio::test]
async fn lost_browser_session_ends_the_widget_session() {
    let dom = FakeDom::new(".chat-line");
    dom.render("alice", "hello there");
    let mut widget = transport(&dom);
    widget.discover().await.unwrap().expect("session");

    dom.lose_session();
    let err = widget.fetch_new_messages().await.unwrap_err();
    assert!(err.is_session_ended(), "{err:?}");
    assert_eq!(dom.quit_count(), 1);
    assert_eq!(widget.active_locator(), None);
    assert_eq!(widget.fetch_new_messages().await, Err(TransportError::NotConnected));

    widget.discover().await.unwrap().expect("fresh session");
    assert_eq!(dom.opened.lock().unwrap().len(), 2);
    let batch = widget.fetch_new_messages().await.unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].text, "hello there");
}
