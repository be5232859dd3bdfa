// chatwarden-server/src/display.rs
//
// Console display collaborator: subscribes to the event bus and logs what a
// chat overlay would show.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use chatwarden_common::models::ScoreAggregate;
use chatwarden_core::eventbus::ChatEvent;

const RANK_BADGES: &[&str] = &["👑", "🥈", "🥉"];

pub fn spawn_display(mut rx: mpsc::Receiver<ChatEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            show(&event);
        }
    })
}

fn show(event: &ChatEvent) {
    match event {
        ChatEvent::Message { user, text, verdict, reply, .. } => {
            match text {
                Some(text) => info!("[{}] {}: {}", verdict.label(), user, text),
                None => info!("[{}] {}", verdict.label(), user),
            }
            if let Some(reply) = reply {
                info!("  ↳ {}", reply.replace('\n', " | "));
            }
        }
        ChatEvent::Leaderboard(board) => info!("CHAT CHAMPS {}", format_board(board)),
        ChatEvent::Failover { reason } => warn!("Switched to fallback chat transport: {}", reason),
        ChatEvent::SessionStarted { source, handle } => {
            info!("Live chat session started on {} ({})", source, handle)
        }
        ChatEvent::SessionEnded { source, reason } => {
            info!("Live chat session on {} ended: {}", source, reason)
        }
    }
}

fn format_board(board: &[ScoreAggregate]) -> String {
    board
        .iter()
        .enumerate()
        .map(|(i, a)| {
            let badge = RANK_BADGES.get(i).copied().unwrap_or("🏅");
            format!("{} {}: {} points", badge, a.user, a.total)
        })
        .collect::<Vec<_>>()
        .join("  ")
}
