// File: chatwarden-common/src/models/verdict.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModerationReason {
    Negative,
}

/// How a plain pass-through message is credited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassKind {
    /// Meaningful chat, worth one point.
    Meaningful,
    /// Too short or a near-repeat of recent chat; logged with zero.
    Filler,
    /// Classification could not complete; shown, never logged.
    Unclassified,
}

/// The single outcome of classifying one chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Verdict {
    CredentialLeak,
    NoveltyReward {
        quote: String,
        emoji_set: Vec<String>,
        /// False once the user is past the daily cap; the reply is still sent.
        credited: bool,
    },
    Moderated {
        reason: ModerationReason,
    },
    Answer {
        text: String,
    },
    PassThrough {
        kind: PassKind,
    },
    Suppressed,
}

impl Verdict {
    /// Ledger score for this verdict, or `None` when nothing should be written.
    pub fn score(&self, points_per_reward: f64) -> Option<f64> {
        match self {
            Verdict::NoveltyReward { credited: true, .. } => Some(points_per_reward),
            Verdict::NoveltyReward { credited: false, .. } => None,
            Verdict::Moderated { .. } => Some(-1.0),
            Verdict::PassThrough { kind: PassKind::Meaningful } => Some(1.0),
            Verdict::PassThrough { kind: PassKind::Filler } => Some(0.0),
            Verdict::PassThrough { kind: PassKind::Unclassified } => None,
            Verdict::CredentialLeak | Verdict::Answer { .. } | Verdict::Suppressed => None,
        }
    }

    /// Whether the original message text may be shown to viewers.
    pub fn shows_original(&self) -> bool {
        !matches!(self, Verdict::Moderated { .. } | Verdict::Suppressed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::CredentialLeak => "credential_leak",
            Verdict::NoveltyReward { .. } => "novelty_reward",
            Verdict::Moderated { .. } => "moderated",
            Verdict::Answer { .. } => "answer",
            Verdict::PassThrough { .. } => "pass_through",
            Verdict::Suppressed => "suppressed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_follow_verdict_kind() {
        let reward = Verdict::NoveltyReward { quote: "q".into(), emoji_set: vec![], credited: true };
        let capped = Verdict::NoveltyReward { quote: "q".into(), emoji_set: vec![], credited: false };
        assert_eq!(reward.score(0.5), Some(0.5));
        assert_eq!(capped.score(0.5), None);
        assert_eq!(Verdict::Moderated { reason: ModerationReason::Negative }.score(0.5), Some(-1.0));
        assert_eq!(Verdict::PassThrough { kind: PassKind::Meaningful }.score(0.5), Some(1.0));
        assert_eq!(Verdict::PassThrough { kind: PassKind::Filler }.score(0.5), Some(0.0));
        assert_eq!(Verdict::PassThrough { kind: PassKind::Unclassified }.score(0.5), None);
        assert_eq!(Verdict::Suppressed.score(0.5), None);
        assert_eq!(Verdict::CredentialLeak.score(0.5), None);
    }

    #[test]
    fn moderated_and_suppressed_hide_original() {
        assert!(!Verdict::Moderated { reason: ModerationReason::Negative }.shows_original());
        assert!(!Verdict::Suppressed.shows_original());
        assert!(Verdict::Answer { text: "hi".into() }.shows_original());
    }
}
