//! System prompts sent with each classifier call.

/// `{message}` is replaced with the chat line under review.
pub const MODERATION_PROMPT: &str = "You moderate a live stream chat for an adult audience. \
Swearing on its own is fine. Flag a message only when it is hostile or hateful towards the \
streamer or towards other people in chat. Reply with exactly one word: true if the message is \
hostile, false otherwise.\n\nMessage: {message}";

/// `{context}` is replaced with recent chat, `{question}` with the question being answered.
pub const ANSWER_PROMPT: &str = "You are the chat assistant on a live coding and trading stream. \
Answer viewers briefly and kindly, one or two sentences, emojis welcome. If you do not know, say \
so instead of guessing.\n\nRecent chat:\n{context}\n\nQuestion: {question}";

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierPrompts {
    pub moderation: String,
    pub answer: String,
}

impl Default for ClassifierPrompts {
    fn default() -> Self {
        Self {
            moderation: MODERATION_PROMPT.to_string(),
            answer: ANSWER_PROMPT.to_string(),
        }
    }
}

impl ClassifierPrompts {
    pub fn moderation_for(&self, message: &str) -> String {
        self.moderation.replace("{message}", message)
    }

    pub fn answer_for(&self, question: &str, context: &[String]) -> String {
        let context = if context.is_empty() {
            "(quiet so far)".to_string()
        } else {
            context.join("\n")
        };
        self.answer
            .replace("{context}", &context)
            .replace("{question}", question)
    }
}
