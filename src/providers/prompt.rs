// Companion prompt construction for the normal (non-crisis) chat path

use once_cell::sync::Lazy;
use regex::Regex;

use crate::conversation::{Message, SenderRole};

pub const COMPANION_SYSTEM_PROMPT: &str = "\
You are a supportive wellness companion inside a mental-health app. You offer \
empathetic, non-judgmental conversation and practical coping ideas. You are \
not a replacement for a licensed therapist.

Guidelines:
- Listen actively and reflect back what you understand.
- Ask one or two thoughtful follow-up questions at a time.
- Keep replies conversational, warm, and concise; avoid sounding clinical.
- When stress or anxiety comes up, gently explore its specific causes.
- Never give medical, legal, or financial advice.
- If the person seems to be in danger, urge them to call 988 or 911.";

/// Short, non-committal answers ("idk", "everything", "not sure")
static VAGUE_ANSWER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:everything|nothing|i don'?t know|idk|not sure|maybe|whatever|i guess|probably)\b",
    )
    .expect("vague-answer pattern is valid")
});

pub fn is_vague(input: &str) -> bool {
    VAGUE_ANSWER.is_match(input)
}

/// True when the user answers vaguely to the kind of question the companion
/// already asked in one of its last few replies
fn is_repeated_probe(history: &[Message], current: &str) -> bool {
    let current = current.to_lowercase();

    history
        .iter()
        .rev()
        .filter(|m| m.role == SenderRole::Bot)
        .take(3)
        .any(|m| {
            let reply = m.text.to_lowercase();
            (reply.contains("what") && reply.contains("causing") && current.contains("everything"))
                || (reply.contains("why") && reply.contains("feel") && current.contains("don't know"))
        })
}

/// Build the full provider prompt from recent history and the new message
pub fn build_prompt(history: &[Message], user_prompt: &str) -> String {
    let mut prompt = String::from(COMPANION_SYSTEM_PROMPT);

    if !history.is_empty() {
        prompt.push_str("\n\nConversation so far:\n");
        for message in history {
            let speaker = match message.role {
                SenderRole::User => "User",
                SenderRole::Bot => "Companion",
            };
            prompt.push_str(&format!("{}: {}\n", speaker, message.text));
        }
    }

    if is_vague(user_prompt) {
        if is_repeated_probe(history, user_prompt) {
            prompt.push_str(
                "\n\nNote: the user already answered a similar question vaguely. Do not ask it \
                again. Offer validation or explore a different part of their situation.",
            );
        } else {
            prompt.push_str(
                "\n\nNote: the user's answer is vague. Ask a gentle, more specific question \
                to help them open up, without repeating the previous one.",
            );
        }
    }

    prompt.push_str(&format!("\n\nUser: {}\nCompanion:", user_prompt));
    prompt
}
