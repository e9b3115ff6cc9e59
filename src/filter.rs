//! Keep/drop decision for a conversation.
//!
//! A conversation is only worth a note when it holds an actual exchange:
//! at least some extractable text, and a reply if a human asked something.
//! The decision is a pure function of the conversation record; the export
//! loop aggregates the reason counts for the end-of-run summary.

use crate::archive::{Conversation, Sender, extract_content};

/// Why a conversation was kept or dropped. Closed set so reporting and
/// tests can match exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterReason {
    Meaningful,
    NoMessages,
    EmptyContent,
    HumanOnlyNoReply,
}

impl FilterReason {
    /// Short human-readable form used in summaries and verbose output.
    pub fn describe(self) -> &'static str {
        match self {
            FilterReason::Meaningful => "meaningful",
            FilterReason::NoMessages => "no messages",
            FilterReason::EmptyContent => "empty content",
            FilterReason::HumanOnlyNoReply => "unanswered human message",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterDecision {
    pub keep: bool,
    pub reason: FilterReason,
}

impl FilterDecision {
    fn drop(reason: FilterReason) -> Self {
        FilterDecision {
            keep: false,
            reason,
        }
    }
}

/// Decide whether a conversation is meaningful. Predicates are checked in
/// order, first match wins:
///
/// 1. no messages at all
/// 2. every message extracts to whitespace or nothing
/// 3. a human message has content but no assistant message does — a
///    one-sided exchange with no reply is not useful as a note
pub fn evaluate(conversation: &Conversation) -> FilterDecision {
    if conversation.chat_messages.is_empty() {
        return FilterDecision::drop(FilterReason::NoMessages);
    }

    let mut any_content = false;
    let mut human_has_content = false;
    let mut assistant_has_content = false;
    for message in &conversation.chat_messages {
        let content = extract_content(message);
        if content.trim().is_empty() {
            continue;
        }
        any_content = true;
        match message.sender {
            Sender::Human => human_has_content = true,
            Sender::Assistant => assistant_has_content = true,
            Sender::Unknown => {}
        }
    }

    if !any_content {
        return FilterDecision::drop(FilterReason::EmptyContent);
    }
    if human_has_content && !assistant_has_content {
        return FilterDecision::drop(FilterReason::HumanOnlyNoReply);
    }

    FilterDecision {
        keep: true,
        reason: FilterReason::Meaningful,
    }
}
