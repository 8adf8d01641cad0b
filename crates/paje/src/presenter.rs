//! Replays a finished answer one word at a time so the interface can animate typing.
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Pause between words in the default pacing
pub const DEFAULT_WORD_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingEvent {
    /// All words emitted so far, joined by single spaces
    pub content: String,
    pub is_complete: bool,
    pub timestamp: DateTime<Utc>,
}

impl TypingEvent {
    fn new(content: String, is_complete: bool) -> Self {
        Self {
            content,
            is_complete,
            timestamp: Utc::now(),
        }
    }
}

/// One event per word with the cumulative text; only the last one is complete.
///
/// Text without words still produces a single, empty, completed event.
pub fn typing_events(text: &str) -> Vec<TypingEvent> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return vec![TypingEvent::new(String::new(), true)];
    }

    let mut content = String::new();
    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            if i > 0 {
                content.push(' ');
            }
            content.push_str(word);
            TypingEvent::new(content.clone(), i == words.len() - 1)
        })
        .collect()
}

/// The events of [`typing_events`], paced by `delay` between consecutive words
pub fn typing_stream(text: &str, delay: Duration) -> BoxStream<'static, TypingEvent> {
    let events = typing_events(text);
    Box::pin(async_stream::stream! {
        for (i, mut event) in events.into_iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            event.timestamp = Utc::now();
            yield event;
        }
    })
}
