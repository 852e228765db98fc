use futures::stream::{self, Stream};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_millis(100);

/// Word-by-word reveal of a finished narrative.
///
/// Tokens are the text split on single spaces, each followed by one space, so
/// punctuation and line breaks stay attached to their word. Empty text yields
/// no tokens at all. The stream owns
/// the text and can be replayed from the first word any number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordStream {
    text: Arc<str>,
}

impl WordStream {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> impl Iterator<Item = String> + '_ {
        let words = (!self.text.is_empty()).then(|| self.text.split(' '));
        words.into_iter().flatten().map(|word| format!("{} ", word))
    }

    pub fn len(&self) -> usize {
        if self.text.is_empty() {
            0
        } else {
            self.text.split(' ').count()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Same tokens as [`WordStream::tokens`], each released after `delay`.
    pub fn paced(&self, delay: Duration) -> impl Stream<Item = String> + Send + 'static {
        let text = Arc::clone(&self.text);
        stream::unfold(0usize, move |offset| {
            let text = Arc::clone(&text);
            async move {
                if text.is_empty() || offset > text.len() {
                    return None;
                }
                let rest = &text[offset..];
                let (word, next) = match rest.find(' ') {
                    Some(i) => (&rest[..i], offset + i + 1),
                    None => (rest, text.len() + 1),
                };
                let token = format!("{} ", word);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Some((token, next))
            }
        })
    }
}
