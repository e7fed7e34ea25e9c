use crate::timing::caption::{Caption, MinDurationPolicy};
use crate::timing::word::WordTimestamp;

/// Tuning for [`Grouper`].
///
/// `max_chars` and `max_duration_sec` are soft limits: a caption only closes on them once the
/// accumulated run exceeds them by the matching overflow factor. These are escape valves for
/// transcripts without punctuation.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GroupingLimits {
    /// Nominal caption length in characters.
    pub max_chars: usize,
    /// Nominal caption duration in seconds.
    pub max_duration_sec: f64,
    /// Emergency close once length exceeds `max_chars * char_overflow_factor`.
    pub char_overflow_factor: f64,
    /// Emergency close once duration exceeds `max_duration_sec * duration_overflow_factor`.
    pub duration_overflow_factor: f64,
    /// A sentence boundary only closes a caption at least this long.
    pub min_sentence_duration_sec: f64,
}

impl Default for GroupingLimits {
    fn default() -> Self {
        Self {
            max_chars: 80,
            max_duration_sec: 5.0,
            char_overflow_factor: 5.0,
            duration_overflow_factor: 4.0,
            min_sentence_duration_sec: 0.5,
        }
    }
}

impl GroupingLimits {
    fn char_limit(&self) -> f64 {
        self.max_chars as f64 * self.char_overflow_factor
    }

    fn duration_limit(&self) -> f64 {
        self.max_duration_sec * self.duration_overflow_factor
    }
}

/// Why a caption was closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseReason {
    /// Last word of the input.
    EndOfInput,
    /// Sentence-final punctuation after the minimum sentence duration.
    SentenceBoundary,
    /// Character or duration overflow.
    Emergency,
}

/// Linear word -> caption grouper.
#[derive(Clone, Debug, Default)]
pub struct Grouper {
    limits: GroupingLimits,
    policy: MinDurationPolicy,
}

impl Grouper {
    /// Grouper with explicit limits and the default minimum-duration policy.
    pub fn new(limits: GroupingLimits) -> Self {
        Self {
            limits,
            policy: MinDurationPolicy::default(),
        }
    }

    /// Replace the minimum-duration policy stamped onto emitted captions.
    pub fn with_policy(mut self, policy: MinDurationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Active limits.
    pub fn limits(&self) -> &GroupingLimits {
        &self.limits
    }

    /// Group `words` into captions in one pass.
    ///
    /// Blank words are dropped. The last non-blank word always closes the final caption.
    pub fn group(&self, words: &[WordTimestamp]) -> Vec<Caption> {
        let kept: Vec<&WordTimestamp> = words
            .iter()
            .filter(|w| {
                let keep = !w.text.trim().is_empty();
                if !keep {
                    tracing::debug!(start = w.start_sec, "skipping blank word");
                }
                keep
            })
            .collect();

        let mut captions = Vec::new();
        let mut buf: Vec<WordTimestamp> = Vec::new();
        let mut text_len = 0usize;

        for (i, word) in kept.iter().enumerate() {
            if !buf.is_empty() {
                text_len += 1;
            }
            text_len += word.text.chars().count();
            buf.push((*word).clone());

            let is_last = i + 1 == kept.len();
            if let Some(reason) = self.close_reason(&buf, text_len, is_last) {
                let caption = Caption::from_words(std::mem::take(&mut buf), &self.policy);
                tracing::debug!(
                    ?reason,
                    start = caption.start_sec,
                    end = caption.end_sec,
                    words = caption.words.len(),
                    "caption grouped"
                );
                captions.push(caption);
                text_len = 0;
            }
        }

        captions
    }

    fn close_reason(
        &self,
        buf: &[WordTimestamp],
        text_len: usize,
        is_last: bool,
    ) -> Option<CloseReason> {
        if is_last {
            return Some(CloseReason::EndOfInput);
        }
        let (Some(first), Some(last)) = (buf.first(), buf.last()) else {
            return None;
        };
        let duration = last.end_sec - first.start_sec;

        if is_sentence_end(&last.text) && duration >= self.limits.min_sentence_duration_sec {
            return Some(CloseReason::SentenceBoundary);
        }
        if text_len as f64 > self.limits.char_limit() || duration > self.limits.duration_limit() {
            return Some(CloseReason::Emergency);
        }
        None
    }
}

/// Group with default limits.
pub fn group(words: &[WordTimestamp]) -> Vec<Caption> {
    Grouper::default().group(words)
}

/// `true` when `word` ends in `.`, `!` or `?` (trailing whitespace ignored).
pub fn is_sentence_end(word: &str) -> bool {
    word.trim_end().ends_with(['.', '!', '?'])
}

#[cfg(test)]
#[path = "../../tests/unit/timing/group.rs"]
mod tests;
