use crate::timing::word::WordTimestamp;

/// Minimum on-screen duration rule: `max(floor_sec, per_word_sec * word_count)`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MinDurationPolicy {
    /// Absolute floor in seconds.
    pub floor_sec: f64,
    /// Reading time budget per word in seconds.
    pub per_word_sec: f64,
}

impl Default for MinDurationPolicy {
    fn default() -> Self {
        Self {
            floor_sec: 2.0,
            per_word_sec: 0.3,
        }
    }
}

impl MinDurationPolicy {
    /// Required on-screen seconds for a caption of `word_count` words.
    pub fn required_for(&self, word_count: usize) -> f64 {
        self.floor_sec.max(self.per_word_sec * word_count as f64)
    }
}

/// A contiguous run of words displayed together.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Caption {
    /// Words joined by single spaces.
    pub text: String,
    /// First word start.
    pub start_sec: f64,
    /// Last word end.
    pub end_sec: f64,
    /// Source words in order.
    pub words: Vec<WordTimestamp>,
    /// `end_sec - start_sec`.
    pub natural_duration_sec: f64,
    /// Legibility floor derived from the word count.
    pub required_min_duration_sec: f64,
    /// `max(0, required - natural)`.
    pub padding_needed_sec: f64,
    /// Set once the padding has been added to an emitted frame.
    pub padding_applied: bool,
}

impl Caption {
    /// Build a caption from an accumulated word run. `words` must be non-empty.
    pub(crate) fn from_words(words: Vec<WordTimestamp>, policy: &MinDurationPolicy) -> Self {
        let text = words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let start_sec = words.first().map_or(0.0, |w| w.start_sec);
        let end_sec = words.last().map_or(start_sec, |w| w.end_sec);
        let mut caption = Self {
            text,
            start_sec,
            end_sec,
            words,
            natural_duration_sec: 0.0,
            required_min_duration_sec: 0.0,
            padding_needed_sec: 0.0,
            padding_applied: false,
        };
        caption.apply_policy(policy);
        caption
    }

    /// Recompute the duration fields under `policy` and clear `padding_applied`.
    pub fn apply_policy(&mut self, policy: &MinDurationPolicy) {
        self.natural_duration_sec = self.end_sec - self.start_sec;
        self.required_min_duration_sec = policy.required_for(self.words.len());
        self.padding_needed_sec = (self.required_min_duration_sec - self.natural_duration_sec).max(0.0);
        self.padding_applied = false;
    }

    /// `true` when `t` falls in `[start_sec, end_sec)`.
    pub fn contains(&self, t: f64) -> bool {
        self.start_sec <= t && t < self.end_sec
    }

    /// Number of characters (not bytes) in the caption text.
    pub fn text_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Index of the first caption whose span contains `t`.
pub fn active_caption_at(captions: &[Caption], t: f64) -> Option<usize> {
    captions.iter().position(|c| c.contains(t))
}
