//! Word timestamps, caption grouping and timecode helpers.

/// Caption type and minimum-duration policy.
pub mod caption;
/// Word -> caption grouping.
pub mod group;
/// `MM:SS.mmm` parsing and frame budgeting.
pub mod timecode;
/// Word timestamps and per-word overrides.
pub mod word;

pub use caption::{Caption, MinDurationPolicy, active_caption_at};
pub use group::{CloseReason, Grouper, GroupingLimits, group, is_sentence_end};
pub use word::{WordEffectOverride, WordTimestamp};
