use crate::foundation::core::Fps;
use crate::foundation::error::{CaptionError, CaptionResult};
use crate::timing::word::WordTimestamp;

/// `true` for `MM:SS.mmm` (two-digit minutes and seconds, three-digit milliseconds).
pub fn is_valid_timecode(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 9
        && b[2] == b':'
        && b[5] == b'.'
        && [0usize, 1, 3, 4, 6, 7, 8]
            .iter()
            .all(|&i| b[i].is_ascii_digit())
}

/// Parse `MM:SS.mmm` into seconds.
pub fn parse_timecode(s: &str) -> CaptionResult<f64> {
    if !is_valid_timecode(s) {
        return Err(CaptionError::validation(format!(
            "invalid time '{s}', expected MM:SS.mmm"
        )));
    }
    let minutes: u32 = s[0..2]
        .parse()
        .map_err(|_| CaptionError::validation(format!("invalid minutes in '{s}'")))?;
    let seconds: u32 = s[3..5]
        .parse()
        .map_err(|_| CaptionError::validation(format!("invalid seconds in '{s}'")))?;
    let millis: u32 = s[6..9]
        .parse()
        .map_err(|_| CaptionError::validation(format!("invalid milliseconds in '{s}'")))?;
    if seconds >= 60 {
        return Err(CaptionError::validation(format!(
            "seconds must be < 60 in '{s}'"
        )));
    }
    Ok(f64::from(minutes) * 60.0 + f64::from(seconds) + f64::from(millis) / 1000.0)
}

/// Format seconds as `MM:SS.mmm` (minutes saturate at 99).
pub fn format_timecode(secs: f64) -> String {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    let minutes = (total_ms / 60_000).min(99);
    let seconds = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;
    format!("{minutes:02}:{seconds:02}.{millis:03}")
}

/// Latest word end, or `0.0` for an empty list.
pub fn words_end_sec(words: &[WordTimestamp]) -> f64 {
    words.iter().map(|w| w.end_sec).fold(0.0, f64::max)
}

/// Output frames needed to show every word plus `buffer_sec`, end frame inclusive.
///
/// Returns 1 for an empty list.
pub fn required_frames(words: &[WordTimestamp], output_fps: Fps, buffer_sec: f64) -> u64 {
    if words.is_empty() {
        return 1;
    }
    output_fps.secs_to_frames_floor(words_end_sec(words) + buffer_sec) + 1
}
