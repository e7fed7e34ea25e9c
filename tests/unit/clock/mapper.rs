use super::*;
use crate::timing::caption::MinDurationPolicy;
use crate::timing::word::WordTimestamp;

fn fps(n: u32) -> Fps {
    Fps::integer(n).unwrap()
}

fn caption(text: &str, start: f64, end: f64) -> Caption {
    Caption::from_words(
        vec![WordTimestamp::new(text, start, end)],
        &MinDurationPolicy::default(),
    )
}

#[test]
fn thirty_to_twelve_skips_by_three() {
    let window = RenderWindow::new(0, 9).unwrap();
    let m = FrameClockMapper::new(fps(30), fps(12), window, None, 0).unwrap();
    assert_eq!(m.skip_factor(), 3);
    let picked: Vec<_> = m.selected_frames().take(4).collect();
    assert_eq!(picked, vec![(0, 0), (3, 1), (6, 2), (9, 3)]);
    assert_eq!(m.output_index_for(4), None);
    assert_eq!(m.output_index_for(9), Some(3));
}

#[test]
fn output_indices_are_contiguous_from_zero() {
    let window = RenderWindow::new(5, 40).unwrap();
    let mut m = FrameClockMapper::new(fps(25), fps(12), window, Some(10_000), 0).unwrap();
    let mut outs = Vec::new();
    for src in m.start_source_index()..=m.end_source_index() {
        if let Some(state) = m.map(src, &[]) {
            outs.push(state.output_frame_index);
        }
    }
    assert!(!outs.is_empty());
    assert!(outs.len() as u64 <= window.len_frames());
    for (i, out) in outs.iter().enumerate() {
        assert_eq!(*out, i as u64);
    }
}

#[test]
fn window_start_offsets_source_selection() {
    let window = RenderWindow::new(12, 23).unwrap();
    let m = FrameClockMapper::new(fps(30), fps(12), window, None, 0).unwrap();
    // Output frame 12 at 12 fps is 1.0s, which is source frame 30.
    assert_eq!(m.start_source_index(), 30);
    assert_eq!(m.output_index_for(30), Some(0));
    assert_eq!(m.output_index_for(33), Some(1));
    assert_eq!(m.output_index_for(31), None);
}

#[test]
fn source_frame_count_clamps_end() {
    let window = RenderWindow::new(0, 1000).unwrap();
    let m = FrameClockMapper::new(fps(30), fps(12), window, Some(20), 0).unwrap();
    assert_eq!(m.end_source_index(), 19);
    assert!(m.is_past_end(20));
    assert_eq!(m.selected_frames().count(), 7);
}

#[test]
fn window_past_source_end_is_rejected() {
    let window = RenderWindow::new(100, 120).unwrap();
    assert!(FrameClockMapper::new(fps(30), fps(12), window, Some(10), 0).is_err());
}

#[test]
fn relative_index_resets_per_caption_and_keeps_counting() {
    let caps = vec![caption("a", 0.0, 0.5), caption("b", 0.5, 1.0)];
    let window = RenderWindow::new(0, 11).unwrap();
    let mut m = FrameClockMapper::new(fps(12), fps(12), window, None, caps.len()).unwrap();

    let states: Vec<_> = (0..12).filter_map(|i| m.map(i, &caps)).collect();
    assert_eq!(states.len(), 12);

    // 0.5s at 12 fps = frame 6.
    for s in &states[..6] {
        assert_eq!(s.active_caption, Some(0));
        assert_eq!(s.caption_relative_frame_index, s.output_frame_index);
        assert_eq!(s.caption_start_output_frame, Some(0));
    }
    for s in &states[6..12] {
        assert_eq!(s.active_caption, Some(1));
        assert_eq!(s.caption_start_output_frame, Some(6));
        assert_eq!(s.caption_relative_frame_index, s.output_frame_index - 6);
    }
}

#[test]
fn frames_outside_captions_have_no_relative_index() {
    let caps = vec![caption("late", 1.0, 2.0)];
    let window = RenderWindow::new(0, 5).unwrap();
    let mut m = FrameClockMapper::new(fps(12), fps(12), window, None, 1).unwrap();
    let s = m.map(0, &caps).unwrap();
    assert_eq!(s.active_caption, None);
    assert_eq!(s.caption_relative_frame_index, 0);
    assert_eq!(s.caption_start_output_frame, None);
}

#[test]
fn repeated_source_index_is_ignored() {
    let window = RenderWindow::new(0, 5).unwrap();
    let mut m = FrameClockMapper::new(fps(12), fps(12), window, None, 0).unwrap();
    assert!(m.map(1, &[]).is_some());
    assert!(m.map(1, &[]).is_none());
}

#[test]
fn activations_pin_first_sighting() {
    let mut a = CaptionActivations::new(2);
    assert_eq!(a.observe(1, 4), (4, 0));
    assert_eq!(a.observe(1, 9), (4, 5));
    assert_eq!(a.start_of(0), None);
    assert_eq!(a.start_of(1), Some(4));
}

#[test]
fn relative_index_follows_selected_frames_at_uneven_ratio() {
    // 25 -> 12 fps selects every third source frame, 0.12s apart.
    let caps = vec![caption("a", 0.0, 0.5), caption("b", 0.5, 1.0)];
    let window = RenderWindow::new(0, 11).unwrap();
    let mut m = FrameClockMapper::new(fps(25), fps(12), window, None, caps.len()).unwrap();
    assert_eq!(m.skip_factor(), 3);
    assert!((m.selection_step_sec() - 0.12).abs() < 1e-12);

    let states: Vec<_> = (0..=m.end_source_index())
        .filter_map(|i| m.map(i, &caps))
        .collect();
    assert_eq!(states.len(), 9);
    let active: Vec<_> = states.iter().map(|s| s.active_caption).collect();
    assert_eq!(
        active,
        vec![Some(0), Some(0), Some(0), Some(0), Some(0), Some(1), Some(1), Some(1), Some(1)]
    );
    // b first shows at output 5 (source 15, t = 0.6).
    assert_eq!(states[5].caption_start_output_frame, Some(5));
    let relative: Vec<_> = states
        .iter()
        .map(|s| s.caption_relative_frame_index)
        .collect();
    assert_eq!(relative, vec![0, 1, 2, 3, 4, 0, 1, 2, 3]);
}
