use super::*;

fn style() -> TextStyle {
    TextStyle {
        size_px: 20.0,
        fill: Rgba8::WHITE,
        outline: Rgba8::BLACK,
        outline_width: 0,
    }
}

#[test]
fn block_face_measures_fixed_advance() {
    let r = TextRenderer::block();
    assert!(r.is_block());
    assert_eq!(r.measure("", 20.0), 0.0);
    assert_eq!(r.measure("abc", 20.0), 36.0);
    assert_eq!(r.measure("a c", 20.0), 36.0);
}

#[test]
fn line_height_includes_descender() {
    let r = TextRenderer::block();
    // cap 14 + descender 4
    assert_eq!(r.line_height(20.0), 18.0);
    assert_eq!(r.ink_height("AA", 20.0), 14.0);
    assert_eq!(r.ink_height("   ", 20.0), 0.0);
}

#[test]
fn wrap_is_greedy_and_keeps_long_words() {
    let r = TextRenderer::block();
    // 12px per char at 20px.
    let lines = r.wrap("aa bb cc dd", 20.0, 60.0);
    assert_eq!(lines, vec!["aa bb", "cc dd"]);
    let lines = r.wrap("abcdefghij x", 20.0, 60.0);
    assert_eq!(lines, vec!["abcdefghij", "x"]);
    assert!(r.wrap("   ", 20.0, 60.0).is_empty());
}

#[test]
fn baseline_anchor_puts_ink_above_y() {
    let r = TextRenderer::block();
    let mut f = FrameRGBA::new_transparent(100, 60);
    r.draw(
        &mut f,
        "HI",
        Point::new(50.0, 40.0),
        TextAnchor::MiddleBaseline,
        &style(),
    );
    let b = f.content_bounds().unwrap();
    assert_eq!(b.y1, 40.0);
    assert_eq!(b.y0, 26.0);
    // Two 12px advances centered on x=50: pen starts at 38.
    assert_eq!(b.x0, 39.0);
}

#[test]
fn middle_anchor_centers_line_box() {
    let r = TextRenderer::block();
    let mut f = FrameRGBA::new_transparent(100, 60);
    r.draw(
        &mut f,
        "H",
        Point::new(50.0, 30.0),
        TextAnchor::MiddleMiddle,
        &style(),
    );
    // ascent 16, descent 4: baseline sits 6px below the anchor.
    let b = f.content_bounds().unwrap();
    assert_eq!(b.y1, 36.0);
}

#[test]
fn outline_grows_ink_bounds() {
    let r = TextRenderer::block();
    let mut plain = FrameRGBA::new_transparent(100, 60);
    let mut outlined = FrameRGBA::new_transparent(100, 60);
    let at = Point::new(50.0, 40.0);
    r.draw(&mut plain, "H", at, TextAnchor::MiddleBaseline, &style());
    let s = TextStyle {
        outline_width: 2,
        ..style()
    };
    r.draw(&mut outlined, "H", at, TextAnchor::MiddleBaseline, &s);

    let p = plain.content_bounds().unwrap();
    let o = outlined.content_bounds().unwrap();
    assert_eq!(o.x0, p.x0 - 2.0);
    assert_eq!(o.y1, p.y1 + 2.0);
    // Fill stays on top of the stroke.
    assert_eq!(outlined.pixel(p.x0 as u32 + 1, p.y0 as u32 + 1), [255, 255, 255, 255]);
    assert_eq!(outlined.pixel(p.x0 as u32 - 1, p.y0 as u32 + 1), [0, 0, 0, 255]);
}

#[test]
fn block_bottom_sits_on_baseline_anchor() {
    let r = TextRenderer::block();
    let mut f = FrameRGBA::new_transparent(120, 100);
    r.draw_block(
        &mut f,
        "aa bb cc",
        Point::new(60.0, 90.0),
        TextAnchor::MiddleBaseline,
        &style(),
        60.0,
    );
    // Two lines of 18px plus 4px spacing hang 40px above the anchor; the first line's ink
    // starts below the ascender line (ascent 16, cap 14).
    let b = f.content_bounds().unwrap();
    assert_eq!(b.y0, 52.0);
    assert!(b.y1 <= 90.0);
}

#[test]
fn missing_font_falls_back_to_block() {
    let r = TextRenderer::load_or_block(Some(Path::new("/nonexistent/font.ttf")));
    assert!(r.is_block());
    assert!(TextRenderer::from_font_bytes(b"not a font").is_err());
}
