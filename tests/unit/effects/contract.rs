use super::test_support::{caption_params, layer};
use super::*;

#[test]
fn builtin_registry_lists_every_effect_with_defaults() {
    let reg = EffectRegistry::builtin();
    let listed: Vec<(&str, u8)> = reg
        .descriptors()
        .iter()
        .map(|d| (d.slug, d.default_intensity))
        .collect();
    assert_eq!(
        listed,
        vec![
            ("bounce", 60),
            ("brush-stroke", 75),
            ("fade", 50),
            ("glitch", 50),
            ("glow", 70),
            ("neon", 80),
            ("rainbow", 80),
            ("shake", 50),
            ("slam", 75),
            ("sparkle", 65),
            ("typewriter", 70),
            ("vhs-crt", 60),
            ("wave", 60),
        ]
    );
}

#[test]
fn only_vhs_is_full_frame_and_glow_and_neon_are_word_level() {
    for d in EffectRegistry::builtin().descriptors() {
        assert_eq!(d.scope == EffectScope::FullFrame, d.slug == "vhs-crt", "{}", d.slug);
        assert_eq!(d.word_level, matches!(d.slug, "glow" | "neon"), "{}", d.slug);
    }
}

#[test]
fn slugs_are_normalized_on_lookup() {
    let reg = EffectRegistry::builtin();
    assert_eq!(reg.create(" Glow ").unwrap().slug(), "glow");
    assert_eq!(reg.create("VHS_CRT").unwrap().slug(), "vhs-crt");
    assert_eq!(reg.create("vhs").unwrap().slug(), "vhs-crt");
    assert_eq!(reg.create("Brush_Stroke").unwrap().slug(), "brush-stroke");
    assert!(reg.contains("fade"));
    let err = reg.create("confetti").err().unwrap();
    assert!(err.to_string().starts_with("config error:"));
}

#[test]
fn instantiate_splits_by_scope_in_order_and_drops_disabled() {
    let reg = EffectRegistry::builtin();
    let configs = vec![
        EffectConfig::new("vhs-crt"),
        EffectConfig::new("wave").with_intensity(10),
        EffectConfig {
            enabled: false,
            ..EffectConfig::new("slam")
        },
        EffectConfig::new("glow"),
    ];
    let set = reg.instantiate(&configs).unwrap();
    let text: Vec<_> = set
        .text
        .iter()
        .map(|e| (e.effect.slug(), e.intensity))
        .collect();
    assert_eq!(text, vec![("wave", 10), ("glow", 70)]);
    assert_eq!(set.full_frame.len(), 1);
    assert_eq!(set.full_frame[0].intensity, 60);
    assert_eq!(set.word_level_index(), Some(1));
}

#[test]
fn first_enabled_word_level_effect_wins() {
    let reg = EffectRegistry::builtin();
    let set = reg
        .instantiate(&[
            EffectConfig::new("wave"),
            EffectConfig::new("neon"),
            EffectConfig::new("glow"),
        ])
        .unwrap();
    assert_eq!(set.word_level_index(), Some(1));

    let set = reg
        .instantiate(&[
            EffectConfig::new("neon").with_intensity(0),
            EffectConfig::new("glow"),
        ])
        .unwrap();
    assert_eq!(set.word_level_index(), Some(1));
    assert_eq!(set.text[1].effect.slug(), "glow");
}

#[test]
fn intensity_above_100_is_rejected() {
    let reg = EffectRegistry::builtin();
    let err = reg
        .instantiate(&[EffectConfig::new("fade").with_intensity(101)])
        .unwrap_err();
    assert!(matches!(err, CaptionError::Config(_)));
}

#[test]
fn config_json_defaults() {
    let cfg: EffectConfig = serde_json::from_str(r#"{"effect": "glow"}"#).unwrap();
    assert_eq!(cfg, EffectConfig::new("glow"));
    let cfg: EffectConfig =
        serde_json::from_str(r#"{"effect": "fade", "intensity": 0, "enabled": false}"#).unwrap();
    assert_eq!(cfg.intensity, Some(0));
    assert!(!cfg.enabled);
}

#[test]
fn every_text_effect_errors_before_prepare() {
    let reg = EffectRegistry::builtin();
    for d in reg.descriptors() {
        let e = reg.create(d.slug).unwrap();
        let res = e.transform(&layer(), &caption_params("HI", 0, 50));
        assert!(
            matches!(res, Err(CaptionError::Effect(_))),
            "{} transformed without prepare",
            d.slug
        );
    }
}

#[test]
fn prepare_is_idempotent() {
    let reg = EffectRegistry::builtin();
    let prep = PrepareParams {
        fps: 12.0,
        duration_sec: 1.5,
        text: "SAME TEXT",
        intensity: 65,
    };
    for d in reg.descriptors() {
        let mut a = reg.create(d.slug).unwrap();
        let mut b = reg.create(d.slug).unwrap();
        a.prepare(&prep).unwrap();
        b.prepare(&prep).unwrap();
        b.prepare(&prep).unwrap();
        for f in [0, 3, 9] {
            let p = caption_params("SAME TEXT", f, 65);
            assert_eq!(
                a.transform(&layer(), &p).unwrap(),
                b.transform(&layer(), &p).unwrap(),
                "{} frame {f}",
                d.slug
            );
        }
    }
}

#[test]
fn zero_intensity_text_effects_pass_the_layer_through() {
    let reg = EffectRegistry::builtin();
    let mut input = layer();
    input.put_pixel(10, 10, [200, 200, 200, 255]);
    for d in reg.descriptors() {
        if d.scope != EffectScope::Text {
            continue;
        }
        let mut e = reg.create(d.slug).unwrap();
        e.prepare(&PrepareParams {
            fps: 12.0,
            duration_sec: 2.0,
            text: "PLAIN",
            intensity: 0,
        })
        .unwrap();
        let p = caption_params("PLAIN", 1, 0);
        assert_eq!(e.transform(&input, &p).unwrap(), input, "{}", d.slug);
        let empty = caption_params("", 1, 60);
        assert_eq!(e.transform(&input, &empty).unwrap(), input, "{}", d.slug);
    }
}
