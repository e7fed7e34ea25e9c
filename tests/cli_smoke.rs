use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_captionfx")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "captionfx.exe"
            } else {
                "captionfx"
            });
            p
        })
}

fn run(args: &[&str]) -> Output {
    Command::new(exe()).args(args).output().unwrap()
}

fn fixture_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("cli_smoke").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_words(dir: &Path) -> PathBuf {
    let path = dir.join("words.json");
    std::fs::write(
        &path,
        r#"[
            {"word": "Hi", "start": 0.0, "end": 0.4},
            {"word": "there.", "start": 0.4, "end": 0.9},
            {"word": "Bye", "start": 1.2, "end": 1.5}
        ]"#,
    )
    .unwrap();
    path
}

#[test]
fn cli_captions_prints_grouped_json() {
    let dir = fixture_dir("captions");
    let words = write_words(&dir);
    let out = run(&["captions", "--words", words.to_str().unwrap()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let captions: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let captions = captions.as_array().unwrap();
    assert_eq!(captions.len(), 2);
    assert_eq!(captions[0]["text"], "Hi there.");
    assert_eq!(captions[0]["start_sec"], 0.0);
    assert_eq!(captions[0]["end_sec"], 0.9);
    assert_eq!(captions[1]["text"], "Bye");
}

#[test]
fn cli_effects_lists_builtins() {
    let out = run(&["effects", "--json"]);
    assert!(out.status.success());
    let list: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let slugs: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["slug"].as_str().unwrap())
        .collect();
    assert!(slugs.contains(&"glow"));
    assert!(slugs.contains(&"vhs-crt"));
    assert_eq!(slugs.len(), 13);
}

#[test]
fn cli_render_still_to_gif() {
    let dir = fixture_dir("render_gif");
    let words = write_words(&dir);
    let bg = dir.join("bg.png");
    image::RgbaImage::from_pixel(96, 64, image::Rgba([30, 30, 60, 255]))
        .save(&bg)
        .unwrap();
    let job = dir.join("job.json");
    std::fs::write(
        &job,
        r#"{"output_fps": 10, "typography": {"font_size_px": 14},
            "effects": {"fade": {"intensity": 40}, "vhs-crt": {"enabled": false}}}"#,
    )
    .unwrap();
    let out_path = dir.join("out.gif");
    let _ = std::fs::remove_file(&out_path);

    let out = run(&[
        "render",
        "--video",
        bg.to_str().unwrap(),
        "--words",
        words.to_str().unwrap(),
        "--config",
        job.to_str().unwrap(),
        "--out",
        out_path.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stderr).contains("wrote"));

    let decoded = image::open(&out_path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (96, 64));
}

#[test]
fn cli_reports_missing_words_file() {
    let out = run(&["captions", "--words", "target/cli_smoke/does-not-exist.json"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("does-not-exist.json"), "{stderr}");
}

#[test]
fn cli_rejects_bad_timecode() {
    let dir = fixture_dir("bad_timecode");
    let words = write_words(&dir);
    let out = run(&[
        "render",
        "--video",
        "unused.png",
        "--words",
        words.to_str().unwrap(),
        "--out",
        "target/cli_smoke/never.gif",
        "--start-time",
        "1:2",
    ]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("MM:SS.mmm"));
}
