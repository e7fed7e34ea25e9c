use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use captionfx::{
    EffectRegistry, FfmpegSink, FfmpegSinkOpts, FfmpegSource, FrameSink, FrameSource, GifSink,
    GifSinkOpts, RenderDriver, RenderJob, RenderMode, StillSource, WindowRequest,
};

#[derive(Parser, Debug)]
#[command(name = "captionfx", version, about = "Animated word-timed captions for video")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Group word timestamps into captions and print them as JSON.
    Captions(CaptionsArgs),
    /// List the registered effects.
    Effects(EffectsArgs),
    /// Render a scrubbable MP4 preview from frame 0 (requires `ffmpeg` on PATH).
    Preview(PreviewArgs),
    /// Render the final output: GIF, or MP4 when `--out` ends in `.mp4`.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct CaptionsArgs {
    /// Word timestamps JSON.
    #[arg(long)]
    words: PathBuf,

    /// Render job JSON supplying grouping limits.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Nominal caption length in characters.
    #[arg(long)]
    max_chars: Option<usize>,

    /// Nominal caption duration in seconds.
    #[arg(long)]
    max_duration: Option<f64>,
}

#[derive(Parser, Debug)]
struct EffectsArgs {
    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct InputArgs {
    /// Source video, or a still image shown for the captions' duration.
    #[arg(long)]
    video: PathBuf,

    /// Word timestamps JSON.
    #[arg(long)]
    words: PathBuf,

    /// Output path.
    #[arg(long)]
    out: PathBuf,

    /// Render job JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    #[command(flatten)]
    input: InputArgs,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    input: InputArgs,

    /// First output frame.
    #[arg(long, conflicts_with = "start_time")]
    start_frame: Option<u64>,

    /// Last output frame (inclusive).
    #[arg(long, conflicts_with = "end_time")]
    end_frame: Option<u64>,

    /// Start as `MM:SS.mmm`.
    #[arg(long)]
    start_time: Option<String>,

    /// End as `MM:SS.mmm`.
    #[arg(long)]
    end_time: Option<String>,

    /// Play the GIF once instead of looping.
    #[arg(long)]
    no_loop: bool,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Captions(args) => cmd_captions(args),
        Command::Effects(args) => cmd_effects(args),
        Command::Preview(args) => cmd_preview(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_job(path: Option<&Path>) -> anyhow::Result<RenderJob> {
    match path {
        Some(p) => RenderJob::load(p).with_context(|| format!("load render job '{}'", p.display())),
        None => Ok(RenderJob::default()),
    }
}

fn cmd_captions(args: CaptionsArgs) -> anyhow::Result<()> {
    let mut job = load_job(args.config.as_deref())?;
    if let Some(n) = args.max_chars {
        job.grouping.max_chars = n;
    }
    if let Some(s) = args.max_duration {
        job.grouping.max_duration_sec = s;
    }
    job.validate()?;

    let words = captionfx::load_words(&args.words)
        .with_context(|| format!("load words '{}'", args.words.display()))?;
    let captions = job.grouper().group(&words);
    println!("{}", serde_json::to_string_pretty(&captions)?);
    Ok(())
}

fn cmd_effects(args: EffectsArgs) -> anyhow::Result<()> {
    let descriptors = EffectRegistry::builtin().descriptors();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&descriptors)?);
        return Ok(());
    }
    println!(
        "{:<12} {:<12} {:>9}  {:<10} word-level",
        "slug", "name", "intensity", "scope"
    );
    for d in descriptors {
        let scope = serde_json::to_value(d.scope)?;
        println!(
            "{:<12} {:<12} {:>9}  {:<10} {}",
            d.slug,
            d.display_name,
            d.default_intensity,
            scope.as_str().unwrap_or_default(),
            if d.word_level { "yes" } else { "no" }
        );
    }
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let job = load_job(args.input.config.as_deref())?;
    run(&args.input, &job, RenderMode::Preview, true)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut job = load_job(args.input.config.as_deref())?;
    let fps = job.fps()?;
    let start = match (&args.start_time, args.start_frame) {
        (Some(t), _) => Some(fps.secs_to_frames_floor(captionfx::parse_timecode(t)?)),
        (None, frame) => frame,
    };
    let end = match (&args.end_time, args.end_frame) {
        (Some(t), _) => Some(fps.secs_to_frames_floor(captionfx::parse_timecode(t)?)),
        (None, frame) => frame,
    };
    if start.is_some() || end.is_some() {
        job.window = WindowRequest {
            start_output_frame: start.unwrap_or(job.window.start_output_frame),
            end_output_frame: end.or(job.window.end_output_frame),
        };
    }
    if args.no_loop {
        job.loop_forever = false;
    }
    job.validate()?;
    let mp4 = has_extension(&args.input.out, "mp4");
    run(&args.input, &job, RenderMode::Final, mp4)
}

fn run(input: &InputArgs, job: &RenderJob, mode: RenderMode, mp4: bool) -> anyhow::Result<()> {
    let words = captionfx::load_words(&input.words)
        .with_context(|| format!("load words '{}'", input.words.display()))?;
    let captions = job.grouper().group(&words);

    let registry = EffectRegistry::builtin();
    let renderer = job.typography.renderer();
    let mut settings = job.settings(mode, &registry)?;
    settings.even_dimensions = mp4;
    let mut source = open_source(&input.video, job, &words)?;

    let mut sink: Box<dyn FrameSink> = if mp4 {
        let mut opts = FfmpegSinkOpts::new(&input.out);
        opts.background = job.background;
        Box::new(FfmpegSink::new(opts))
    } else {
        let mut opts = GifSinkOpts::new(&input.out);
        opts.loop_forever = job.loop_forever;
        opts.background = job.background;
        Box::new(GifSink::new(opts))
    };

    let driver = RenderDriver::new(&registry, &renderer, settings);
    let report = driver
        .render(source.as_mut(), captions, sink.as_mut())
        .with_context(|| format!("render '{}'", input.out.display()))?;
    if report.stopped_early {
        eprintln!("warning: source ended early after {} frames", report.frames);
    }
    eprintln!("wrote {}", input.out.display());
    Ok(())
}

fn open_source(
    path: &Path,
    job: &RenderJob,
    words: &[captionfx::WordTimestamp],
) -> anyhow::Result<Box<dyn FrameSource>> {
    if captionfx::render::is_still_image(path) {
        let fps = job.fps()?;
        let duration = captionfx::timing::timecode::words_end_sec(words)
            + job.window_policy.open_end_buffer_sec;
        return Ok(Box::new(StillSource::open(path, fps, duration)?));
    }
    let source = FfmpegSource::open(path)
        .with_context(|| format!("open source video '{}'", path.display()))?;
    Ok(Box::new(source))
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}
