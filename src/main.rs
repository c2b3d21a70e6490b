use clap::Parser;
use std::error::Error;
use std::iter;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};
use tile_core::{
    CatalogSource, CellView, FeedbackSink, Generator, GeneratorConfig, JsonCatalog,
    PossibilitySpace, RunRecorder, SchedulerState, StdRandom, StepOutcome, TileRng,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Fill a grid with edge-matching tiles from a JSON catalog.
#[derive(Debug, Parser)]
#[command(name = "tile_collapse", version)]
struct Args {
    /// Catalog of edge types and tiles.
    #[arg(long)]
    catalog: PathBuf,

    #[arg(long, default_value_t = 16)]
    width: usize,

    #[arg(long, default_value_t = 12)]
    height: usize,

    /// Overrides the seed from the config file.
    #[arg(long)]
    seed: Option<u64>,

    /// Generator config (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Milliseconds between collapse steps. 0 runs without pausing.
    #[arg(long = "tick-ms")]
    tick_ms: Option<u64>,

    /// Runs to try before giving up. Retry seeds are drawn from the first seed.
    #[arg(long, default_value_t = 1)]
    attempts: u32,

    /// Save the last attempt's frames as JSON, whatever its outcome.
    #[arg(long)]
    record: Option<PathBuf>,

    /// Redraw the grid after every step.
    #[arg(long)]
    watch: bool,

    /// Only log warnings and errors.
    #[arg(long)]
    quiet: bool,
}

/// Draws the grid as text, north row first.
struct TerminalRenderer {
    width: usize,
    height: usize,
    glyphs: Vec<char>,
    watch: bool,
}

impl TerminalRenderer {
    fn new(width: usize, height: usize, space: &PossibilitySpace, watch: bool) -> Self {
        let glyphs = space
            .iter()
            .map(|(_, p)| p.name.chars().next().unwrap_or('?'))
            .collect();
        Self {
            width,
            height,
            glyphs,
            watch,
        }
    }

    fn glyph(&self, view: &CellView) -> char {
        if view.failed {
            return '!';
        }
        match (view.resolved, view.entropy) {
            (Some(id), _) => self.glyphs.get(id.0).copied().unwrap_or('?'),
            (None, 0) => '!',
            (None, n) if n < 10 => char::from_digit(n as u32, 10).unwrap_or('+'),
            (None, _) => '.',
        }
    }

    fn draw(&self, cells: &[CellView]) {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                out.push(cells.get(x + y * self.width).map_or(' ', |v| self.glyph(v)));
            }
            out.push('\n');
        }
        println!("{}", out);
    }
}

/// Fans each step out to the renderer and the optional recorder.
struct HostSink {
    renderer: TerminalRenderer,
    recorder: Option<RunRecorder>,
}

impl FeedbackSink for HostSink {
    fn on_step(&mut self, step: usize, outcome: &StepOutcome, cells: &[CellView]) {
        debug!("step {}: {:?}", step, outcome);
        if self.renderer.watch || outcome.is_terminal() {
            self.renderer.draw(cells);
        }
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.on_step(step, outcome, cells);
        }
    }
}

fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Drive the generator on its tick cadence until the run ends.
fn drive(generator: &mut Generator, sink: &mut HostSink) -> Result<StepOutcome, Box<dyn Error>> {
    let interval = generator.config().tick_interval();
    if interval.is_zero() {
        return Ok(generator.run_to_completion(sink)?);
    }

    let mut last_frame = Instant::now();
    let mut outcome = None;
    while generator.is_running() {
        thread::sleep(interval);
        let now = Instant::now();
        if let Some(o) = generator.tick(now - last_frame, sink)? {
            outcome = Some(o);
        }
        last_frame = now;
    }
    Ok(outcome.unwrap_or(StepOutcome::Stopped))
}

/// The configured seed, then retry seeds drawn from a generator seeded with it.
fn attempt_seeds(base_seed: u64) -> impl Iterator<Item = u64> {
    let mut retries = StdRandom::from_seed(base_seed);
    iter::once(base_seed).chain(iter::repeat_with(move || retries.next_u64()))
}

fn run(args: Args) -> Result<bool, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(ms) = args.tick_ms {
        config.tick_interval_ms = ms;
    }

    let catalog = JsonCatalog::new(&args.catalog).load_catalog()?;
    let base_seed = config.seed;
    let mut generator = Generator::new(config);
    let mut last_recorder = None;
    let mut resolved = false;

    let attempts = args.attempts.max(1) as usize;
    for (attempt, seed) in attempt_seeds(base_seed).take(attempts).enumerate() {
        generator.set_seed(seed);
        generator.start(args.width, args.height, &catalog)?;

        let space = generator
            .grid()
            .map(|g| g.space())
            .ok_or("generator has no grid after start")?;
        let mut sink = HostSink {
            renderer: TerminalRenderer::new(args.width, args.height, space, args.watch),
            recorder: args
                .record
                .as_ref()
                .map(|_| RunRecorder::new(args.width, args.height, seed)),
        };

        let started = Instant::now();
        let outcome = drive(&mut generator, &mut sink)?;
        let elapsed: Duration = started.elapsed();
        last_recorder = sink.recorder;

        match outcome {
            StepOutcome::Resolved => {
                info!(
                    "Attempt {} (seed {}) resolved in {} steps, {:.1?}",
                    attempt + 1,
                    seed,
                    generator.steps(),
                    elapsed
                );
                resolved = true;
                break;
            }
            StepOutcome::Contradicted { position } => {
                warn!(
                    "Attempt {} (seed {}) contradicted at {}",
                    attempt + 1,
                    seed,
                    position
                );
            }
            other => {
                warn!("Attempt {} ended with {:?}", attempt + 1, other);
                if generator.state() == Some(SchedulerState::Stopped) {
                    break;
                }
            }
        }
    }

    if let (Some(path), Some(recorder)) = (&args.record, last_recorder) {
        recorder.into_recording().save(path)?;
        info!("Recording saved to {:?}", path);
    }
    Ok(resolved)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.quiet);

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            warn!("No attempt resolved the grid");
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
