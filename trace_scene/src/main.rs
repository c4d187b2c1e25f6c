use std::{error::Error, fs::File, io, path::PathBuf};

use clap::Parser;
use mirage_atmospheres::Validate;
use mirage_json::{deserialize_scene, serde_json, JsonSer, SceneFile};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Trace the display rays of a mirage scene and write them as JSON.
#[derive(Parser, Debug)]
#[command(name = "trace_scene")]
struct CliArgs {
    /// Scene file, as written by `gen_rand_scene`.
    scene: PathBuf,

    /// Where to write the results, stdout if omitted.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Number of display rays, overrides the scene's.
    #[arg(long)]
    rays: Option<usize>,

    /// Integration step, in meters, overrides the scene's.
    #[arg(long)]
    step: Option<f64>,

    /// Keep one point every N steps, overrides the scene's.
    #[arg(long)]
    sample_every: Option<usize>,

    /// Log level (error, warn, info, debug, trace), `RUST_LOG` takes precedence.
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl CliArgs {
    fn apply_overrides(&self, file: &mut SceneFile) {
        if let Some(rays) = self.rays {
            file.scene.ray_count = rays;
        }

        for params in file.simulation.params_mut() {
            if let Some(step) = self.step {
                params.step_size = step;
            }
            if let Some(n) = self.sample_every {
                params.sample_every = n;
            }
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &CliArgs) -> Result<(), Box<dyn Error>> {
    let json: serde_json::Value = serde_json::from_reader(File::open(&args.scene)?)?;

    let mut file = deserialize_scene(&json)?;
    args.apply_overrides(&mut file);
    file.validate()?;

    info!(
        model = %file.simulation.model(),
        display_rays = file.scene.ray_count,
        extra_rays = file.rays.len(),
        "tracing {}",
        args.scene.display()
    );

    let results = file.trace();

    for (termination, count) in results.termination_counts() {
        info!(%termination, count);
    }

    let json = results.to_json();
    match &args.output {
        Some(path) => {
            serde_json::to_writer_pretty(File::create(path)?, &json)?;
            info!("results written to {}", path.display());
        }
        None => serde_json::to_writer_pretty(io::stdout().lock(), &json)?,
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = CliArgs::parse();
    init_logging(&args.log_level);

    run(&args).inspect_err(|e| error!("{e}"))
}
