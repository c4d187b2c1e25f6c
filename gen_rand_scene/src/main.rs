use std::{error::Error, fs::File, path::PathBuf};

use clap::{Parser, ValueEnum};
use mirage_atmospheres::{DesertMirage, OceanMirage};
use mirage_json::{serde_json, serialize_scene, Simulation};
use mirage_random::{
    rand::{self, rngs::StdRng, SeedableRng},
    random_launches, random_simulation,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Model {
    Desert,
    Ocean,
}

/// Write a random mirage scene, to be traced with `trace_scene`.
#[derive(Parser, Debug)]
#[command(name = "gen_rand_scene")]
struct CliArgs {
    /// Where to write the scene.
    output: PathBuf,

    #[arg(long, value_enum, default_value_t = Model::Desert)]
    model: Model,

    /// Extra single rays, launched from the left edge of the domain.
    #[arg(long, default_value_t = 0)]
    extra_rays: usize,

    /// Seed of the generator, random if omitted.
    #[arg(long)]
    seed: Option<u64>,
}

/// Steepest heading of the extra rays, in radians.
const MAX_EXTRA_ANGLE: f64 = 0.01;

fn generate_random_scene(args: &CliArgs, rng: &mut StdRng) -> serde_json::Value {
    let (simulation, scene) = match args.model {
        Model::Desert => {
            let (mirage, scene) = random_simulation::<DesertMirage>(rng);
            (Simulation::Desert(mirage), scene)
        }
        Model::Ocean => {
            let (mirage, scene) = random_simulation::<OceanMirage>(rng);
            (Simulation::Ocean(mirage), scene)
        }
    };

    let domain = match &simulation {
        Simulation::Desert(m) => m.domain,
        Simulation::Ocean(m) => m.domain,
    };
    let rays = random_launches(args.extra_rays, rng, &domain, MAX_EXTRA_ANGLE);

    info!(
        model = %simulation.model(),
        display_rays = scene.ray_count,
        extra_rays = rays.len(),
        "random scene generated"
    );

    serialize_scene(&simulation, &scene, &rays)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(rand::thread_rng())?,
    };

    let json = generate_random_scene(&args, &mut rng);

    serde_json::to_writer_pretty(File::create(&args.output)?, &json)?;

    Ok(())
}
