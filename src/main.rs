use ::rand as external_rand;
use clap::Parser;
use external_rand::rngs::StdRng;
use external_rand::SeedableRng;
use tracing::info;

use sproutsim::api::{self, ApiState};
use sproutsim::config::SimulationConfig;
use sproutsim::simulation::Simulation;

#[cfg(feature = "ui")]
mod controls;
#[cfg(feature = "ui")]
mod visualization;

#[cfg(feature = "ui")]
use macroquad::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run in headless mode (HTTP API server)
    #[arg(long)]
    headless: bool,

    /// Port for headless API server
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Configuration file path (YAML or JSON). If not specified, searches for config.yaml, config.yml, or config.json in current directory.
    #[arg(short, long)]
    config: Option<String>,

    /// Plant archetype: tree, flower, herb, succulent or algae
    #[arg(long)]
    archetype: Option<String>,

    /// Seed for reproducible growth
    #[arg(long)]
    seed: Option<u64>,

    /// Run N click-mode steps, print the JSON state and exit
    #[arg(long, value_name = "N")]
    simulate: Option<usize>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Load configuration from file or use default, then apply CLI overrides
fn load_config(args: &Args) -> Result<SimulationConfig, Box<dyn std::error::Error>> {
    let mut config = if let Some(path) = args.config.as_deref() {
        SimulationConfig::from_file(path)
            .map_err(|e| format!("Failed to load config from {}: {}", path, e))?
    } else {
        SimulationConfig::from_default_paths()
    };
    if let Some(name) = &args.archetype {
        config.archetype = name.clone();
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;
    Ok(config)
}

fn make_rng(config: &SimulationConfig) -> StdRng {
    match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Single-shot mode: grow for `steps` unit steps and dump the state as JSON
fn simulate_main(steps: usize, config: SimulationConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = make_rng(&config);
    let mut sim = Simulation::with_config(&mut rng, config)?;
    for _ in 0..steps {
        sim.simulate(&mut rng);
    }
    let status = sim.status();
    info!(
        archetype = status.archetype,
        nodes = status.node_count,
        biomass = status.biomass,
        health = status.health_percent,
        "simulation finished"
    );
    println!("{}", serde_json::to_string_pretty(&api::simulation_to_response(&sim))?);
    Ok(())
}

/// Headless mode - runs HTTP API server
async fn headless_main(port: u16, config: SimulationConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = make_rng(&config);
    let sim = Simulation::with_config(&mut rng, config)?;
    let api_state = ApiState::with_rng(sim, rng);
    api::run_server(api_state, port).await?;
    Ok(())
}

#[cfg(not(feature = "ui"))]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();
    let config = load_config(&args)?;
    if let Some(steps) = args.simulate {
        return simulate_main(steps, config);
    }
    headless_main(args.port, config).await
}

#[cfg(feature = "ui")]
#[macroquad::main(window_conf)]
async fn main() {
    init_tracing();
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(%e, "error loading config");
            std::process::exit(1);
        }
    };

    if let Some(steps) = args.simulate {
        if let Err(e) = simulate_main(steps, config) {
            tracing::error!(%e, "simulation failed");
            std::process::exit(1);
        }
        return;
    }

    if args.headless {
        // Run headless mode even with UI feature enabled
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                tracing::error!(%e, "failed to start async runtime");
                std::process::exit(1);
            }
        };
        rt.block_on(async {
            if let Err(e) = headless_main(args.port, config).await {
                tracing::error!(%e, "error running headless mode");
                std::process::exit(1);
            }
        });
    } else {
        ui_main(config).await;
    }
}

#[cfg(feature = "ui")]
async fn ui_main(config: SimulationConfig) {
    use controls::{handle_controls, ControlState};
    use visualization::{draw_background, draw_light_overlay, draw_primitives, draw_stats_and_help};

    let mut rng = make_rng(&config);
    let mut sim = match Simulation::with_config(&mut rng, config) {
        Ok(sim) => sim,
        Err(e) => {
            tracing::error!(%e, "invalid simulation config");
            std::process::exit(1);
        }
    };
    let mut controls = ControlState::from_simulation(&sim);

    loop {
        handle_controls(&mut sim, &mut controls, &mut rng);

        // Frame mode: dt is derived from the real frame time
        sim.advance_frame(get_frame_time() * 1000.0, &mut rng);

        draw_background(sim.archetype(), &sim.config);
        draw_primitives(&sim.primitives());
        draw_light_overlay(sim.environment.light);
        draw_stats_and_help(&sim.status(), &controls.input);

        if controls.take_screenshot {
            controls.take_screenshot = false;
            let timestamp = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            let filename = format!("sproutsim_screenshot_{}.png", timestamp);
            match capture_screenshot(&filename) {
                Ok(_) => info!(file = %filename, "screenshot saved"),
                Err(e) => tracing::error!(file = %filename, %e, "failed to save screenshot"),
            }
        }

        next_frame().await;
    }
}

#[cfg(feature = "ui")]
fn window_conf() -> Conf {
    // Try to load config to set window size, fall back to defaults if not available
    let config = SimulationConfig::from_default_paths();

    Conf {
        window_title: "Plant Growth Simulation".to_owned(),
        window_width: config.canvas_width as i32,
        window_height: config.canvas_height as i32,
        ..Default::default()
    }
}

#[cfg(feature = "ui")]
/// Capture a screenshot of the current screen
fn capture_screenshot(filename: &str) -> Result<(), Box<dyn std::error::Error>> {
    let screen_image = get_screen_data();

    let width = screen_image.width as u32;
    let height = screen_image.height as u32;
    let bytes = &screen_image.bytes;

    let mut img = image::RgbaImage::new(width, height);

    // OpenGL has origin at bottom-left, images at top-left, so flip vertically
    for y in 0..height {
        for x in 0..width {
            let idx = (y * width + x) as usize * 4;
            if idx + 3 < bytes.len() {
                let img_y = height - 1 - y;
                img.put_pixel(
                    x,
                    img_y,
                    image::Rgba([bytes[idx], bytes[idx + 1], bytes[idx + 2], bytes[idx + 3]]),
                );
            }
        }
    }

    img.save(filename)?;

    Ok(())
}
