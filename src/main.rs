//! Traffic Flow main entry point.
//!
//! A live viewer for a discrete-event traffic simulation written in Rust
//! using:
//! - **bevy_ecs** to hold every drawn vehicle, traffic light and lane
//! - **raylib** for the window (feature `gui`)
//!
//! # Main Loop
//!
//! 1. Load `config.ini` (defaults when missing) and apply CLI overrides
//! 2. Start the bundled demo simulator on the configured network file
//! 3. Fit the lane geometry onto the canvas and draw the lanes
//! 4. Once per frame: step the simulation, reconcile vehicles and traffic
//!    lights, render
//! 5. Stop the simulator on exit
//!
//! # Running
//!
//! ```sh
//! cargo run --release --features gui
//! cargo run --release -- --headless --ticks 1000 --spawn-every 25
//! cargo run --release -- --network nets/grid.json --save-config
//! ```

// Do not create console on Windows
#![cfg_attr(
    all(target_os = "windows", feature = "gui"),
    windows_subsystem = "windows"
)]

use clap::Parser;
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::process::ExitCode;

use trafficflow::driver::TickDriver;
use trafficflow::resources::viewerconfig::ViewerConfig;
use trafficflow::simulator::demo::DemoSimulator;

/// Traffic Flow viewer
#[derive(Parser)]
#[command(version, about = "Live 2D viewer for a discrete-event traffic simulation")]
struct Cli {
    /// INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// Network description to simulate, overriding the configuration.
    #[arg(long, value_name = "PATH")]
    network: Option<PathBuf>,

    /// Run without a window and log progress instead.
    #[arg(long)]
    headless: bool,

    /// Number of ticks to run in headless mode.
    #[arg(long, value_name = "N", default_value_t = 600)]
    ticks: u64,

    /// Spawn a random vehicle every N ticks in headless mode.
    #[arg(long, value_name = "N")]
    spawn_every: Option<u64>,

    /// Start with the debug overlay enabled.
    #[arg(long)]
    debug: bool,

    /// Write the effective configuration to the config file and exit.
    #[arg(long)]
    save_config: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = ViewerConfig::with_path(&cli.config);
    if let Err(e) = config.load_from_file() {
        warn!("{}; using defaults", e);
    }
    if let Some(network) = cli.network {
        config.network_path = network;
    }
    if cli.save_config {
        return match config.save_to_file() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("{}", e);
                ExitCode::FAILURE
            }
        };
    }

    let mut driver = match TickDriver::startup(DemoSimulator::new(), &config) {
        Ok(driver) => driver,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if cli.debug {
        driver.toggle_debug();
    }

    #[cfg(feature = "gui")]
    let ok = if cli.headless {
        run_headless(&mut driver, cli.ticks, cli.spawn_every)
    } else {
        run_window(&mut driver, &config)
    };
    #[cfg(not(feature = "gui"))]
    let ok = {
        if !cli.headless {
            info!("Built without the gui feature, running headless");
        }
        run_headless(&mut driver, cli.ticks, cli.spawn_every)
    };

    driver.shutdown();
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn run_headless(driver: &mut TickDriver<DemoSimulator>, ticks: u64, spawn_every: Option<u64>) -> bool {
    let spawn_every = spawn_every.filter(|n| *n > 0);
    for n in 1..=ticks {
        if let Some(every) = spawn_every {
            if n % every == 0 {
                // Failures are already logged by the driver.
                driver.spawn_random_vehicle().ok();
            }
        }
        match driver.tick() {
            Ok(report) => {
                if report.failure_count() > 0 {
                    debug!("Tick {}: {} fetch failures", n, report.failure_count());
                }
            }
            Err(e) => {
                error!("Simulation step failed: {}", e);
                return false;
            }
        }
        if n % 100 == 0 {
            let stats = driver.stats();
            info!(
                "t={:.1}s: {} vehicles, {} traffic lights",
                driver.clock().elapsed,
                stats.vehicles,
                stats.traffic_lights
            );
        }
    }
    true
}

#[cfg(feature = "gui")]
fn run_window(driver: &mut TickDriver<DemoSimulator>, config: &ViewerConfig) -> bool {
    use raylib::prelude::*;
    use trafficflow::systems::render::{BACKGROUND, render_debug_ui, render_pass};

    let (mut rl, thread) = raylib::init()
        .size(config.window_width as i32, config.window_height as i32)
        .title("Traffic Flow")
        .build();
    rl.set_target_fps(config.target_fps);

    while !rl.window_should_close() {
        if rl.is_key_pressed(KeyboardKey::KEY_SPACE) {
            driver.toggle_pause();
        }
        if rl.is_key_pressed(KeyboardKey::KEY_A) {
            driver.spawn_random_vehicle().ok();
        }
        if rl.is_key_pressed(KeyboardKey::KEY_F11) {
            driver.toggle_debug();
        }

        if let Err(e) = driver.tick() {
            error!("Simulation step failed: {}", e);
            return false;
        }

        let mut d = rl.begin_drawing(&thread);
        d.clear_background(BACKGROUND);
        render_pass(driver.world_mut(), &mut d);
        render_debug_ui(driver.world_mut(), &mut d);
    }
    true
}
