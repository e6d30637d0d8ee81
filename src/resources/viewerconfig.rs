//! Viewer configuration resource.
//!
//! Manages viewer settings loaded from an INI configuration file. Provides
//! defaults for safe startup and methods to load/save configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [window]
//! width = 1000
//! height = 700
//! target_fps = 60
//!
//! [canvas]
//! margin = 30
//!
//! [simulation]
//! network = ./assets/network.json
//! start_paused = false
//!
//! [traffic_lights]
//! signal_index = second
//!
//! [spawn]
//! types = car, bus, truck
//! routes = r1, r2
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{info, warn};
use std::path::PathBuf;

use crate::sync::trafficlights::SignalIndexPolicy;
use crate::sync::vehicles::VehicleKind;

/// Default safe values for startup
const DEFAULT_WINDOW_WIDTH: u32 = 1000;
const DEFAULT_WINDOW_HEIGHT: u32 = 700;
const DEFAULT_TARGET_FPS: u32 = 60;
const DEFAULT_MARGIN: f64 = 30.0;
const DEFAULT_NETWORK_PATH: &str = "./assets/network.json";
const DEFAULT_CONFIG_PATH: &str = "./config.ini";
const DEFAULT_ROUTES: [&str; 2] = ["r1", "r2"];

/// Viewer configuration resource.
///
/// The window size doubles as the canvas size used to fit the network.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Window (and canvas) width in pixels.
    pub window_width: u32,
    /// Window (and canvas) height in pixels.
    pub window_height: u32,
    /// Target frames per second; one simulation tick per frame.
    pub target_fps: u32,
    /// Empty border kept around the network, in pixels.
    pub margin: f64,
    /// Network description handed to the simulator at startup.
    pub network_path: PathBuf,
    /// Start with the tick loop paused.
    pub start_paused: bool,
    /// Which state character colors a traffic light.
    pub signal_index: SignalIndexPolicy,
    /// Vehicle types picked from by random spawns.
    pub spawn_types: Vec<VehicleKind>,
    /// Route ids picked from by random spawns.
    pub spawn_routes: Vec<String>,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewerConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            target_fps: DEFAULT_TARGET_FPS,
            margin: DEFAULT_MARGIN,
            network_path: PathBuf::from(DEFAULT_NETWORK_PATH),
            start_paused: false,
            signal_index: SignalIndexPolicy::default(),
            spawn_types: VehicleKind::ALL.to_vec(),
            spawn_routes: DEFAULT_ROUTES.iter().map(|r| r.to_string()).collect(),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply(&config)?;
        info!("Loaded config from {:?}", self.config_path);
        Ok(())
    }

    /// Load configuration from INI text.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply(&config)
    }

    /// Apply every present key, then check the result as a whole. Nothing
    /// changes when any value is rejected.
    fn apply(&mut self, config: &Ini) -> Result<(), String> {
        let mut next = self.clone();

        // [window] section
        if let Some(width) = config.getuint("window", "width")? {
            next.window_width = window_value("width", width)?;
        }
        if let Some(height) = config.getuint("window", "height")? {
            next.window_height = window_value("height", height)?;
        }
        if let Some(fps) = config.getuint("window", "target_fps")? {
            next.target_fps = window_value("target_fps", fps)?;
        }

        // [canvas] section
        if let Some(margin) = config.getfloat("canvas", "margin")? {
            if margin < 0.0 {
                return Err(format!("Canvas margin must not be negative, got {}", margin));
            }
            next.margin = margin;
        }

        // [simulation] section
        if let Some(network) = config.get("simulation", "network") {
            next.network_path = PathBuf::from(network.trim());
        }
        if let Some(paused) = config.getbool("simulation", "start_paused")? {
            next.start_paused = paused;
        }

        // [traffic_lights] section
        if let Some(index) = config.get("traffic_lights", "signal_index") {
            next.signal_index = index.parse()?;
        }

        // [spawn] section
        if let Some(types) = config.get("spawn", "types") {
            next.spawn_types = split_list(&types)
                .filter_map(|name| {
                    let kind = VehicleKind::ALL
                        .into_iter()
                        .find(|k| k.type_id().eq_ignore_ascii_case(name));
                    if kind.is_none() {
                        warn!("Ignoring unknown spawn type '{}'", name);
                    }
                    kind
                })
                .collect();
        }
        if let Some(routes) = config.get("spawn", "routes") {
            next.spawn_routes = split_list(&routes).map(str::to_string).collect();
        }

        // The margin is taken from both sides; at least one pixel must remain.
        let shorter = next.window_width.min(next.window_height) as f64;
        if next.margin * 2.0 >= shorter {
            return Err(format!(
                "Canvas margin {} leaves no room in a {}x{} window",
                next.margin, next.window_width, next.window_height
            ));
        }

        info!(
            "Config: {}x{} window, fps={}, margin={}, network={:?}, signal_index={:?}",
            next.window_width,
            next.window_height,
            next.target_fps,
            next.margin,
            next.network_path,
            next.signal_index
        );

        *self = next;
        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist. Used by `--save-config` to write
    /// the effective settings, CLI overrides included.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set("window", "width", Some(self.window_width.to_string()));
        config.set("window", "height", Some(self.window_height.to_string()));
        config.set("window", "target_fps", Some(self.target_fps.to_string()));
        config.set("canvas", "margin", Some(self.margin.to_string()));
        config.set(
            "simulation",
            "network",
            Some(self.network_path.display().to_string()),
        );
        config.set("simulation", "start_paused", Some(self.start_paused.to_string()));
        let index = match self.signal_index {
            SignalIndexPolicy::First => "first",
            SignalIndexPolicy::Second => "second",
        };
        config.set("traffic_lights", "signal_index", Some(index.to_string()));
        let types: Vec<&str> = self.spawn_types.iter().map(|k| k.type_id()).collect();
        config.set("spawn", "types", Some(types.join(", ")));
        config.set("spawn", "routes", Some(self.spawn_routes.join(", ")));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    /// Canvas size in pixels.
    pub fn canvas_size(&self) -> (f64, f64) {
        (self.window_width as f64, self.window_height as f64)
    }
}

fn window_value(key: &str, value: u64) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("[window] {} is out of range, got {}", key, value))
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}
