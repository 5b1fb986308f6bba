//! Stage configuration resource.
//!
//! Manages stage settings loaded from an INI configuration file. Provides
//! defaults for safe startup and methods to load/save configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [render]
//! pixels_per_unit = 100
//! reference_width = 1920
//! reference_height = 1080
//! output = sprite
//!
//! [window]
//! width = 1280
//! height = 720
//! target_fps = 60
//! vsync = true
//!
//! [actors]
//! models_path = ./assets/models
//! head_angle_parameter = ParamAngleX
//! mouth_parameter = ParamMouthOpenY
//! look_angle = 30
//! appearance_blend_rate = 10
//! gaze_blend_rate = 10
//! min_duration = 0.0001
//! talk_speed = 12
//! talk_amplitude = 1
//! slot_spacing = 100
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

/// Default safe values for startup
const DEFAULT_PIXELS_PER_UNIT: f32 = 100.0;
const DEFAULT_REFERENCE_WIDTH: u32 = 1920;
const DEFAULT_REFERENCE_HEIGHT: u32 = 1080;
const DEFAULT_WINDOW_WIDTH: u32 = 1280;
const DEFAULT_WINDOW_HEIGHT: u32 = 720;
const DEFAULT_TARGET_FPS: u32 = 60;
const DEFAULT_VSYNC: bool = true;
const DEFAULT_MODELS_PATH: &str = "./assets/models";
const DEFAULT_HEAD_ANGLE_PARAMETER: &str = "ParamAngleX";
const DEFAULT_MOUTH_PARAMETER: &str = "ParamMouthOpenY";
const DEFAULT_LOOK_ANGLE: f32 = 30.0;
const DEFAULT_APPEARANCE_BLEND_RATE: f32 = 10.0;
const DEFAULT_GAZE_BLEND_RATE: f32 = 10.0;
const DEFAULT_MIN_DURATION: f32 = 0.0001;
const DEFAULT_TALK_SPEED: f32 = 12.0;
const DEFAULT_TALK_AMPLITUDE: f32 = 1.0;
const DEFAULT_SLOT_SPACING: f32 = 100.0;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

/// How compositors publish their surfaces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputKind {
    #[default]
    Sprite,
    Texture,
}

impl OutputKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sprite" => Some(OutputKind::Sprite),
            "texture" => Some(OutputKind::Texture),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OutputKind::Sprite => "sprite",
            OutputKind::Texture => "texture",
        }
    }
}

/// Stage configuration resource.
#[derive(Resource, Debug, Clone)]
pub struct StageConfig {
    /// Surface pixels per model unit.
    pub pixels_per_unit: f32,
    /// Scene resolution the actor layout is authored for.
    pub reference_width: u32,
    pub reference_height: u32,
    pub output: OutputKind,
    /// Window width in pixels.
    pub window_width: u32,
    /// Window height in pixels.
    pub window_height: u32,
    /// Target frames per second.
    pub target_fps: u32,
    /// Enable vertical sync.
    pub vsync: bool,
    /// Directory holding `<model id>.json` rigs.
    pub models_path: PathBuf,
    /// Parameter driven by gaze instead of appearances.
    pub head_angle_parameter: String,
    /// Parameter overridden while talking.
    pub mouth_parameter: String,
    /// Head angle magnitude for left/right looks, degrees.
    pub look_angle: f32,
    pub appearance_blend_rate: f32,
    pub gaze_blend_rate: f32,
    /// Floor applied to requested durations before inverting them.
    pub min_duration: f32,
    pub talk_speed: f32,
    pub talk_amplitude: f32,
    /// Distance between model placement slots, world units.
    pub slot_spacing: f32,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl StageConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            pixels_per_unit: DEFAULT_PIXELS_PER_UNIT,
            reference_width: DEFAULT_REFERENCE_WIDTH,
            reference_height: DEFAULT_REFERENCE_HEIGHT,
            output: OutputKind::default(),
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            target_fps: DEFAULT_TARGET_FPS,
            vsync: DEFAULT_VSYNC,
            models_path: PathBuf::from(DEFAULT_MODELS_PATH),
            head_angle_parameter: DEFAULT_HEAD_ANGLE_PARAMETER.to_string(),
            mouth_parameter: DEFAULT_MOUTH_PARAMETER.to_string(),
            look_angle: DEFAULT_LOOK_ANGLE,
            appearance_blend_rate: DEFAULT_APPEARANCE_BLEND_RATE,
            gaze_blend_rate: DEFAULT_GAZE_BLEND_RATE,
            min_duration: DEFAULT_MIN_DURATION,
            talk_speed: DEFAULT_TALK_SPEED,
            talk_amplitude: DEFAULT_TALK_AMPLITUDE,
            slot_spacing: DEFAULT_SLOT_SPACING,
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

    /// Blend speed for a requested transition duration.
    pub fn speed_for(&self, duration: f32) -> f32 {
        1.0 / duration.max(self.min_duration)
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
        self.apply(&config);

        info!(
            "Loaded config: ppu={}, reference {}x{}, output={}, window {}x{}, fps={}, vsync={}, models={:?}",
            self.pixels_per_unit,
            self.reference_width,
            self.reference_height,
            self.output.name(),
            self.window_width,
            self.window_height,
            self.target_fps,
            self.vsync,
            self.models_path
        );

        Ok(())
    }

    /// Load configuration from INI text instead of a file.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    fn apply(&mut self, config: &Ini) {
        let float = |section: &str, key: &str| {
            config
                .getfloat(section, key)
                .ok()
                .flatten()
                .map(|v| v as f32)
        };

        // [render] section
        if let Some(ppu) = float("render", "pixels_per_unit") {
            if ppu > 0.0 {
                self.pixels_per_unit = ppu;
            } else {
                log::warn!("Ignoring non-positive pixels_per_unit {}", ppu);
            }
        }
        if let Some(width) = config.getuint("render", "reference_width").ok().flatten() {
            self.reference_width = width as u32;
        }
        if let Some(height) = config.getuint("render", "reference_height").ok().flatten() {
            self.reference_height = height as u32;
        }
        if let Some(output) = config.get("render", "output") {
            match OutputKind::from_name(&output) {
                Some(kind) => self.output = kind,
                None => log::warn!("Unknown render output '{}', keeping {}", output, self.output.name()),
            }
        }

        // [window] section
        if let Some(width) = config.getuint("window", "width").ok().flatten() {
            self.window_width = width as u32;
        }
        if let Some(height) = config.getuint("window", "height").ok().flatten() {
            self.window_height = height as u32;
        }
        if let Some(fps) = config.getuint("window", "target_fps").ok().flatten() {
            self.target_fps = fps as u32;
        }
        if let Some(vsync) = config.getbool("window", "vsync").ok().flatten() {
            self.vsync = vsync;
        }

        // [actors] section
        if let Some(path) = config.get("actors", "models_path") {
            self.models_path = PathBuf::from(path);
        }
        if let Some(name) = config.get("actors", "head_angle_parameter") {
            self.head_angle_parameter = name;
        }
        if let Some(name) = config.get("actors", "mouth_parameter") {
            self.mouth_parameter = name;
        }
        if let Some(v) = float("actors", "look_angle") {
            self.look_angle = v;
        }
        if let Some(v) = float("actors", "appearance_blend_rate") {
            self.appearance_blend_rate = v;
        }
        if let Some(v) = float("actors", "gaze_blend_rate") {
            self.gaze_blend_rate = v;
        }
        if let Some(v) = float("actors", "min_duration") {
            if v > 0.0 {
                self.min_duration = v;
            }
        }
        if let Some(v) = float("actors", "talk_speed") {
            self.talk_speed = v;
        }
        if let Some(v) = float("actors", "talk_amplitude") {
            self.talk_amplitude = v;
        }
        if let Some(v) = float("actors", "slot_spacing") {
            self.slot_spacing = v;
        }
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        // [render] section
        config.set("render", "pixels_per_unit", Some(self.pixels_per_unit.to_string()));
        config.set("render", "reference_width", Some(self.reference_width.to_string()));
        config.set("render", "reference_height", Some(self.reference_height.to_string()));
        config.set("render", "output", Some(self.output.name().to_string()));

        // [window] section
        config.set("window", "width", Some(self.window_width.to_string()));
        config.set("window", "height", Some(self.window_height.to_string()));
        config.set("window", "target_fps", Some(self.target_fps.to_string()));
        config.set("window", "vsync", Some(self.vsync.to_string()));

        // [actors] section
        config.set(
            "actors",
            "models_path",
            Some(self.models_path.display().to_string()),
        );
        config.set("actors", "head_angle_parameter", Some(self.head_angle_parameter.clone()));
        config.set("actors", "mouth_parameter", Some(self.mouth_parameter.clone()));
        config.set("actors", "look_angle", Some(self.look_angle.to_string()));
        config.set(
            "actors",
            "appearance_blend_rate",
            Some(self.appearance_blend_rate.to_string()),
        );
        config.set("actors", "gaze_blend_rate", Some(self.gaze_blend_rate.to_string()));
        config.set("actors", "min_duration", Some(self.min_duration.to_string()));
        config.set("actors", "talk_speed", Some(self.talk_speed.to_string()));
        config.set("actors", "talk_amplitude", Some(self.talk_amplitude.to_string()));
        config.set("actors", "slot_spacing", Some(self.slot_spacing.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    /// Get the window size.
    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    /// Factor mapping reference-resolution pixels onto a screen of the
    /// given size, preserving aspect.
    pub fn scene_scale(&self, screen_width: i32, screen_height: i32) -> f32 {
        if self.reference_width == 0 || self.reference_height == 0 {
            return 1.0;
        }
        let sx = screen_width.max(0) as f32 / self.reference_width as f32;
        let sy = screen_height.max(0) as f32 / self.reference_height as f32;
        sx.min(sy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_scale_fits_reference_into_screen() {
        let mut config = StageConfig::new();
        config.reference_width = 1920;
        config.reference_height = 1080;
        assert_eq!(config.scene_scale(1920, 1080), 1.0);
        assert_eq!(config.scene_scale(960, 540), 0.5);
        // letterboxed: height limits
        assert_eq!(config.scene_scale(1920, 540), 0.5);
        config.reference_height = 0;
        assert_eq!(config.scene_scale(640, 480), 1.0);
    }

    #[test]
    fn defaults_are_usable() {
        let c = StageConfig::new();
        assert_eq!(c.pixels_per_unit, 100.0);
        assert_eq!(c.output, OutputKind::Sprite);
        assert_eq!(c.look_angle, 30.0);
        assert_eq!(c.head_angle_parameter, "ParamAngleX");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut c = StageConfig::new();
        c.load_from_str(
            "[render]\npixels_per_unit = 50\noutput = texture\n[actors]\nlook_angle = 20\nmouth_parameter = Mouth\n",
        )
        .unwrap();
        assert_eq!(c.pixels_per_unit, 50.0);
        assert_eq!(c.output, OutputKind::Texture);
        assert_eq!(c.look_angle, 20.0);
        assert_eq!(c.mouth_parameter, "Mouth");
        assert_eq!(c.window_size(), (1280, 720));
        assert_eq!(c.gaze_blend_rate, 10.0);
    }

    #[test]
    fn bad_values_are_ignored() {
        let mut c = StageConfig::new();
        c.load_from_str("[render]\npixels_per_unit = -5\noutput = hologram\n")
            .unwrap();
        assert_eq!(c.pixels_per_unit, 100.0);
        assert_eq!(c.output, OutputKind::Sprite);
    }

    #[test]
    fn zero_duration_is_floored() {
        let c = StageConfig::new();
        assert_eq!(c.speed_for(0.5), 2.0);
        assert!((c.speed_for(0.0) - 10_000.0).abs() < 1.0);
    }

    #[test]
    fn missing_file_is_an_error() {
        let mut c = StageConfig::with_path("/nonexistent/stage.ini");
        assert!(c.load_from_file().is_err());
        assert_eq!(c.pixels_per_unit, 100.0);
    }
}
