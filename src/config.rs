use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::{
    error::AppError,
    nav::NavConfig,
    starfield::{StarShape, StarfieldConfig},
};

pub const RENDER_HZ: f32 = 60.0;

pub const DEPTH_MAX: f32 = 2000.0;
pub const FIELD_SPREAD: f32 = 1000.0;
pub const FOCAL: f32 = 0.001;
pub const BASE_RADIUS: f32 = 2.8;
pub const MIN_RADIUS: f32 = 0.1;
pub const SIZE_SCALE_MIN: f32 = 0.07;
pub const SIZE_SCALE_MAX: f32 = 1.4;

pub const CRUISE_SPEED: f32 = 0.6;
pub const JUMP_SPEED: f32 = 100.0;
pub const SPEED_SMOOTHING: f32 = 0.05;
pub const TRAIL_THRESHOLD: f32 = 2.5;
pub const TRAIL_WIDTH_SCALE: f32 = 0.6;
pub const TRAIL_ALPHA_SCALE: f32 = 0.8;
pub const FADE_ALPHA: f32 = 0.2;
pub const STAR_INNER_RATIO: f32 = 0.4;

pub const CLASSIC_PARTICLES: usize = 1620;
pub const PRISMATIC_PARTICLES: usize = 1782;

pub const COOLDOWN_MS: u64 = 1000;
pub const MIN_INTERVAL_MS: u64 = 500;
pub const WHEEL_THRESHOLD: f32 = 20.0;
pub const TOUCH_THRESHOLD: f32 = 80.0;
pub const INITIAL_JUMP_MS: u64 = 800;

/// Pixels reported per wheel notch, matching a browser's `deltaY` line step.
pub const WHEEL_NOTCH_PX: f32 = 100.0;
/// Approximate pixel height of one terminal row, used to turn drags into touch deltas.
pub const ROW_PX: f32 = 16.0;

pub const REDUCED_QUALITY: f32 = 0.75;
pub const HIGH_DENSITY_PIXEL_RATIO: f32 = 2.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Classic,
    #[default]
    Prismatic,
}

impl Preset {
    pub fn starfield(self) -> StarfieldConfig {
        match self {
            Preset::Classic => StarfieldConfig::classic(),
            Preset::Prismatic => StarfieldConfig::prismatic(),
        }
    }
}

/// Overrides read from the `[starfield]` table. Unset fields keep the preset value.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StarfieldFile {
    pub preset: Option<Preset>,
    pub particle_count: Option<usize>,
    pub focal: Option<f32>,
    pub base_radius: Option<f32>,
    pub cruise_speed: Option<f32>,
    pub jump_speed: Option<f32>,
    pub smoothing: Option<f32>,
    pub trail_threshold: Option<f32>,
    pub shape: Option<StarShape>,
    pub shimmer: Option<bool>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NavigationFile {
    pub cooldown_ms: Option<u64>,
    pub min_interval_ms: Option<u64>,
    pub wheel_threshold: Option<f32>,
    pub touch_threshold: Option<f32>,
    pub initial_jump_ms: Option<u64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub starfield: StarfieldFile,
    pub navigation: NavigationFile,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        Ok(toml::from_str(raw)?)
    }
}

/// Resolved settings for one run of the app.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub starfield: StarfieldConfig,
    pub navigation: NavConfig,
    pub seed: Option<u64>,
    pub touch_primary: bool,
    pub pixel_ratio: f32,
}

impl AppConfig {
    /// Layers the file over the preset. A preset chosen on the command line wins
    /// over the one named in the file.
    pub fn resolve(file: ConfigFile, cli_preset: Option<Preset>) -> Result<Self, AppError> {
        let preset = cli_preset.or(file.starfield.preset).unwrap_or_default();
        let mut starfield = preset.starfield();
        let s = file.starfield;
        if let Some(v) = s.particle_count {
            starfield.particle_count = v;
        }
        if let Some(v) = s.focal {
            starfield.focal = v;
        }
        if let Some(v) = s.base_radius {
            starfield.base_radius = v;
        }
        if let Some(v) = s.cruise_speed {
            starfield.cruise_speed = v;
        }
        if let Some(v) = s.jump_speed {
            starfield.jump_speed = v;
        }
        if let Some(v) = s.smoothing {
            starfield.smoothing = v;
        }
        if let Some(v) = s.trail_threshold {
            starfield.trail_threshold = v;
        }
        if let Some(v) = s.shape {
            starfield.shape = v;
        }
        if let Some(v) = s.shimmer {
            starfield.shimmer = v;
        }
        starfield.validate()?;

        let mut navigation = NavConfig::default();
        let n = file.navigation;
        if let Some(ms) = n.cooldown_ms {
            navigation.cooldown = Duration::from_millis(ms);
        }
        if let Some(ms) = n.min_interval_ms {
            navigation.min_interval = Duration::from_millis(ms);
        }
        if let Some(v) = n.wheel_threshold {
            navigation.wheel_threshold = v;
        }
        if let Some(v) = n.touch_threshold {
            navigation.touch_threshold = v;
        }
        if let Some(ms) = n.initial_jump_ms {
            navigation.initial_jump = Duration::from_millis(ms);
        }
        navigation.validate()?;

        Ok(Self {
            starfield,
            navigation,
            seed: None,
            touch_primary: false,
            pixel_ratio: 1.0,
        })
    }
}
