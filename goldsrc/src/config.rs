use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::wad::palette::TRANSPARENT_PREFIX;

/// Progress reports spread over one scene build.
pub const PROGRESS_STEPS: u32 = 27;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read settings: {0}")]
    Ini(#[from] ini::Error),
    #[error("`[{section}] {key}` has invalid value `{value}`")]
    Invalid {
        section: &'static str,
        key: &'static str,
        value: String,
    },
}

/// Tunables read from `conf.ini`.
///
/// ```ini
/// [wad]
/// palette = quake/palette.lmp
///
/// [map]
/// transparent_prefix = glass
/// progress_steps = 27
/// spawn_fallback = true
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// External palette for legacy archives.
    pub palette: Option<PathBuf>,
    pub transparent_prefix: String,
    pub progress_steps: u32,
    pub spawn_fallback: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            palette: None,
            transparent_prefix: TRANSPARENT_PREFIX.to_owned(),
            progress_steps: PROGRESS_STEPS,
            spawn_fallback: true,
        }
    }
}

fn parse_bool(section: &'static str, key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            section,
            key,
            value: value.to_owned(),
        }),
    }
}

impl Settings {
    /// Missing sections and keys keep their defaults.
    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Some(wad) = ini.section(Some("wad")) {
            settings.palette = wad.get("palette").map(PathBuf::from);
        }

        if let Some(map) = ini.section(Some("map")) {
            if let Some(prefix) = map.get("transparent_prefix") {
                settings.transparent_prefix = prefix.to_owned();
            }
            if let Some(steps) = map.get("progress_steps") {
                settings.progress_steps =
                    steps.trim().parse().map_err(|_| ConfigError::Invalid {
                        section: "map",
                        key: "progress_steps",
                        value: steps.to_owned(),
                    })?;
            }
            if let Some(fallback) = map.get("spawn_fallback") {
                settings.spawn_fallback = parse_bool("map", "spawn_fallback", fallback)?;
            }
        }

        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_ini(&Ini::load_from_file(path)?)
    }

    /// Like [`Settings::load`], but a missing or broken file only logs and gives defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("no settings at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("{e}, using default settings");
                Self::default()
            }
        }
    }
}
