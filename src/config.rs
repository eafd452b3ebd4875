use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use cross_xdg::BaseDirs;

use crate::tape::{CellWidth, InvalidCellWidth};

/// Window used when debugging is switched on without an explicit size.
pub const DEFAULT_DEBUG_WINDOW: usize = 10;

pub const CELL_WIDTH_ENV: &str = "BF_CELL_WIDTH";
pub const DEBUG_WINDOW_ENV: &str = "BF_DEBUG_WINDOW";

/// Settings fixed for the lifetime of one machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MachineConfig {
    pub cell_width: CellWidth,
    /// Number of leading cells dumped by `#`; `None` disables the command.
    pub debug_window: Option<usize>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{origin}: {source}")]
    CellWidth {
        origin: String,
        #[source]
        source: InvalidCellWidth,
    },

    #[error("{origin}: invalid debug window '{value}' (expected a positive integer)")]
    DebugWindow { origin: String, value: String },
}

/// Values found in `bf.toml`, before flags and environment are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSettings {
    pub cell_width: Option<String>,
    pub debug_window: Option<String>,
}

/// Path of the config file: `<XDG config home>/bf.toml`.
pub fn config_path() -> Option<PathBuf> {
    // On Linux: resolves to /home/<user>/.config
    // On Windows: resolves to C:\Users\<user>\.config
    // On macOS: resolves to /Users/<user>/.config
    let base_dirs = BaseDirs::new().into_iter().next()?;
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push("bf.toml");
    Some(path)
}

/// Read `bf.toml` if there is one. A missing or unreadable file yields defaults.
pub fn load_file_settings() -> FileSettings {
    config_path()
        .and_then(|path| fs::read_to_string(path).ok())
        .map(|content| parse_settings(&content))
        .unwrap_or_default()
}

/// Very small line-oriented parser: looks for a `[machine]` section and
/// `key = value` pairs, quoted or not.
pub fn parse_settings(content: &str) -> FileSettings {
    let mut in_machine = false;
    let mut map: HashMap<String, String> = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            in_machine = line[1..line.len() - 1].trim() == "machine";
            continue;
        }
        if !in_machine {
            continue;
        }
        if let Some(eq) = line.find('=') {
            let key = line[..eq].trim().to_string();
            let val_raw = line[eq + 1..].trim();
            let val = if val_raw.len() >= 2 && val_raw.starts_with('"') && val_raw.ends_with('"') {
                val_raw[1..val_raw.len() - 1].to_string()
            } else {
                val_raw.to_string()
            };
            map.insert(key, val);
        }
    }

    FileSettings {
        cell_width: map.remove("cell_width"),
        debug_window: map.remove("debug_window"),
    }
}

impl MachineConfig {
    /// Resolve each setting: flag -> environment -> config file -> default.
    pub fn resolve(
        cell_width_flag: Option<CellWidth>,
        debug_window_flag: Option<usize>,
        file: &FileSettings,
    ) -> Result<Self, ConfigError> {
        let cell_width = match cell_width_flag {
            Some(width) => width,
            None => match lookup(CELL_WIDTH_ENV, file.cell_width.as_deref()) {
                Some((origin, value)) => value
                    .parse::<CellWidth>()
                    .map_err(|source| ConfigError::CellWidth { origin, source })?,
                None => CellWidth::default(),
            },
        };

        let debug_window = match debug_window_flag {
            Some(window) => Some(window),
            None => match lookup(DEBUG_WINDOW_ENV, file.debug_window.as_deref()) {
                Some((origin, value)) => Some(parse_window(&value).ok_or(ConfigError::DebugWindow {
                    origin,
                    value,
                })?),
                None => None,
            },
        };

        Ok(Self {
            cell_width,
            debug_window,
        })
    }

    /// Whether `#` is part of the instruction set.
    pub fn debug_enabled(&self) -> bool {
        self.debug_window.is_some()
    }
}

/// First non-empty value from the environment, then the file, with a label
/// naming where it came from.
fn lookup(env_key: &str, file_value: Option<&str>) -> Option<(String, String)> {
    if let Some(value) = env::var(env_key).ok().filter(|v| !v.trim().is_empty()) {
        return Some((env_key.to_string(), value));
    }
    file_value.map(|value| ("bf.toml".to_string(), value.to_string()))
}

/// A positive cell count, or `true`/`on` for the default window.
fn parse_window(value: &str) -> Option<usize> {
    match value.trim() {
        "true" | "on" => Some(DEFAULT_DEBUG_WINDOW),
        other => other.parse::<usize>().ok().filter(|&n| n > 0),
    }
}
