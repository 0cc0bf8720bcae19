//! Preset files: parameter values saved as JSON.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use aarrow_types::ArpParams;

pub const PRESET_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct PresetFile {
    version: u32,
    params: ArpParams,
}

/// Error type for preset save/load.
#[derive(Debug)]
pub enum PresetError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Version(u32),
}

impl From<std::io::Error> for PresetError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for PresetError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl fmt::Display for PresetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Json(e) => write!(f, "JSON error: {}", e),
            Self::Version(v) => write!(f, "unsupported preset version {}", v),
        }
    }
}

impl std::error::Error for PresetError {}

pub fn default_preset_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("aarrow").join("presets"))
}

/// Write `params` to `path`, creating parent directories as needed.
pub fn save_preset(path: &Path, params: &ArpParams) -> Result<(), PresetError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = PresetFile {
        version: PRESET_VERSION,
        params: *params,
    };
    let json = serde_json::to_string_pretty(&file)?;
    fs::write(path, json)?;
    log::info!(target: "preset", "saved preset {}", path.display());
    Ok(())
}

/// Read a preset. Missing fields take their defaults; values are clamped.
pub fn load_preset(path: &Path) -> Result<ArpParams, PresetError> {
    let contents = fs::read_to_string(path)?;
    let file: PresetFile = serde_json::from_str(&contents)?;
    if file.version > PRESET_VERSION {
        return Err(PresetError::Version(file.version));
    }
    log::info!(target: "preset", "loaded preset {}", path.display());
    Ok(file.params.clamped())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aarrow_types::ArpDirection;

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("bright.json");
        let params = ArpParams {
            speed: 0.25,
            octaves: 4,
            direction: ArpDirection::Random,
            probability: 30,
            ping_pong: true,
            ..ArpParams::default()
        };
        save_preset(&path, &params).unwrap();
        assert_eq!(load_preset(&path).unwrap(), params);
    }

    #[test]
    fn load_fills_missing_and_clamps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.json");
        fs::write(&path, r#"{ "version": 1, "params": { "octaves": 12 } }"#).unwrap();
        let params = load_preset(&path).unwrap();
        assert_eq!(params.octaves, 5);
        assert_eq!(params.speed, 0.5);
    }

    #[test]
    fn newer_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.json");
        fs::write(&path, r#"{ "version": 9, "params": {} }"#).unwrap();
        assert!(matches!(load_preset(&path), Err(PresetError::Version(9))));
    }

    #[test]
    fn missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_preset(&dir.path().join("nope.json")),
            Err(PresetError::Io(_))
        ));
        let path = dir.path().join("junk.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(load_preset(&path), Err(PresetError::Json(_))));
    }
}
