//! Everything around the real-time arpeggiator: configuration, parameter
//! access, presets, MIDI ports and the audio-clocked standalone host.

pub mod config;
pub mod host;
pub mod midi;
pub mod params;
pub mod persistence;

pub use config::{Config, ConfigError};
pub use host::{ArpHost, HostError, HostOptions};
pub use params::{ParamError, ParamStore};
pub use persistence::{default_preset_dir, load_preset, save_preset, PresetError};
