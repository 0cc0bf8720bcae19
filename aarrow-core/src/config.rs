use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use aarrow_types::{ArpDirection, ArpParams, TransportInfo};

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    defaults: DefaultsConfig,
    #[serde(default)]
    transport: TransportConfig,
    #[serde(default)]
    midi: MidiConfig,
    #[serde(default)]
    runtime: RuntimeConfig,
}

#[derive(Deserialize, Default)]
struct DefaultsConfig {
    speed: Option<f64>,
    probability: Option<u8>,
    octaves: Option<u8>,
    direction: Option<String>,
    ping_pong: Option<bool>,
    sync: Option<bool>,
    dotted: Option<bool>,
    triplet: Option<bool>,
}

#[derive(Deserialize, Default)]
struct TransportConfig {
    tempo_bpm: Option<f64>,
    time_signature_numerator: Option<u32>,
}

#[derive(Deserialize, Default)]
struct MidiConfig {
    client_name: Option<String>,
    output_channel: Option<u8>,
    input_port: Option<String>,
    output_port: Option<String>,
}

#[derive(Deserialize, Default)]
struct RuntimeConfig {
    stats_interval_secs: Option<u64>,
    seed: Option<u64>,
}

/// Error loading an explicitly named config file.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Toml(e) => write!(f, "TOML error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

pub struct Config {
    defaults: DefaultsConfig,
    transport: TransportConfig,
    midi: MidiConfig,
    runtime: RuntimeConfig,
}

impl Config {
    /// Embedded defaults overlaid with the user's config file, if any.
    /// A broken user file is logged and skipped.
    pub fn load() -> Self {
        let mut base = embedded();

        if let Some(path) = user_config_path() {
            if path.exists() {
                match read_file(&path) {
                    Ok(user) => merge(&mut base, user),
                    Err(e) => {
                        log::warn!(target: "config", "ignoring config {}: {}", path.display(), e)
                    }
                }
            }
        }

        Self::from_file(base)
    }

    /// Embedded defaults overlaid with `path`. Fails if `path` cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut base = embedded();
        merge(&mut base, read_file(path)?);
        log::info!(target: "config", "loaded config from {}", path.display());
        Ok(Self::from_file(base))
    }

    fn from_file(file: ConfigFile) -> Self {
        Config {
            defaults: file.defaults,
            transport: file.transport,
            midi: file.midi,
            runtime: file.runtime,
        }
    }

    /// Initial parameter values.
    pub fn params(&self) -> ArpParams {
        let fallback = ArpParams::default();
        let d = &self.defaults;
        ArpParams {
            speed: d.speed.unwrap_or(fallback.speed),
            probability: d.probability.unwrap_or(fallback.probability),
            octaves: d.octaves.unwrap_or(fallback.octaves),
            direction: d
                .direction
                .as_deref()
                .and_then(ArpDirection::from_name)
                .unwrap_or(fallback.direction),
            ping_pong: d.ping_pong.unwrap_or(fallback.ping_pong),
            sync: d.sync.unwrap_or(fallback.sync),
            dotted: d.dotted.unwrap_or(fallback.dotted),
            triplet: d.triplet.unwrap_or(fallback.triplet),
        }
        .clamped()
    }

    pub fn transport(&self) -> TransportInfo {
        TransportInfo {
            tempo_bpm: self.transport.tempo_bpm,
            time_sig_numerator: self.transport.time_signature_numerator,
        }
    }

    pub fn client_name(&self) -> &str {
        self.midi.client_name.as_deref().unwrap_or("aarrow")
    }

    /// Zero-based MIDI channel for output (configured as 1-16).
    pub fn output_channel(&self) -> u8 {
        self.midi.output_channel.unwrap_or(1).clamp(1, 16) - 1
    }

    pub fn input_port(&self) -> Option<&str> {
        self.midi.input_port.as_deref()
    }

    pub fn output_port(&self) -> Option<&str> {
        self.midi.output_port.as_deref()
    }

    /// How often block telemetry is logged (clamped to 1..3600 s).
    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.runtime.stats_interval_secs.unwrap_or(10).clamp(1, 3600))
    }

    pub fn seed(&self) -> Option<u64> {
        self.runtime.seed
    }
}

pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("aarrow"))
}

fn user_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

fn embedded() -> ConfigFile {
    toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml")
}

fn read_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(toml::from_str::<ConfigFile>(&contents)?)
}

fn overlay<T>(base: &mut Option<T>, user: Option<T>) {
    if user.is_some() {
        *base = user;
    }
}

fn merge(base: &mut ConfigFile, user: ConfigFile) {
    let (b, u) = (&mut base.defaults, user.defaults);
    overlay(&mut b.speed, u.speed);
    overlay(&mut b.probability, u.probability);
    overlay(&mut b.octaves, u.octaves);
    overlay(&mut b.direction, u.direction);
    overlay(&mut b.ping_pong, u.ping_pong);
    overlay(&mut b.sync, u.sync);
    overlay(&mut b.dotted, u.dotted);
    overlay(&mut b.triplet, u.triplet);

    overlay(&mut base.transport.tempo_bpm, user.transport.tempo_bpm);
    overlay(
        &mut base.transport.time_signature_numerator,
        user.transport.time_signature_numerator,
    );

    let (b, u) = (&mut base.midi, user.midi);
    overlay(&mut b.client_name, u.client_name);
    overlay(&mut b.output_channel, u.output_channel);
    overlay(&mut b.input_port, u.input_port);
    overlay(&mut b.output_port, u.output_port);

    overlay(&mut base.runtime.stats_interval_secs, user.runtime.stats_interval_secs);
    overlay(&mut base.runtime.seed, user.runtime.seed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_config_parses_to_defaults() {
        let config = Config::from_file(embedded());
        assert_eq!(config.params(), ArpParams::default());
        assert_eq!(config.transport(), TransportInfo::default());
        assert_eq!(config.client_name(), "aarrow");
        assert_eq!(config.output_channel(), 0);
        assert_eq!(config.stats_interval(), Duration::from_secs(10));
        assert!(config.seed().is_none());
    }

    #[test]
    fn user_values_override_field_by_field() {
        let mut base = embedded();
        let user: ConfigFile = toml::from_str(
            r#"
            [defaults]
            octaves = 3
            direction = "random"

            [transport]
            tempo_bpm = 96.0

            [midi]
            output_channel = 10
            "#,
        )
        .unwrap();
        merge(&mut base, user);
        let config = Config::from_file(base);
        let params = config.params();
        assert_eq!(params.octaves, 3);
        assert_eq!(params.direction, ArpDirection::Random);
        assert_eq!(params.speed, 0.5);
        assert_eq!(config.transport().tempo_bpm, Some(96.0));
        assert_eq!(config.transport().time_sig_numerator, None);
        assert_eq!(config.output_channel(), 9);
        assert_eq!(config.client_name(), "aarrow");
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let mut base = embedded();
        let user: ConfigFile = toml::from_str(
            r#"
            [defaults]
            octaves = 9
            probability = 120
            direction = "sideways"
            [midi]
            output_channel = 0
            [runtime]
            stats_interval_secs = 0
            "#,
        )
        .unwrap();
        merge(&mut base, user);
        let config = Config::from_file(base);
        assert_eq!(config.params().octaves, 5);
        assert_eq!(config.params().probability, 99);
        assert_eq!(config.params().direction, ArpDirection::Up);
        assert_eq!(config.output_channel(), 0);
        assert_eq!(config.stats_interval(), Duration::from_secs(1));
    }
}
