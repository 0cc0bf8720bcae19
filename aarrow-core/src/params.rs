//! Parameter access for everything outside the audio thread.
//!
//! `ParamStore` is the one place parameters are read and changed. Every change
//! is published to the audio thread as a whole `EngineSnapshot`.

use std::fmt;

use aarrow_audio::{EngineSnapshot, SnapshotWriter};
use aarrow_types::{
    ArpParams, Param, ParamId, ParamValue, TransportInfo, FREE_SPEED_DEFAULT, SYNC_SPEED_DEFAULT,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    UnknownParam(String),
    InvalidValue { param: &'static str, text: String },
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownParam(key) => write!(f, "unknown parameter '{}'", key),
            Self::InvalidValue { param, text } => {
                write!(f, "'{}' is not a valid value for {}", text, param)
            }
        }
    }
}

impl std::error::Error for ParamError {}

pub struct ParamStore {
    params: ArpParams,
    transport: TransportInfo,
    writer: Option<SnapshotWriter<EngineSnapshot>>,
}

impl ParamStore {
    /// Store without an audio thread attached yet.
    pub fn new(params: ArpParams, transport: TransportInfo) -> Self {
        Self {
            params: params.clamped(),
            transport,
            writer: None,
        }
    }

    /// Attach the audio thread's snapshot cell and publish the current values to it.
    pub fn attach(&mut self, writer: SnapshotWriter<EngineSnapshot>) {
        self.writer = Some(writer);
        self.publish();
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            params: self.params,
            transport: self.transport,
        }
    }

    pub fn params(&self) -> &ArpParams {
        &self.params
    }

    pub fn transport(&self) -> &TransportInfo {
        &self.transport
    }

    pub fn get(&self, id: ParamId) -> ParamValue {
        self.params.get(id)
    }

    /// Set one parameter. Switching BPM link moves speed onto the matching
    /// scale: the "1/4" note value when turned on, mid-speed when turned off.
    pub fn set(&mut self, id: ParamId, value: ParamValue) {
        let was_synced = self.params.sync;
        self.params.set(id, value);
        if id == ParamId::Sync && self.params.sync != was_synced {
            self.params.speed = if self.params.sync {
                SYNC_SPEED_DEFAULT
            } else {
                FREE_SPEED_DEFAULT
            };
        }
        log::debug!(target: "params", "{} = {}", id.key(), self.params.display(id));
        self.publish();
    }

    /// Parse `text` for the parameter named `key` and apply it.
    pub fn set_text(&mut self, key: &str, text: &str) -> Result<(), ParamError> {
        let id = ParamId::from_key(key).ok_or_else(|| ParamError::UnknownParam(key.to_string()))?;
        let mut param = Param::new(id, self.params.get(id));
        if !param.parse_and_set(text) {
            return Err(ParamError::InvalidValue {
                param: id.key(),
                text: text.to_string(),
            });
        }
        self.set(id, param.value);
        Ok(())
    }

    /// Replace every parameter at once, e.g. after loading a preset.
    pub fn replace(&mut self, params: ArpParams) {
        self.params = params.clamped();
        log::debug!(target: "params", "replaced all parameters");
        self.publish();
    }

    pub fn set_transport(&mut self, transport: TransportInfo) {
        self.transport = transport;
        self.publish();
    }

    /// One line per display panel, e.g. `Direction: Up  Return: off`.
    pub fn describe(&self) -> Vec<String> {
        aarrow_types::PANELS
            .iter()
            .map(|panel| {
                panel
                    .iter()
                    .map(|id| format!("{}: {}", id.descriptor().name, self.params.display(*id)))
                    .collect::<Vec<_>>()
                    .join("  ")
            })
            .collect()
    }

    fn publish(&mut self) {
        let snapshot = self.snapshot();
        if let Some(writer) = self.writer.as_mut() {
            writer.publish(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aarrow_audio::snapshot_cell;
    use aarrow_types::ArpDirection;

    fn store() -> ParamStore {
        ParamStore::new(ArpParams::default(), TransportInfo::default())
    }

    #[test]
    fn set_text_parses_and_publishes() {
        let mut store = store();
        let (writer, mut reader) = snapshot_cell(EngineSnapshot::default());
        store.attach(writer);

        store.set_text("octaves", "3").unwrap();
        store.set_text("direction", "down").unwrap();
        let snap = *reader.latest();
        assert_eq!(snap.params.octaves, 3);
        assert_eq!(snap.params.direction, ArpDirection::Down);
    }

    #[test]
    fn set_text_errors() {
        let mut store = store();
        assert_eq!(
            store.set_text("tempo", "120"),
            Err(ParamError::UnknownParam("tempo".into()))
        );
        assert!(matches!(
            store.set_text("prob", "often"),
            Err(ParamError::InvalidValue { param: "prob", .. })
        ));
        assert_eq!(store.params().probability, 1);
    }

    #[test]
    fn sync_toggle_moves_speed_scale() {
        let mut store = store();
        store.set_text("speed", "0.3").unwrap();
        store.set_text("sync", "on").unwrap();
        assert_eq!(store.params().speed, SYNC_SPEED_DEFAULT);
        assert_eq!(store.params().display(ParamId::Speed), "1/4");

        // Setting the same value again leaves speed alone.
        store.set_text("speed", "0.93").unwrap();
        store.set_text("sync", "on").unwrap();
        assert_eq!(store.params().speed, 0.93);

        store.set_text("sync", "off").unwrap();
        assert_eq!(store.params().speed, FREE_SPEED_DEFAULT);
    }

    #[test]
    fn replace_clamps() {
        let mut store = store();
        store.replace(ArpParams {
            octaves: 40,
            ..ArpParams::default()
        });
        assert_eq!(store.params().octaves, 5);
    }

    #[test]
    fn describe_lists_panels_in_order() {
        let lines = store().describe();
        assert_eq!(lines.len(), aarrow_types::PANELS.len());
        assert_eq!(lines[0], "Speed: 0.50");
        assert_eq!(lines[3], "Direction: Up  Return: off");
    }
}
