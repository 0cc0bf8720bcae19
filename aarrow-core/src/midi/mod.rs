//! MIDI input from hardware or virtual ports.

pub mod output;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use midir::{Ignore, MidiInput, MidiInputConnection};

use aarrow_audio::MidiMessage;

pub use output::{encode, MidiOutputManager};

/// Input events buffered between the MIDI thread and the audio callback.
pub const INPUT_QUEUE_CAPACITY: usize = 512;

/// A held-note change arriving from the keyboard side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
}

impl InputEvent {
    pub fn to_message(self) -> MidiMessage {
        match self {
            Self::NoteOn { note, velocity } => MidiMessage::NoteOn { note, velocity },
            Self::NoteOff { note } => MidiMessage::NoteOff { note },
        }
    }
}

/// Information about an available MIDI port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiPortInfo {
    pub index: usize,
    pub name: String,
}

/// Resolve a port by index or, failing that, by case-insensitive name substring.
pub fn find_port(ports: &[MidiPortInfo], selector: &str) -> Option<usize> {
    let selector = selector.trim();
    if let Ok(index) = selector.parse::<usize>() {
        return ports.iter().find(|p| p.index == index).map(|p| p.index);
    }
    let needle = selector.to_lowercase();
    ports
        .iter()
        .find(|p| p.name.to_lowercase().contains(&needle))
        .map(|p| p.index)
}

/// MIDI input manager
pub struct MidiInputManager {
    client_name: String,
    midi_in: Option<MidiInput>,
    connection: Option<MidiInputConnection<()>>,
    event_sender: Sender<InputEvent>,
    event_receiver: Receiver<InputEvent>,
    connected_port_name: Option<String>,
    available_ports: Vec<MidiPortInfo>,
}

impl MidiInputManager {
    pub fn new(client_name: &str) -> Self {
        let (event_sender, event_receiver) = crossbeam_channel::bounded(INPUT_QUEUE_CAPACITY);
        let mut manager = Self {
            client_name: client_name.to_string(),
            midi_in: MidiInput::new(client_name).ok(),
            connection: None,
            event_sender,
            event_receiver,
            connected_port_name: None,
            available_ports: Vec::new(),
        };
        manager.refresh_ports();
        manager
    }

    /// Refresh the list of available MIDI input ports
    pub fn refresh_ports(&mut self) {
        self.available_ports.clear();

        if let Some(ref midi_in) = self.midi_in {
            for (index, port) in midi_in.ports().iter().enumerate() {
                if let Ok(name) = midi_in.port_name(port) {
                    self.available_ports.push(MidiPortInfo { index, name });
                }
            }
        }
    }

    pub fn list_ports(&self) -> &[MidiPortInfo] {
        &self.available_ports
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn connected_port_name(&self) -> Option<&str> {
        self.connected_port_name.as_deref()
    }

    /// Receiving end for the audio callback. Events queue here once connected.
    pub fn receiver(&self) -> Receiver<InputEvent> {
        self.event_receiver.clone()
    }

    /// Connect by port index or name substring.
    pub fn connect(&mut self, selector: &str) -> Result<(), String> {
        let index = find_port(&self.available_ports, selector)
            .ok_or_else(|| format!("No MIDI input matches '{}'", selector))?;
        self.connect_index(index)
    }

    pub fn connect_index(&mut self, port_index: usize) -> Result<(), String> {
        self.disconnect();

        // connect() consumes the MidiInput, so make a fresh one for it.
        let mut midi_in = MidiInput::new(&self.client_name).map_err(|e| e.to_string())?;
        midi_in.ignore(Ignore::All);
        let ports = midi_in.ports();
        let port = ports
            .get(port_index)
            .ok_or_else(|| format!("Invalid port index: {}", port_index))?;
        let port_name = midi_in
            .port_name(port)
            .unwrap_or_else(|_| "Unknown".to_string());

        let tx = self.event_sender.clone();
        let connection = midi_in
            .connect(
                port,
                &format!("{}-input", self.client_name),
                move |_timestamp, message, _| {
                    if let Some(event) = parse_midi_message(message) {
                        if let Err(TrySendError::Full(_)) = tx.try_send(event) {
                            log::warn!(target: "midi", "input queue full, dropping {:?}", event);
                        }
                    }
                },
                (),
            )
            .map_err(|e| e.to_string())?;

        log::info!(target: "midi", "input connected to {}", port_name);
        self.connection = Some(connection);
        self.connected_port_name = Some(port_name);
        self.midi_in = MidiInput::new(&self.client_name).ok();
        Ok(())
    }

    pub fn disconnect(&mut self) {
        if let Some(conn) = self.connection.take() {
            conn.close();
            log::info!(target: "midi", "input disconnected");
        }
        self.connected_port_name = None;
    }
}

impl Drop for MidiInputManager {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Note-on with velocity 0 counts as note-off. Anything that is not a note
/// message is ignored.
pub fn parse_midi_message(data: &[u8]) -> Option<InputEvent> {
    let (&status, rest) = data.split_first()?;
    if rest.len() < 2 {
        return None;
    }
    let (note, velocity) = (rest[0] & 0x7F, rest[1] & 0x7F);

    match status & 0xF0 {
        0x80 => Some(InputEvent::NoteOff { note }),
        0x90 if velocity == 0 => Some(InputEvent::NoteOff { note }),
        0x90 => Some(InputEvent::NoteOn { note, velocity }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_note_messages_on_any_channel() {
        assert_eq!(
            parse_midi_message(&[0x90, 60, 100]),
            Some(InputEvent::NoteOn { note: 60, velocity: 100 })
        );
        assert_eq!(
            parse_midi_message(&[0x9F, 61, 1]),
            Some(InputEvent::NoteOn { note: 61, velocity: 1 })
        );
        assert_eq!(parse_midi_message(&[0x83, 60, 64]), Some(InputEvent::NoteOff { note: 60 }));
    }

    #[test]
    fn zero_velocity_note_on_is_note_off() {
        assert_eq!(parse_midi_message(&[0x92, 67, 0]), Some(InputEvent::NoteOff { note: 67 }));
    }

    #[test]
    fn ignores_other_and_short_messages() {
        assert_eq!(parse_midi_message(&[]), None);
        assert_eq!(parse_midi_message(&[0x90, 60]), None);
        assert_eq!(parse_midi_message(&[0xB0, 1, 64]), None);
        assert_eq!(parse_midi_message(&[0xE0, 0, 64]), None);
        assert_eq!(parse_midi_message(&[0xF8]), None);
    }

    #[test]
    fn input_event_maps_to_message() {
        assert_eq!(
            InputEvent::NoteOn { note: 1, velocity: 2 }.to_message(),
            MidiMessage::NoteOn { note: 1, velocity: 2 }
        );
        assert_eq!(InputEvent::NoteOff { note: 3 }.to_message(), MidiMessage::NoteOff { note: 3 });
    }

    #[test]
    fn find_port_by_index_or_name() {
        let ports = vec![
            MidiPortInfo { index: 0, name: "Midi Through:0".into() },
            MidiPortInfo { index: 1, name: "KeyStep 37 MIDI 1".into() },
        ];
        assert_eq!(find_port(&ports, "1"), Some(1));
        assert_eq!(find_port(&ports, "7"), None);
        assert_eq!(find_port(&ports, "keystep"), Some(1));
        assert_eq!(find_port(&ports, "launchpad"), None);
    }
}
