//! MIDI output: arpeggiated notes onto a port.

use midir::{MidiOutput, MidiOutputConnection};

use aarrow_audio::MidiMessage;

use super::{find_port, MidiPortInfo};

/// Raw bytes for `message` on zero-based `channel`.
pub fn encode(message: MidiMessage, channel: u8) -> [u8; 3] {
    let channel = channel & 0x0F;
    match message {
        MidiMessage::NoteOn { note, velocity } => [0x90 | channel, note & 0x7F, velocity & 0x7F],
        MidiMessage::NoteOff { note } => [0x80 | channel, note & 0x7F, 0],
    }
}

pub struct MidiOutputManager {
    client_name: String,
    midi_out: Option<MidiOutput>,
    connection: Option<MidiOutputConnection>,
    connected_port_name: Option<String>,
    available_ports: Vec<MidiPortInfo>,
}

impl MidiOutputManager {
    pub fn new(client_name: &str) -> Self {
        let mut manager = Self {
            client_name: client_name.to_string(),
            midi_out: MidiOutput::new(client_name).ok(),
            connection: None,
            connected_port_name: None,
            available_ports: Vec::new(),
        };
        manager.refresh_ports();
        manager
    }

    pub fn refresh_ports(&mut self) {
        self.available_ports.clear();

        if let Some(ref midi_out) = self.midi_out {
            for (index, port) in midi_out.ports().iter().enumerate() {
                if let Ok(name) = midi_out.port_name(port) {
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

    /// Connect by port index or name substring.
    pub fn connect(&mut self, selector: &str) -> Result<(), String> {
        let index = find_port(&self.available_ports, selector)
            .ok_or_else(|| format!("No MIDI output matches '{}'", selector))?;
        self.connect_index(index)
    }

    pub fn connect_index(&mut self, port_index: usize) -> Result<(), String> {
        self.disconnect();

        let midi_out = MidiOutput::new(&self.client_name).map_err(|e| e.to_string())?;
        let ports = midi_out.ports();
        let port = ports
            .get(port_index)
            .ok_or_else(|| format!("Invalid port index: {}", port_index))?;
        let port_name = midi_out
            .port_name(port)
            .unwrap_or_else(|_| "Unknown".to_string());

        let connection = midi_out
            .connect(port, &format!("{}-output", self.client_name))
            .map_err(|e| e.to_string())?;

        log::info!(target: "midi", "output connected to {}", port_name);
        self.connection = Some(connection);
        self.connected_port_name = Some(port_name);
        self.midi_out = MidiOutput::new(&self.client_name).ok();
        Ok(())
    }

    pub fn disconnect(&mut self) {
        if let Some(conn) = self.connection.take() {
            conn.close();
            log::info!(target: "midi", "output disconnected");
        }
        self.connected_port_name = None;
    }

    /// Send one message. Without a connection this is a no-op.
    pub fn send(&mut self, message: MidiMessage, channel: u8) -> Result<(), String> {
        match self.connection.as_mut() {
            Some(conn) => conn.send(&encode(message, channel)).map_err(|e| e.to_string()),
            None => Ok(()),
        }
    }
}

impl Drop for MidiOutputManager {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_note_on_and_off() {
        assert_eq!(encode(MidiMessage::NoteOn { note: 60, velocity: 84 }, 0), [0x90, 60, 84]);
        assert_eq!(encode(MidiMessage::NoteOff { note: 60 }, 9), [0x89, 60, 0]);
    }

    #[test]
    fn channel_and_data_bytes_are_masked() {
        assert_eq!(encode(MidiMessage::NoteOn { note: 200, velocity: 255 }, 17), [0x91, 72, 127]);
    }

    #[test]
    fn send_without_connection_is_noop() {
        let mut out = MidiOutputManager {
            client_name: "test".into(),
            midi_out: None,
            connection: None,
            connected_port_name: None,
            available_ports: Vec::new(),
        };
        assert!(out.send(MidiMessage::NoteOff { note: 1 }, 0).is_ok());
        assert!(!out.is_connected());
    }
}
