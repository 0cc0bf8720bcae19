/// Note messages the arpeggiator consumes and produces. Channel is applied by
/// whoever puts the bytes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
}

/// A message at a sample offset within the current block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent {
    pub offset: u32,
    pub message: MidiMessage,
}

/// Per-block event list, ordered by offset as events are pushed.
#[derive(Debug, Clone, Default)]
pub struct MidiBuffer {
    events: Vec<TimedEvent>,
}

impl MidiBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, offset: u32, message: MidiMessage) {
        self.events.push(TimedEvent { offset, message });
    }

    pub fn note_on(&mut self, offset: u32, note: u8, velocity: u8) {
        self.push(offset, MidiMessage::NoteOn { note, velocity });
    }

    pub fn note_off(&mut self, offset: u32, note: u8) {
        self.push(offset, MidiMessage::NoteOff { note });
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn capacity(&self) -> usize {
        self.events.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimedEvent> {
        self.events.iter()
    }

    pub fn as_slice(&self) -> &[TimedEvent] {
        &self.events
    }

    /// Exchange contents with `other`. Both keep their allocations.
    pub fn swap_with(&mut self, other: &mut MidiBuffer) {
        std::mem::swap(&mut self.events, &mut other.events);
    }
}

impl<'a> IntoIterator for &'a MidiBuffer {
    type Item = &'a TimedEvent;
    type IntoIter = std::slice::Iter<'a, TimedEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
