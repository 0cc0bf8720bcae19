//! Held-note pool: the ordered set of pitches the sequencer walks.
//!
//! Every held base note is stored together with its octave-shifted copies.
//! Storage is a sorted `Vec<u8>` reserved for the whole MIDI range up front,
//! so inserts and removals never reallocate on the audio thread.

/// Lowest pitch the pool will hold.
pub const MIN_POOL_NOTE: i16 = 1;
/// Highest pitch the pool will hold.
pub const MAX_POOL_NOTE: i16 = 126;

/// Octave offsets scanned on note-off, in both directions. Wide enough to catch
/// copies added under either expansion sign.
const NOTE_OFF_OCTAVE_SPAN: i16 = 11;

#[derive(Debug, Clone)]
pub struct NotePool {
    notes: Vec<u8>, // sorted ascending, unique
}

impl Default for NotePool {
    fn default() -> Self {
        Self::new()
    }
}

impl NotePool {
    pub fn new() -> Self {
        Self {
            notes: Vec::with_capacity(128),
        }
    }

    /// Insert `note` and its octave copies `note + 12*i*sign` for `i` in `0..octaves`.
    /// Copies outside `[1, 126]` are dropped; input above 127 is ignored.
    pub fn note_on(&mut self, note: u8, octaves: u8, sign: i16) {
        if note > 127 {
            return;
        }
        let sign = if sign < 0 { -1 } else { 1 };
        for i in 0..octaves.max(1) as i16 {
            let pitch = note as i16 + 12 * i * sign;
            if (MIN_POOL_NOTE..=MAX_POOL_NOTE).contains(&pitch) {
                self.insert(pitch as u8);
            }
        }
    }

    /// Remove `note` and every pitch a multiple of 12 away within ±132 semitones.
    ///
    /// Covers copies added under either expansion sign, plus any other held
    /// note of the same pitch class.
    pub fn note_off(&mut self, note: u8) {
        if note > 127 {
            return;
        }
        for i in -NOTE_OFF_OCTAVE_SPAN..=NOTE_OFF_OCTAVE_SPAN {
            let pitch = note as i16 + 12 * i;
            if (0..=127).contains(&pitch) {
                self.remove(pitch as u8);
            }
        }
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Pitch at `index` in ascending order.
    pub fn at(&self, index: usize) -> Option<u8> {
        self.notes.get(index).copied()
    }

    pub fn contains(&self, note: u8) -> bool {
        self.notes.binary_search(&note).is_ok()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.notes
    }

    fn insert(&mut self, note: u8) {
        if let Err(pos) = self.notes.binary_search(&note) {
            self.notes.insert(pos, note);
        }
    }

    fn remove(&mut self, note: u8) {
        if let Ok(pos) = self.notes.binary_search(&note) {
            self.notes.remove(pos);
        }
    }
}
