//! Locating step boundaries inside a block and writing their events.
//!
//! The accumulator counts samples since the last boundary, measured at the
//! start of the block. The first boundary of a block lands at
//! `clamp(step - acc, 0, block_len - 1)` whenever `step - acc <= block_len`;
//! later boundaries follow every `step` samples. A boundary due exactly at the
//! end of the block is taken on its last sample, one sample early.

use aarrow_types::NOTE_VELOCITY;

use crate::midi_buffer::MidiBuffer;

/// Iterator over the block-local offsets of every step boundary in a block.
#[derive(Debug, Clone)]
pub struct Boundaries {
    next: u64,
    step: u64,
    block_len: u64,
}

impl Iterator for Boundaries {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.next >= self.block_len {
            return None;
        }
        let offset = self.next as u32;
        self.next += self.step;
        Some(offset)
    }
}

/// Boundaries for a block of `block_len` samples with `step`-sample steps.
pub fn boundaries(step: u32, accumulator: u32, block_len: u32) -> Boundaries {
    let step = step.max(1) as u64;
    let block_len = block_len as u64;
    let until_due = step.saturating_sub(accumulator as u64);
    // Past the end of the block means no boundary this block.
    let first = if block_len == 0 || until_due > block_len {
        block_len
    } else {
        until_due.min(block_len.saturating_sub(1))
    };
    Boundaries {
        next: first,
        step,
        block_len,
    }
}

/// Accumulator value for the start of the next block.
pub fn carry(accumulator: u32, block_len: u32, last_boundary: Option<u32>) -> u32 {
    match last_boundary {
        Some(offset) => block_len - offset,
        None => accumulator.saturating_add(block_len),
    }
}

/// Write one step: release the previous note, then start the new one, both at `offset`.
pub fn emit_step(out: &mut MidiBuffer, offset: u32, release: Option<u8>, sound: Option<u8>) {
    if let Some(note) = release {
        out.note_off(offset, note);
    }
    if let Some(note) = sound {
        out.note_on(offset, note, NOTE_VELOCITY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi_buffer::{MidiMessage, TimedEvent};

    #[test]
    fn fresh_start_fires_one_step_in() {
        let offsets: Vec<u32> = boundaries(256, 0, 512).collect();
        assert_eq!(offsets, vec![256]);
        assert_eq!(carry(0, 512, Some(256)), 256);
    }

    #[test]
    fn carried_accumulator_fires_at_block_start() {
        let offsets: Vec<u32> = boundaries(256, 256, 512).collect();
        assert_eq!(offsets, vec![0, 256]);
    }

    #[test]
    fn long_step_spans_blocks() {
        assert_eq!(boundaries(1000, 0, 512).count(), 0);
        assert_eq!(carry(0, 512, None), 512);
        let offsets: Vec<u32> = boundaries(1000, 512, 512).collect();
        assert_eq!(offsets, vec![488]);
        assert_eq!(carry(512, 512, Some(488)), 24);
    }

    #[test]
    fn boundary_due_at_block_end_takes_last_sample() {
        let offsets: Vec<u32> = boundaries(512, 0, 512).collect();
        assert_eq!(offsets, vec![511]);
        assert_eq!(carry(0, 512, Some(511)), 1);
        // Steady state: one step per block, always on the last sample.
        let offsets: Vec<u32> = boundaries(512, 1, 512).collect();
        assert_eq!(offsets, vec![511]);
    }

    #[test]
    fn boundary_just_past_block_end_waits() {
        assert_eq!(boundaries(513, 0, 512).count(), 0);
        let offsets: Vec<u32> = boundaries(513, 512, 512).collect();
        assert_eq!(offsets, vec![0]);
    }

    #[test]
    fn overdue_step_clamps_to_block_start() {
        // Step shortened below the elapsed time: fire immediately.
        let offsets: Vec<u32> = boundaries(100, 300, 64).collect();
        assert_eq!(offsets, vec![0]);
    }

    #[test]
    fn empty_block_has_no_boundaries() {
        assert_eq!(boundaries(1, 0, 0).count(), 0);
        assert_eq!(carry(7, 0, None), 7);
    }

    #[test]
    fn release_precedes_note_on() {
        let mut out = MidiBuffer::new();
        emit_step(&mut out, 10, Some(60), Some(64));
        assert_eq!(
            out.as_slice(),
            &[
                TimedEvent { offset: 10, message: MidiMessage::NoteOff { note: 60 } },
                TimedEvent { offset: 10, message: MidiMessage::NoteOn { note: 64, velocity: NOTE_VELOCITY } },
            ]
        );
    }
}
