use aarrow_types::{ArpDirection, ArpParams, TransportInfo};

use crate::arp_state::ArpPlayState;
use crate::emitter;
use crate::midi_buffer::{MidiBuffer, MidiMessage};
use crate::note_pool::NotePool;
use crate::probability::{self, ProbabilityGate, ALWAYS_ROLL};
use crate::timing;

/// Events reserved in the output buffer up front.
pub const OUTPUT_CAPACITY: usize = 256;

/// Steps handled in one block. Each step writes at most two events and a
/// pending release adds one, so the output never outgrows its reservation.
/// Boundaries past the cap are dropped and the next step is due at once.
pub const MAX_STEPS_PER_BLOCK: usize = (OUTPUT_CAPACITY - 1) / 2;

/// What happened during one `process_block` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockReport {
    pub step_duration: u32,
    pub steps: u32,
    pub skipped: u32,
    pub notes_on: u32,
}

enum StepOutcome {
    Silent,
    Skipped,
    Sounded,
}

/// Monophonic arpeggiator driven once per audio block.
///
/// Owns the held-note pool, the sequencer state and the probability gate.
/// `process_block` consumes the block's incoming note events and replaces
/// them with the arpeggiated output.
#[derive(Debug, Clone)]
pub struct Arpeggiator {
    sample_rate: f64,
    pool: NotePool,
    state: ArpPlayState,
    gate: ProbabilityGate,
    pending_release: Option<u8>,
    scratch: MidiBuffer,
}

impl Arpeggiator {
    pub fn new(sample_rate: f64) -> Self {
        Self::with_gate(sample_rate, ProbabilityGate::new())
    }

    /// Deterministic random choices, for tests and reproducible renders.
    pub fn with_seed(sample_rate: f64, seed: u64) -> Self {
        Self::with_gate(sample_rate, ProbabilityGate::with_seed(seed))
    }

    fn with_gate(sample_rate: f64, gate: ProbabilityGate) -> Self {
        Self {
            sample_rate,
            pool: NotePool::new(),
            state: ArpPlayState::new(),
            gate,
            pending_release: None,
            scratch: MidiBuffer::with_capacity(OUTPUT_CAPACITY),
        }
    }

    /// Start a new processing session at `sample_rate`.
    pub fn prepare(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.reset();
    }

    /// Clear pool and sequencer. A note still sounding is released at the
    /// start of the next block.
    pub fn reset(&mut self) {
        self.pool.clear();
        if let Some(note) = self.state.reset() {
            self.pending_release = Some(note);
        }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.gate.reseed(seed);
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn pool(&self) -> &NotePool {
        &self.pool
    }

    pub fn state(&self) -> &ArpPlayState {
        &self.state
    }

    /// Run one block of `block_len` samples. `midi` holds the block's incoming
    /// events on entry and the arpeggiator's output on return.
    pub fn process_block(
        &mut self,
        params: &ArpParams,
        transport: &TransportInfo,
        block_len: u32,
        midi: &mut MidiBuffer,
    ) -> BlockReport {
        let params = params.clamped();
        self.scratch.clear();

        if let Some(note) = self.pending_release.take() {
            self.scratch.note_off(0, note);
        }

        let step_duration = timing::step_duration(&params, self.sample_rate, transport);
        let mut report = BlockReport {
            step_duration,
            ..BlockReport::default()
        };

        let sign = params.pitch_sign();
        for event in midi.iter() {
            match event.message {
                MidiMessage::NoteOn { note, .. } => self.pool.note_on(note, params.octaves, sign),
                MidiMessage::NoteOff { note } => self.pool.note_off(note),
            }
        }

        self.state.sync_heading(params.direction, params.ping_pong);

        let mut last_boundary = None;
        for offset in emitter::boundaries(step_duration, self.state.accumulator, block_len)
            .take(MAX_STEPS_PER_BLOCK)
        {
            report.steps += 1;
            match self.step(offset, &params) {
                StepOutcome::Sounded => report.notes_on += 1,
                StepOutcome::Skipped => report.skipped += 1,
                StepOutcome::Silent => {}
            }
            last_boundary = Some(offset);
        }
        self.state.accumulator = emitter::carry(self.state.accumulator, block_len, last_boundary);

        // Swap rather than rewrite the caller's buffer in place.
        midi.swap_with(&mut self.scratch);
        self.scratch.clear();
        report
    }

    fn step(&mut self, offset: u32, params: &ArpParams) -> StepOutcome {
        let release = self.state.last_sounding.take();

        if self.pool.is_empty() {
            emitter::emit_step(&mut self.scratch, offset, release, None);
            return StepOutcome::Silent;
        }

        let len = self.pool.len();
        let chance = match params.direction {
            ArpDirection::Random => {
                let roll = self.gate.roll(len);
                self.state.current_index = roll.index;
                roll.chance
            }
            ArpDirection::Up | ArpDirection::Down => {
                self.state.advance(len, params.ping_pong);
                ALWAYS_ROLL
            }
        };

        // The position has already moved, so a skipped step still advances the walk.
        if !probability::passes(chance, params.probability) {
            emitter::emit_step(&mut self.scratch, offset, release, None);
            return StepOutcome::Skipped;
        }

        let note = self.pool.at(self.state.current_index);
        emitter::emit_step(&mut self.scratch, offset, release, note);
        self.state.last_sounding = note;
        if note.is_some() {
            StepOutcome::Sounded
        } else {
            StepOutcome::Silent
        }
    }
}
