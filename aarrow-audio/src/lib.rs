//! Real-time arpeggiator core.
//!
//! Everything here runs inside the host's audio callback: no locks, no
//! blocking, no allocation once buffers are warmed up, and no logging.

pub mod arp_state;
pub mod arpeggiator_tick;
pub mod emitter;
pub mod midi_buffer;
pub mod note_pool;
pub mod probability;
pub mod snapshot;
pub mod telemetry;
pub mod timing;
pub mod triple_buffer;

pub use arpeggiator_tick::{Arpeggiator, BlockReport};
pub use midi_buffer::{MidiBuffer, MidiMessage, TimedEvent};
pub use note_pool::NotePool;
pub use snapshot::EngineSnapshot;
pub use telemetry::{BlockTelemetry, TelemetrySummary};
pub use triple_buffer::{snapshot_cell, SnapshotReader, SnapshotWriter};
