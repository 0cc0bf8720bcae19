//! # aarrow-types
//!
//! Parameter and transport types shared by the arpeggiator engine and the
//! shell that drives it. Nothing in here touches the audio thread directly;
//! the engine only ever sees `Copy` snapshots of these values.

mod param;
pub mod state;

pub use param::{ControlKind, Param, ParamDescriptor, ParamId, ParamValue, PANELS, PARAM_LAYOUT};

// Re-export all state types at crate root for convenience
pub use state::*;
