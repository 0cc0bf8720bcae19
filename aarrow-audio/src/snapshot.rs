use aarrow_types::{ArpParams, TransportInfo};

/// Everything the audio thread reads at the top of a block.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineSnapshot {
    pub params: ArpParams,
    pub transport: TransportInfo,
}
