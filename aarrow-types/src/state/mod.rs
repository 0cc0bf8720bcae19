pub mod arpeggiator;
pub mod transport;

pub use arpeggiator::{
    ArpDirection, ArpParams, FREE_SPEED_DEFAULT, NOTE_VELOCITY, SYNC_SPEED_DEFAULT,
};
pub use transport::TransportInfo;
