use aarrow_types::ArpDirection;

/// Walking direction for Up/Down stepping. Ping-pong flips it at the pool ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    Up,
    Down,
}

/// Step sequencer state tracked on the audio thread.
#[derive(Debug, Clone, Default)]
pub struct ArpPlayState {
    pub current_index: usize,      // Position within the ordered pool
    pub last_sounding: Option<u8>, // Currently sounding pitch (for release)
    pub heading: Option<Heading>,  // None until the first block of a session
    pub accumulator: u32,          // Samples since the last step boundary
}

impl ArpPlayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idle when nothing is sounding; a held pool alone does not make it Running.
    pub fn is_idle(&self) -> bool {
        self.last_sounding.is_none()
    }

    /// Bring the heading in line with the direction parameter.
    ///
    /// Without ping-pong the heading simply mirrors Up/Down. With ping-pong it is
    /// only seeded from the parameter once and afterwards changed by flips.
    pub fn sync_heading(&mut self, direction: ArpDirection, ping_pong: bool) {
        let wanted = match direction {
            ArpDirection::Up => Heading::Up,
            ArpDirection::Down => Heading::Down,
            ArpDirection::Random => return,
        };
        if !ping_pong || self.heading.is_none() {
            self.heading = Some(wanted);
        }
    }

    /// Move to the next index of a pool of `pool_len` notes (non-zero) following
    /// the heading, flipping it at the ends when ping-pong is on.
    pub fn advance(&mut self, pool_len: usize, ping_pong: bool) -> usize {
        let current = self.current_index % pool_len;
        let next = match self.heading.unwrap_or(Heading::Up) {
            Heading::Up => {
                let next = (current + 1) % pool_len;
                if ping_pong && next == 0 {
                    self.heading = Some(Heading::Down);
                }
                next
            }
            Heading::Down => {
                let next = pool_len - ((pool_len - current) % pool_len) - 1;
                if ping_pong && next == 0 {
                    self.heading = Some(Heading::Up);
                }
                next
            }
        };
        self.current_index = next;
        next
    }

    /// Forget everything from the previous session except a sounding note,
    /// which is returned so the caller can release it.
    pub fn reset(&mut self) -> Option<u8> {
        let sounding = self.last_sounding.take();
        *self = Self::default();
        sounding
    }
}
