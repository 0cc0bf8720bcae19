use serde::{Deserialize, Serialize};

use crate::param::{ParamId, ParamValue};

/// Note-on velocity for every arpeggiated note. Input velocity is not passed through.
pub const NOTE_VELOCITY: u8 = 84;

/// Speed value the synced display snaps to when BPM link is switched on ("1/4").
pub const SYNC_SPEED_DEFAULT: f64 = 0.92;
/// Speed value restored when BPM link is switched off.
pub const FREE_SPEED_DEFAULT: f64 = 0.5;

/// Arpeggiator parameter snapshot. The engine reads one of these per block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArpParams {
    pub speed: f64,          // 0.0-1.0
    pub probability: u8,     // 0-99, skip threshold
    pub octaves: u8,         // 1-5
    pub sync: bool,
    pub ping_pong: bool,
    pub dotted: bool,
    pub triplet: bool,
    pub direction: ArpDirection,
}

impl Default for ArpParams {
    fn default() -> Self {
        Self {
            speed: FREE_SPEED_DEFAULT,
            probability: 1,
            octaves: 2,
            sync: false,
            ping_pong: false,
            dotted: false,
            triplet: false,
            direction: ArpDirection::Up,
        }
    }
}

impl ArpParams {
    /// Copy with every field forced into its legal range.
    pub fn clamped(&self) -> Self {
        let speed = if self.speed.is_finite() {
            self.speed.clamp(0.0, 1.0)
        } else {
            FREE_SPEED_DEFAULT
        };
        Self {
            speed,
            probability: self.probability.min(99),
            octaves: self.octaves.clamp(1, 5),
            ..*self
        }
    }

    /// Sign applied to octave expansion: downward when the direction is Down.
    pub fn pitch_sign(&self) -> i16 {
        if self.direction == ArpDirection::Down {
            -1
        } else {
            1
        }
    }

    pub fn get(&self, id: ParamId) -> ParamValue {
        match id {
            ParamId::Speed => ParamValue::Float(self.speed),
            ParamId::Probability => ParamValue::Int(self.probability as i32),
            ParamId::Octaves => ParamValue::Int(self.octaves as i32),
            ParamId::Sync => ParamValue::Bool(self.sync),
            ParamId::Return => ParamValue::Bool(self.ping_pong),
            ParamId::Dot => ParamValue::Bool(self.dotted),
            ParamId::Triplet => ParamValue::Bool(self.triplet),
            ParamId::Direction => ParamValue::Choice(self.direction.index()),
        }
    }

    /// Set a parameter, clamping into range. Values of the wrong type are ignored.
    pub fn set(&mut self, id: ParamId, value: ParamValue) {
        match (id, value) {
            (ParamId::Speed, ParamValue::Float(v)) if v.is_finite() => {
                self.speed = v.clamp(0.0, 1.0)
            }
            (ParamId::Probability, ParamValue::Int(v)) => self.probability = v.clamp(0, 99) as u8,
            (ParamId::Octaves, ParamValue::Int(v)) => self.octaves = v.clamp(1, 5) as u8,
            (ParamId::Sync, ParamValue::Bool(v)) => self.sync = v,
            (ParamId::Return, ParamValue::Bool(v)) => self.ping_pong = v,
            (ParamId::Dot, ParamValue::Bool(v)) => self.dotted = v,
            (ParamId::Triplet, ParamValue::Bool(v)) => self.triplet = v,
            (ParamId::Direction, ParamValue::Choice(i)) => {
                self.direction = ArpDirection::from_index(i)
            }
            _ => {}
        }
    }

    /// Human-readable value. With BPM link on, speed reads as a note value.
    pub fn display(&self, id: ParamId) -> String {
        match id {
            ParamId::Speed if self.sync => {
                let f = (self.speed * 100.0).ceil() as i32;
                match f {
                    90 => "1".to_string(),
                    91 => "1/2".to_string(),
                    92 => "1/4".to_string(),
                    93 => "1/8".to_string(),
                    94 => "1/16".to_string(),
                    _ => f.to_string(),
                }
            }
            ParamId::Speed => format!("{:.2}", self.speed),
            ParamId::Direction => self.direction.name().to_string(),
            _ => match self.get(id) {
                ParamValue::Bool(v) => (if v { "on" } else { "off" }).to_string(),
                ParamValue::Int(v) => v.to_string(),
                other => format!("{:.2}", other.to_f64()),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArpDirection {
    #[default]
    Up,
    Down,
    Random,
}

impl ArpDirection {
    pub fn name(&self) -> &'static str {
        match self {
            ArpDirection::Up => "Up",
            ArpDirection::Down => "Down",
            ArpDirection::Random => "Random",
        }
    }

    pub fn from_name(name: &str) -> Option<ArpDirection> {
        match name.to_ascii_lowercase().as_str() {
            "up" => Some(ArpDirection::Up),
            "down" => Some(ArpDirection::Down),
            "random" => Some(ArpDirection::Random),
            _ => None,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            ArpDirection::Up => 0,
            ArpDirection::Down => 1,
            ArpDirection::Random => 2,
        }
    }

    /// Out-of-range indices saturate to the last choice.
    pub fn from_index(index: usize) -> ArpDirection {
        match index {
            0 => ArpDirection::Up,
            1 => ArpDirection::Down,
            _ => ArpDirection::Random,
        }
    }

    pub fn next(&self) -> ArpDirection {
        match self {
            ArpDirection::Up => ArpDirection::Down,
            ArpDirection::Down => ArpDirection::Random,
            ArpDirection::Random => ArpDirection::Up,
        }
    }

    pub fn prev(&self) -> ArpDirection {
        match self {
            ArpDirection::Up => ArpDirection::Random,
            ArpDirection::Down => ArpDirection::Up,
            ArpDirection::Random => ArpDirection::Down,
        }
    }
}
