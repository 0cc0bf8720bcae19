use serde::{Deserialize, Serialize};

/// Identifies one of the arpeggiator's user parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamId {
    Speed,
    Probability,
    Octaves,
    Sync,
    Return,
    Dot,
    Triplet,
    Direction,
}

impl ParamId {
    pub const ALL: [ParamId; 8] = [
        ParamId::Speed,
        ParamId::Probability,
        ParamId::Octaves,
        ParamId::Sync,
        ParamId::Return,
        ParamId::Dot,
        ParamId::Triplet,
        ParamId::Direction,
    ];

    /// Stable key used in presets, config and the command line.
    pub fn key(&self) -> &'static str {
        self.descriptor().key
    }

    pub fn from_key(key: &str) -> Option<ParamId> {
        PARAM_LAYOUT
            .iter()
            .find(|d| d.key.eq_ignore_ascii_case(key))
            .map(|d| d.id)
    }

    pub fn descriptor(&self) -> &'static ParamDescriptor {
        // PARAM_LAYOUT is ordered like ParamId::ALL
        &PARAM_LAYOUT[*self as usize]
    }
}

/// How a parameter is presented to the user. Chosen from the descriptor,
/// never from the runtime type of a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Slider,
    Stepper,
    Toggle,
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    pub id: ParamId,
    pub key: &'static str,
    pub name: &'static str,
    pub kind: ControlKind,
    pub min: f64,
    pub max: f64,
    pub default: ParamValue,
}

pub const DIRECTION_CHOICES: &[&str] = &["Up", "Down", "Random"];

pub const PARAM_LAYOUT: [ParamDescriptor; 8] = [
    ParamDescriptor {
        id: ParamId::Speed,
        key: "speed",
        name: "Speed",
        kind: ControlKind::Slider,
        min: 0.0,
        max: 1.0,
        default: ParamValue::Float(0.5),
    },
    ParamDescriptor {
        id: ParamId::Probability,
        key: "prob",
        name: "Rest Probability",
        kind: ControlKind::Stepper,
        min: 0.0,
        max: 99.0,
        default: ParamValue::Int(1),
    },
    ParamDescriptor {
        id: ParamId::Octaves,
        key: "octaves",
        name: "Octave Count",
        kind: ControlKind::Stepper,
        min: 1.0,
        max: 5.0,
        default: ParamValue::Int(2),
    },
    ParamDescriptor {
        id: ParamId::Sync,
        key: "sync",
        name: "BPM Link",
        kind: ControlKind::Toggle,
        min: 0.0,
        max: 1.0,
        default: ParamValue::Bool(false),
    },
    ParamDescriptor {
        id: ParamId::Return,
        key: "return",
        name: "Return",
        kind: ControlKind::Toggle,
        min: 0.0,
        max: 1.0,
        default: ParamValue::Bool(false),
    },
    ParamDescriptor {
        id: ParamId::Dot,
        key: "d",
        name: "Dot",
        kind: ControlKind::Toggle,
        min: 0.0,
        max: 1.0,
        default: ParamValue::Bool(false),
    },
    ParamDescriptor {
        id: ParamId::Triplet,
        key: "trip",
        name: "Trip",
        kind: ControlKind::Toggle,
        min: 0.0,
        max: 1.0,
        default: ParamValue::Bool(false),
    },
    ParamDescriptor {
        id: ParamId::Direction,
        key: "direction",
        name: "Direction",
        kind: ControlKind::Choice(DIRECTION_CHOICES),
        min: 0.0,
        max: 2.0,
        default: ParamValue::Choice(0),
    },
];

/// Display grouping, top to bottom.
pub const PANELS: &[&[ParamId]] = &[
    &[ParamId::Speed],
    &[ParamId::Sync, ParamId::Dot, ParamId::Triplet],
    &[ParamId::Octaves],
    &[ParamId::Direction, ParamId::Return],
    &[ParamId::Probability],
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Float(f64),
    Int(i32),
    Bool(bool),
    Choice(usize),
}

impl ParamValue {
    pub fn to_f64(&self) -> f64 {
        match self {
            ParamValue::Float(v) => *v,
            ParamValue::Int(v) => *v as f64,
            ParamValue::Bool(v) => if *v { 1.0 } else { 0.0 },
            ParamValue::Choice(v) => *v as f64,
        }
    }
}

/// A parameter value bound to its descriptor, for text entry and bounded edits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param {
    pub descriptor: &'static ParamDescriptor,
    pub value: ParamValue,
}

impl Param {
    pub fn new(id: ParamId, value: ParamValue) -> Self {
        Self {
            descriptor: id.descriptor(),
            value,
        }
    }

    /// Parse a string and set the value, clamping to bounds. Returns true on success.
    pub fn parse_and_set(&mut self, text: &str) -> bool {
        let text = text.trim();
        let d = self.descriptor;
        match (&mut self.value, d.kind) {
            (ParamValue::Float(ref mut v), _) => match text.parse::<f64>() {
                Ok(parsed) if parsed.is_finite() => {
                    *v = parsed.clamp(d.min, d.max);
                    true
                }
                _ => false,
            },
            (ParamValue::Int(ref mut v), _) => match text.parse::<i32>() {
                Ok(parsed) => {
                    *v = parsed.clamp(d.min as i32, d.max as i32);
                    true
                }
                Err(_) => false,
            },
            (ParamValue::Bool(ref mut v), _) => match text.to_ascii_lowercase().as_str() {
                "1" | "on" | "true" | "yes" => {
                    *v = true;
                    true
                }
                "0" | "off" | "false" | "no" => {
                    *v = false;
                    true
                }
                _ => false,
            },
            (ParamValue::Choice(ref mut v), ControlKind::Choice(options)) => {
                if let Some(idx) = options.iter().position(|o| o.eq_ignore_ascii_case(text)) {
                    *v = idx;
                    true
                } else if let Ok(idx) = text.parse::<usize>() {
                    *v = idx.min(options.len().saturating_sub(1));
                    true
                } else {
                    false
                }
            }
            (ParamValue::Choice(_), _) => false,
        }
    }
}
