use serde::{Deserialize, Serialize};

/// Host transport as seen at the start of a block. Either field may be
/// missing when the host has no running transport.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransportInfo {
    pub tempo_bpm: Option<f64>,
    pub time_sig_numerator: Option<u32>,
}

impl TransportInfo {
    pub fn new(tempo_bpm: f64, time_sig_numerator: u32) -> Self {
        Self {
            tempo_bpm: Some(tempo_bpm),
            time_sig_numerator: Some(time_sig_numerator),
        }
    }

    /// Tempo and numerator, only when both are present and usable.
    pub fn usable(&self) -> Option<(f64, u32)> {
        let tempo = self.tempo_bpm.filter(|t| t.is_finite() && *t > 0.0)?;
        let numerator = self.time_sig_numerator.filter(|n| *n > 0)?;
        Some((tempo, numerator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usable_requires_both_fields() {
        assert_eq!(TransportInfo::new(120.0, 4).usable(), Some((120.0, 4)));
        assert_eq!(TransportInfo::default().usable(), None);
        let no_sig = TransportInfo {
            tempo_bpm: Some(120.0),
            time_sig_numerator: None,
        };
        assert_eq!(no_sig.usable(), None);
    }

    #[test]
    fn zero_or_bogus_values_are_unusable() {
        assert_eq!(TransportInfo::new(0.0, 4).usable(), None);
        assert_eq!(TransportInfo::new(120.0, 0).usable(), None);
        assert_eq!(TransportInfo::new(f64::INFINITY, 4).usable(), None);
        assert_eq!(TransportInfo::new(-90.0, 3).usable(), None);
    }
}
