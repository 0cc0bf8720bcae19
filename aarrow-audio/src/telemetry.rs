//! Block processing telemetry.
//!
//! Fixed-size ring of per-block processing times plus running step counters.
//! Recording never allocates, so it can run inside the audio callback.

use std::time::Duration;

use crate::arpeggiator_tick::BlockReport;

/// Ring buffer size for block duration samples.
const BLOCK_BUFFER_SIZE: usize = 256;

/// Snapshot of the collected metrics, handed to whoever logs them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetrySummary {
    pub avg_us: u32,
    pub max_us: u32,
    pub p95_us: u32,
    pub overruns: u64,
    pub blocks: u64,
    pub steps: u64,
    pub skipped: u64,
    pub notes_on: u64,
    pub last_step_duration: u32,
    /// Events the output queue had no room for.
    pub dropped_events: u64,
}

pub struct BlockTelemetry {
    durations_us: [u32; BLOCK_BUFFER_SIZE],
    idx: usize,
    sample_count: usize,
    max_us: u32,
    overruns: u64,
    blocks: u64,
    steps: u64,
    skipped: u64,
    notes_on: u64,
    last_step_duration: u32,
    dropped_events: u64,
}

impl Default for BlockTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockTelemetry {
    pub fn new() -> Self {
        Self {
            durations_us: [0; BLOCK_BUFFER_SIZE],
            idx: 0,
            sample_count: 0,
            max_us: 0,
            overruns: 0,
            blocks: 0,
            steps: 0,
            skipped: 0,
            notes_on: 0,
            last_step_duration: 0,
            dropped_events: 0,
        }
    }

    /// Record one processed block.
    ///
    /// `budget` is the real-time length of the block; taking longer is an overrun.
    #[inline]
    pub fn record(&mut self, elapsed: Duration, budget: Duration, report: &BlockReport) {
        let us = elapsed.as_micros().min(u32::MAX as u128) as u32;

        self.durations_us[self.idx] = us;
        self.idx = (self.idx + 1) % BLOCK_BUFFER_SIZE;
        if self.sample_count < BLOCK_BUFFER_SIZE {
            self.sample_count += 1;
        }
        self.max_us = self.max_us.max(us);
        if elapsed > budget {
            self.overruns += 1;
        }

        self.blocks += 1;
        self.steps += report.steps as u64;
        self.skipped += report.skipped as u64;
        self.notes_on += report.notes_on as u64;
        self.last_step_duration = report.step_duration;
    }

    #[inline]
    pub fn record_dropped(&mut self, count: u32) {
        self.dropped_events += count as u64;
    }

    /// Current metrics. Resets the max for the next window; counters stay cumulative.
    pub fn take_summary(&mut self) -> TelemetrySummary {
        let mut summary = TelemetrySummary {
            overruns: self.overruns,
            blocks: self.blocks,
            steps: self.steps,
            skipped: self.skipped,
            notes_on: self.notes_on,
            last_step_duration: self.last_step_duration,
            dropped_events: self.dropped_events,
            ..TelemetrySummary::default()
        };
        if self.sample_count == 0 {
            return summary;
        }

        let window = &self.durations_us[..self.sample_count];
        let sum: u64 = window.iter().map(|&x| x as u64).sum();
        summary.avg_us = (sum / self.sample_count as u64) as u32;

        let mut sorted = self.durations_us;
        sorted[..self.sample_count].sort_unstable();
        let p95_idx = (self.sample_count * 95 / 100).max(1) - 1;
        summary.p95_us = sorted[p95_idx.min(self.sample_count - 1)];

        summary.max_us = self.max_us;
        self.max_us = 0;
        summary
    }
}
