//! Standalone host: a cpal output stream clocks the arpeggiator.
//!
//! The stream's callback is the processing block. Audio output is silence;
//! the arpeggiated notes leave through a MIDI output port. Port I/O and
//! logging happen on two helper threads fed by bounded channels so the
//! callback never blocks:
//!
//! - `arp-dispatch` sends each note at `block start + offset / sample rate`,
//! - `arp-monitor` logs the periodic telemetry summary.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SizedSample, Stream, StreamConfig};
use crossbeam_channel::{Receiver, Sender};

use aarrow_audio::{
    snapshot_cell, Arpeggiator, BlockReport, BlockTelemetry, EngineSnapshot, MidiBuffer,
    MidiMessage, SnapshotReader, TelemetrySummary,
};

use crate::config::Config;
use crate::midi::{InputEvent, MidiInputManager, MidiOutputManager, MidiPortInfo};
use crate::params::ParamStore;

/// Scheduled notes waiting for the dispatcher.
const DISPATCH_QUEUE_CAPACITY: usize = 1024;
/// Input events reserved in the block buffer up front.
const BLOCK_EVENT_CAPACITY: usize = 256;

#[derive(Debug)]
pub enum HostError {
    NoDevice,
    Stream(String),
    Midi(String),
    Io(std::io::Error),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDevice => write!(f, "no audio output device available"),
            Self::Stream(e) => write!(f, "audio stream error: {}", e),
            Self::Midi(e) => write!(f, "MIDI error: {}", e),
            Self::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for HostError {}

impl From<std::io::Error> for HostError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<cpal::DefaultStreamConfigError> for HostError {
    fn from(e: cpal::DefaultStreamConfigError) -> Self {
        Self::Stream(e.to_string())
    }
}

impl From<cpal::BuildStreamError> for HostError {
    fn from(e: cpal::BuildStreamError) -> Self {
        Self::Stream(e.to_string())
    }
}

impl From<cpal::PlayStreamError> for HostError {
    fn from(e: cpal::PlayStreamError) -> Self {
        Self::Stream(e.to_string())
    }
}

/// Settings the host needs beyond the parameters themselves.
#[derive(Debug, Clone)]
pub struct HostOptions {
    pub client_name: String,
    pub input_port: Option<String>,
    pub output_port: Option<String>,
    /// Zero-based.
    pub output_channel: u8,
    pub stats_interval: Duration,
    pub seed: Option<u64>,
}

impl HostOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            client_name: config.client_name().to_string(),
            input_port: config.input_port().map(str::to_string),
            output_port: config.output_port().map(str::to_string),
            output_channel: config.output_channel(),
            stats_interval: config.stats_interval(),
            seed: config.seed(),
        }
    }
}

/// A note bound for the output port at a wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub due: Instant,
    pub message: MidiMessage,
}

/// State moved into the audio callback.
pub(crate) struct BlockProcessor {
    arp: Arpeggiator,
    snapshot: SnapshotReader<EngineSnapshot>,
    input: Receiver<InputEvent>,
    outgoing: Sender<ScheduledEvent>,
    reset_requested: Arc<AtomicBool>,
    telemetry: BlockTelemetry,
    summaries: Sender<TelemetrySummary>,
    stats_interval: Duration,
    last_summary: Option<Instant>,
    midi: MidiBuffer,
}

impl BlockProcessor {
    pub(crate) fn new(
        arp: Arpeggiator,
        snapshot: SnapshotReader<EngineSnapshot>,
        input: Receiver<InputEvent>,
        outgoing: Sender<ScheduledEvent>,
        reset_requested: Arc<AtomicBool>,
        summaries: Sender<TelemetrySummary>,
        stats_interval: Duration,
    ) -> Self {
        Self {
            arp,
            snapshot,
            input,
            outgoing,
            reset_requested,
            telemetry: BlockTelemetry::new(),
            summaries,
            stats_interval,
            last_summary: None,
            midi: MidiBuffer::with_capacity(BLOCK_EVENT_CAPACITY),
        }
    }

    /// One block of `frames` samples starting at `block_start`.
    pub(crate) fn process(&mut self, frames: u32, block_start: Instant) -> BlockReport {
        let started = Instant::now();
        let sample_rate = self.arp.sample_rate();

        self.midi.clear();
        while let Ok(event) = self.input.try_recv() {
            self.midi.push(0, event.to_message());
        }
        if self.reset_requested.swap(false, Ordering::AcqRel) {
            self.arp.reset();
        }

        let snapshot = *self.snapshot.latest();
        let report =
            self.arp
                .process_block(&snapshot.params, &snapshot.transport, frames, &mut self.midi);

        let mut dropped = 0;
        for event in &self.midi {
            let due = block_start + Duration::from_secs_f64(event.offset as f64 / sample_rate);
            let scheduled = ScheduledEvent {
                due,
                message: event.message,
            };
            if self.outgoing.try_send(scheduled).is_err() {
                dropped += 1;
            }
        }
        self.telemetry.record_dropped(dropped);

        let budget = Duration::from_secs_f64(frames as f64 / sample_rate);
        self.telemetry.record(started.elapsed(), budget, &report);
        let last = *self.last_summary.get_or_insert(block_start);
        if block_start.saturating_duration_since(last) >= self.stats_interval {
            let _ = self.summaries.try_send(self.telemetry.take_summary());
            self.last_summary = Some(block_start);
        }
        report
    }
}

/// Running standalone arpeggiator. Dropping it stops the stream, sends a
/// final note-off for anything still sounding and joins the helper threads.
pub struct ArpHost {
    stream: Option<Stream>,
    input: MidiInputManager,
    output_port: Option<String>,
    reset_requested: Arc<AtomicBool>,
    sample_rate: f64,
    dispatcher: Option<JoinHandle<()>>,
    monitor: Option<JoinHandle<()>>,
}

impl ArpHost {
    /// Connect MIDI ports, attach `store` to the audio thread and start the stream.
    pub fn start(options: HostOptions, store: &mut ParamStore) -> Result<Self, HostError> {
        let mut input = MidiInputManager::new(&options.client_name);
        connect_input(&mut input, options.input_port.as_deref())?;
        let mut output = MidiOutputManager::new(&options.client_name);
        connect_output(&mut output, options.output_port.as_deref())?;
        let output_port = output.connected_port_name().map(str::to_string);

        let device = cpal::default_host()
            .default_output_device()
            .ok_or(HostError::NoDevice)?;
        let supported = device.default_output_config()?;
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();
        let sample_rate = config.sample_rate.0 as f64;
        log::info!(
            target: "host",
            "audio device {} at {} Hz, {} channels, {:?}",
            device.name().unwrap_or_else(|_| "unknown".to_string()),
            config.sample_rate.0,
            config.channels,
            sample_format
        );

        let (writer, reader) = snapshot_cell(store.snapshot());
        store.attach(writer);

        let arp = match options.seed {
            Some(seed) => Arpeggiator::with_seed(sample_rate, seed),
            None => Arpeggiator::new(sample_rate),
        };

        let (event_tx, event_rx) = crossbeam_channel::bounded(DISPATCH_QUEUE_CAPACITY);
        let channel = options.output_channel;
        let dispatcher = thread::Builder::new()
            .name("arp-dispatch".into())
            .spawn(move || dispatch_loop(output, channel, event_rx))?;

        let (summary_tx, summary_rx) = crossbeam_channel::bounded(4);
        let monitor = thread::Builder::new()
            .name("arp-monitor".into())
            .spawn(move || monitor_loop(summary_rx))?;

        let reset_requested = Arc::new(AtomicBool::new(false));
        let processor = BlockProcessor::new(
            arp,
            reader,
            input.receiver(),
            event_tx,
            reset_requested.clone(),
            summary_tx,
            options.stats_interval,
        );

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, processor),
            SampleFormat::I16 => build_stream::<i16>(&device, &config, processor),
            SampleFormat::U16 => build_stream::<u16>(&device, &config, processor),
            other => Err(HostError::Stream(format!("unsupported sample format {:?}", other))),
        }?;
        stream.play()?;

        Ok(Self {
            stream: Some(stream),
            input,
            output_port,
            reset_requested,
            sample_rate,
            dispatcher: Some(dispatcher),
            monitor: Some(monitor),
        })
    }

    /// Ask the audio thread to clear held notes and restart the sequence.
    pub fn request_reset(&self) {
        self.reset_requested.store(true, Ordering::Release);
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn input_port(&self) -> Option<&str> {
        self.input.connected_port_name()
    }

    pub fn output_port(&self) -> Option<&str> {
        self.output_port.as_deref()
    }
}

impl Drop for ArpHost {
    fn drop(&mut self) {
        self.input.disconnect();
        // Dropping the stream drops the callback and with it both channel senders.
        self.stream.take();
        for handle in [self.dispatcher.take(), self.monitor.take()].into_iter().flatten() {
            let _ = handle.join();
        }
        log::info!(target: "host", "stopped");
    }
}

/// Port names for `--list`: (inputs, outputs).
pub fn list_ports(client_name: &str) -> (Vec<String>, Vec<String>) {
    let input = MidiInputManager::new(client_name);
    let output = MidiOutputManager::new(client_name);
    let line = |p: &MidiPortInfo| format!("{}: {}", p.index, p.name);
    (
        input.list_ports().iter().map(line).collect(),
        output.list_ports().iter().map(line).collect(),
    )
}

fn connect_input(input: &mut MidiInputManager, selector: Option<&str>) -> Result<(), HostError> {
    match selector {
        Some(sel) => input.connect(sel).map_err(HostError::Midi),
        None if !input.list_ports().is_empty() => input.connect_index(0).map_err(HostError::Midi),
        None => {
            log::warn!(target: "host", "no MIDI input ports; nothing will be held");
            Ok(())
        }
    }
}

fn connect_output(output: &mut MidiOutputManager, selector: Option<&str>) -> Result<(), HostError> {
    match selector {
        Some(sel) => output.connect(sel).map_err(HostError::Midi),
        None if !output.list_ports().is_empty() => output.connect_index(0).map_err(HostError::Midi),
        None => {
            log::warn!(target: "host", "no MIDI output ports; notes are discarded");
            Ok(())
        }
    }
}

fn build_stream<T: SizedSample>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut processor: BlockProcessor,
) -> Result<Stream, HostError> {
    let channels = (config.channels as usize).max(1);
    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            data.fill(T::EQUILIBRIUM);
            processor.process((data.len() / channels) as u32, Instant::now());
        },
        |err| {
            log::error!(target: "host", "output stream error: {}", err);
        },
        None,
    )?;
    Ok(stream)
}

fn dispatch_loop(mut output: MidiOutputManager, channel: u8, rx: Receiver<ScheduledEvent>) {
    let mut sounding: Option<u8> = None;
    while let Ok(event) = rx.recv() {
        let now = Instant::now();
        if event.due > now {
            thread::sleep(event.due - now);
        }
        match event.message {
            MidiMessage::NoteOn { note, .. } => sounding = Some(note),
            MidiMessage::NoteOff { note } if sounding == Some(note) => sounding = None,
            MidiMessage::NoteOff { .. } => {}
        }
        if let Err(e) = output.send(event.message, channel) {
            log::warn!(target: "midi", "send failed: {}", e);
        }
    }
    if let Some(note) = sounding {
        let _ = output.send(MidiMessage::NoteOff { note }, channel);
    }
}

fn monitor_loop(rx: Receiver<TelemetrySummary>) {
    let mut overruns = 0;
    let mut dropped = 0;
    while let Ok(s) = rx.recv() {
        log::info!(
            target: "telemetry",
            "blocks={} avg={}us p95={}us max={}us steps={} notes={} skipped={} step={} samples",
            s.blocks,
            s.avg_us,
            s.p95_us,
            s.max_us,
            s.steps,
            s.notes_on,
            s.skipped,
            s.last_step_duration
        );
        if s.overruns > overruns {
            log::warn!(target: "telemetry", "{} block overruns since start", s.overruns);
            overruns = s.overruns;
        }
        if s.dropped_events > dropped {
            log::warn!(
                target: "telemetry",
                "{} note events dropped, dispatch queue full; notes may hang",
                s.dropped_events
            );
            dropped = s.dropped_events;
        }
    }
}
