// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Top-level runtime (§5 Concurrency): wires a demodulator, digipeater,
//! transmit queue and tone generator into one [`Channel`] per radio
//! port, then threads them together with the TNC TCP server and any
//! KISS host links.
//!
//! Thread layout:
//! - one audio-receive thread, owned by the caller's [`AudioSource`],
//!   delivering samples to [`Demodulator::process_sample`] via a
//!   shared callback;
//! - one transmit-scheduler thread per channel, running CSMA and the
//!   PTT/txdelay/txtail sequence;
//! - one accept thread plus two per connected client inside
//!   [`TncServer`];
//! - one reader and one writer thread per configured KISS link.

use crate::ax25::Frame;
use crate::audio::{AudioSink, AudioSource, PttDriver};
use crate::config::{RuntimeConfig, MAX_CHANNELS, SHUTDOWN_POLL_TIMEOUT_MS};
use crate::csma::{transmit_sequence, ChannelAccess};
use crate::demod::{DemodConfig, Demodulator};
use crate::digipeat::{DedupeTable, Digipeater, DigipeatFilter};
use crate::error::Result;
use crate::kiss::endpoint::KissEndpoint;
use crate::kiss::{self, KissCodec, KissCommand};
use crate::tncserver::{ClientRegistry, PortInfo, TncServer};
use crate::tone::{AfskModulator, G3ruhTransmitter, NrziEncoder};
use crate::txqueue::{Priority, TxQueue};
use crossbeam::channel::{bounded, Sender};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Per-channel transmit-side tone generation, selected by whether the
/// channel's [`DemodConfig`] is 9600 bps baseband or Bell 202 AFSK.
enum Transmitter {
    Afsk { modulator: AfskModulator, nrzi: NrziEncoder },
    G3ruh(G3ruhTransmitter),
}

impl Transmitter {
    fn from_config(config: &DemodConfig) -> Self {
        if config.nine_six_hundred {
            Self::G3ruh(G3ruhTransmitter::new(config.sample_rate_hz, config.baud))
        } else {
            Self::Afsk {
                modulator: AfskModulator::new(config.sample_rate_hz, config.baud, config.mark_hz, config.space_hz),
                nrzi: NrziEncoder::new(),
            }
        }
    }

    fn transmit_bit(&mut self, bit: bool, out: &mut Vec<f32>) {
        match self {
            Self::Afsk { modulator, nrzi } => {
                let line_bit = nrzi.encode_bit(bit);
                modulator.modulate_bit(line_bit, out);
            }
            Self::G3ruh(tx) => tx.transmit_bit(bit, out),
        }
    }
}

/// One radio channel's fixed setup, supplied by the caller at
/// [`Tnc::init`] time.
pub struct ChannelSetup {
    pub demod_config: DemodConfig,
    pub digipeat_filter: DigipeatFilter,
    pub ptt: Arc<dyn PttDriver>,
    /// Human-readable port description for the `G` TNC-protocol query.
    pub descriptor: String,
    /// Baud-rate code reported by the `g` TNC-protocol query.
    pub baud_code: u8,
}

/// TNC TCP server bind parameters, if the host wants one running.
pub struct TncServerSetup {
    pub bind_addr: String,
    pub port: u16,
}

/// One KISS host link: a channel index plus reader/writer halves of
/// its transport, already split by the caller (e.g. two
/// `TcpStream::try_clone`s, or two `File::try_clone`s of a pty
/// master), mirroring how [`TncServer`] splits each client socket.
pub struct KissLinkConfig {
    pub channel: usize,
    pub reader: Box<dyn KissEndpoint>,
    pub writer: Box<dyn KissEndpoint>,
}

/// Everything [`Tnc::init`] needs to bring up a running core.
pub struct TncConfig {
    pub callsign: String,
    pub channels: Vec<ChannelSetup>,
    pub audio_source: Box<dyn AudioSource>,
    pub audio_sink: Box<dyn AudioSink>,
    pub tnc_server: Option<TncServerSetup>,
    pub kiss_links: Vec<KissLinkConfig>,
}

struct Channel {
    index: usize,
    baud: f64,
    queue: Arc<TxQueue>,
    traffic: Arc<AtomicU8>,
    demod: Mutex<Demodulator>,
    digipeater: Digipeater,
    dedupe: Mutex<DedupeTable>,
    transmitter: Mutex<Transmitter>,
    ptt: Arc<dyn PttDriver>,
}

/// State the audio callback and KISS reader threads both need to reach
/// in order to route a newly decoded frame: fan it out to every other
/// channel's digipeater, the TNC server's subscribed clients, and any
/// KISS link attached to its own channel.
struct Router {
    channels: Vec<Arc<Channel>>,
    registry: Option<Arc<ClientRegistry>>,
    kiss_senders: Vec<(usize, Sender<Vec<u8>>)>,
    started_at: std::time::Instant,
}

impl Router {
    fn handle_received(&self, src_channel: usize, wire_bytes: Vec<u8>) {
        let frame = match Frame::from_wire(&wire_bytes) {
            Ok(frame) => frame,
            Err(e) => {
                log::debug!("runtime: channel {src_channel} dropped unparsable frame: {e}");
                return;
            }
        };

        if let Some(registry) = &self.registry {
            registry.broadcast_raw(&crate::tncserver::build_raw_push(&frame));
            registry.broadcast_monitor(&crate::tncserver::build_monitor_push(src_channel as u8, &frame));
        }

        for (channel, sender) in &self.kiss_senders {
            if *channel == src_channel {
                let encoded = kiss::encode(src_channel as u8, KissCommand::Data, &wire_bytes);
                let _ = sender.try_send(encoded);
            }
        }

        let now = self.started_at.elapsed();
        let src = &self.channels[src_channel];
        for dst in &self.channels {
            let mut dedupe = src.dedupe.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(rewritten) = src.digipeater.process(&frame, src_channel, dst.index, &mut dedupe, now) {
                drop(dedupe);
                let _ = dst.queue.push(Priority::High, rewritten.to_wire());
            }
        }
    }
}

/// Owns every channel's subsystems and the threads that drive them.
/// Dropping a `Tnc` does not itself stop those threads; call
/// [`Tnc::shutdown`] and wait for it to return first.
pub struct Tnc {
    config: Arc<RuntimeConfig>,
    channels: Vec<Arc<Channel>>,
    shutdown: Arc<AtomicBool>,
    audio_source: Mutex<Box<dyn AudioSource>>,
    scheduler_threads: Vec<thread::JoinHandle<()>>,
    tnc_server: Option<TncServer>,
    kiss_reader_endpoints: Vec<Arc<Mutex<Box<dyn KissEndpoint>>>>,
    kiss_threads: Vec<thread::JoinHandle<()>>,
}

impl Tnc {
    /// Build and start every channel's demodulator/scheduler, the
    /// optional TNC server, and any configured KISS links.
    pub fn init(mut config: TncConfig) -> Result<Self> {
        if config.channels.is_empty() || config.channels.len() > MAX_CHANNELS {
            return Err(crate::error::Error::ChannelOutOfRange(config.channels.len()));
        }

        let runtime_config = Arc::new(RuntimeConfig::new(config.channels.len()));
        let shutdown = Arc::new(AtomicBool::new(false));
        let sink = Arc::new(Mutex::new(config.audio_sink));

        let mut channels = Vec::with_capacity(config.channels.len());
        let mut port_infos = Vec::with_capacity(config.channels.len());
        for (index, setup) in config.channels.into_iter().enumerate() {
            let baud = setup.demod_config.baud;
            let demod = Demodulator::new(&setup.demod_config);
            let transmitter = Transmitter::from_config(&setup.demod_config);
            let queue = Arc::new(TxQueue::new());
            let traffic = Arc::new(AtomicU8::new(0));

            port_infos.push(PortInfo {
                descriptor: setup.descriptor,
                baud_code: setup.baud_code,
                queue: queue.clone(),
                traffic: traffic.clone(),
            });

            channels.push(Arc::new(Channel {
                index,
                baud,
                queue,
                traffic,
                demod: Mutex::new(demod),
                digipeater: Digipeater::new(config.callsign.clone(), setup.digipeat_filter),
                dedupe: Mutex::new(DedupeTable::new()),
                transmitter: Mutex::new(transmitter),
                ptt: setup.ptt,
            }));
        }

        let tnc_server = match config.tnc_server {
            Some(setup) => Some(TncServer::bind(&setup.bind_addr, setup.port, port_infos, runtime_config.clone())?),
            None => None,
        };
        let registry = tnc_server.as_ref().map(|s| s.registry().clone());

        let mut kiss_senders = Vec::with_capacity(config.kiss_links.len());
        let mut kiss_reader_endpoints = Vec::with_capacity(config.kiss_links.len());
        let mut kiss_threads = Vec::with_capacity(config.kiss_links.len() * 2);
        for link in config.kiss_links {
            if link.channel >= channels.len() {
                log::warn!("runtime: kiss link for channel {} has no matching channel, skipping", link.channel);
                continue;
            }
            let (tx, rx) = bounded::<Vec<u8>>(64);
            kiss_senders.push((link.channel, tx));

            let mut writer = link.writer;
            kiss_threads.push(thread::spawn(move || {
                for message in rx {
                    if writer.write_bytes(&message).is_err() {
                        break;
                    }
                }
                writer.close();
            }));

            let reader = Arc::new(Mutex::new(link.reader));
            kiss_reader_endpoints.push(reader.clone());
            let queue = channels[link.channel].queue.clone();
            let channel_index = link.channel;
            let shutdown_flag = shutdown.clone();
            let runtime_config = runtime_config.clone();
            kiss_threads.push(thread::spawn(move || {
                kiss_reader_loop(reader, queue, channel_index, &runtime_config, &shutdown_flag);
            }));
        }

        let router = Arc::new(Router {
            channels: channels.clone(),
            registry,
            kiss_senders,
            started_at: std::time::Instant::now(),
        });

        let channel_count = channels.len() as u16;
        let sample_rate_hz = channels_sample_rate(&channels);
        let callback_channels = channels.clone();
        let callback: Box<dyn FnMut(usize, f64) + Send> = Box::new(move |channel_index, sample| {
            let Some(channel) = callback_channels.get(channel_index) else {
                return;
            };
            let (events, level) = {
                let mut demod = channel.demod.lock().unwrap_or_else(|e| e.into_inner());
                let events = demod.process_sample(sample);
                (events, demod.level_report())
            };
            channel.traffic.store(level.quick, Ordering::Relaxed);
            for event in events {
                match event.result {
                    Ok(payload) => router.handle_received(channel_index, payload),
                    Err(e) => log::debug!("hdlc: channel {channel_index} slicer {} error: {e}", event.slicer),
                }
            }
        });

        let mut audio_source = config.audio_source;
        audio_source.start(sample_rate_hz, channel_count, callback)?;

        let mut scheduler_threads = Vec::with_capacity(channels.len());
        for channel in &channels {
            let channel = channel.clone();
            let runtime_config = runtime_config.clone();
            let sink = sink.clone();
            let shutdown_flag = shutdown.clone();
            scheduler_threads.push(thread::spawn(move || scheduler_loop(channel, runtime_config, sink, shutdown_flag)));
        }

        Ok(Self {
            config: runtime_config,
            channels,
            shutdown,
            audio_source: Mutex::new(audio_source),
            scheduler_threads,
            tnc_server,
            kiss_reader_endpoints,
            kiss_threads,
        })
    }

    /// Number of channels this runtime is driving.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Shared hot-reloadable configuration (txdelay/txtail/slottime/persist/full-duplex per channel).
    #[must_use]
    pub fn config(&self) -> &Arc<RuntimeConfig> {
        &self.config
    }

    /// Stop accepting new TNC-protocol clients, unblock every KISS
    /// reader, let each channel's scheduler drain its queue and join,
    /// then release the audio device.
    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Release);

        self.tnc_server.take();

        for endpoint in &self.kiss_reader_endpoints {
            endpoint.lock().unwrap_or_else(|e| e.into_inner()).close();
        }

        for handle in self.scheduler_threads.drain(..) {
            if handle.join().is_err() {
                log::warn!("runtime: a channel scheduler thread panicked during shutdown");
            }
        }
        for handle in self.kiss_threads.drain(..) {
            if handle.join().is_err() {
                log::warn!("runtime: a kiss link thread panicked during shutdown");
            }
        }

        self.audio_source.lock().unwrap_or_else(|e| e.into_inner()).stop();
    }
}

impl Drop for Tnc {
    fn drop(&mut self) {
        if !self.shutdown.load(Ordering::Relaxed) {
            self.shutdown();
        }
    }
}

fn channels_sample_rate(channels: &[Arc<Channel>]) -> u32 {
    channels
        .first()
        .map(|c| c.demod.lock().unwrap_or_else(|e| e.into_inner()).sample_rate_hz().round() as u32)
        .unwrap_or(crate::config::DEFAULT_SAMPLE_RATE_HZ as u32)
}

fn kiss_reader_loop(
    endpoint: Arc<Mutex<Box<dyn KissEndpoint>>>,
    queue: Arc<TxQueue>,
    channel_index: usize,
    config: &RuntimeConfig,
    shutdown: &AtomicBool,
) {
    let mut codec = KissCodec::new();
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        let byte = endpoint.lock().unwrap_or_else(|e| e.into_inner()).read_byte();
        match byte {
            Ok(Some(b)) => {
                if let Some(result) = codec.push_byte(b) {
                    match result {
                        Ok(frame) if frame.command == KissCommand::Data => {
                            let _ = queue.push(Priority::Low, frame.body);
                        }
                        Ok(frame) => apply_kiss_parameter(config, channel_index, &frame),
                        Err(e) => log::debug!("kiss: channel {channel_index} frame error: {e}"),
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                log::debug!("kiss: channel {channel_index} read error: {e}");
                break;
            }
        }
    }
}

/// Apply a one-byte KISS parameter command (§4.9) to this channel's
/// hot-reloadable [`crate::config::ChannelParams`]. `SetHardware` and
/// `ExitKiss` carry no parameter this core understands and are logged
/// at debug level only.
fn apply_kiss_parameter(config: &RuntimeConfig, channel_index: usize, frame: &kiss::KissFrame) {
    let Some(&value) = frame.body.first() else {
        log::debug!("kiss: channel {channel_index} command {:?} with empty body", frame.command);
        return;
    };
    let updated = match frame.command {
        KissCommand::TxDelay => config.update_params(channel_index, |p| p.txdelay_ms = u32::from(value) * 10),
        KissCommand::Persistence => config.update_params(channel_index, |p| p.persist = value),
        KissCommand::SlotTime => config.update_params(channel_index, |p| p.slottime_ms = u32::from(value) * 10),
        KissCommand::TxTail => config.update_params(channel_index, |p| p.txtail_ms = u32::from(value) * 10),
        KissCommand::FullDuplex => config.update_params(channel_index, |p| p.full_duplex = value != 0),
        KissCommand::Data | KissCommand::SetHardware | KissCommand::ExitKiss | KissCommand::Unknown(_) => {
            log::debug!("kiss: channel {channel_index} command {:?} not applied", frame.command);
            true
        }
    };
    if !updated {
        log::debug!("kiss: channel {channel_index} parameter command for out-of-range channel");
    }
}

fn scheduler_loop(channel: Arc<Channel>, config: Arc<RuntimeConfig>, sink: Arc<Mutex<Box<dyn AudioSink>>>, shutdown: Arc<AtomicBool>) {
    let poll = Duration::from_millis(SHUTDOWN_POLL_TIMEOUT_MS);
    while !shutdown.load(Ordering::Relaxed) {
        let Some(first) = channel.queue.wait_while_empty(poll) else {
            continue;
        };
        let mut frames = vec![first];
        while let Some(next) = channel.queue.try_pop() {
            frames.push(next);
        }

        let params = config.params(channel.index).unwrap_or_default();
        let mut access = ChannelAccess::new(
            params.persist,
            Duration::from_millis(u64::from(params.slottime_ms)),
            rand_byte,
            || channel.demod.lock().unwrap_or_else(|e| e.into_inner()).data_carrier_detect(),
            thread::sleep,
        );
        access.acquire(params.full_duplex);

        let ptt = channel.ptt.clone();
        let channel_index = channel.index;
        transmit_sequence(
            &params,
            |on| {
                if let Err(e) = ptt.set(channel_index, on) {
                    log::warn!("ptt: channel {channel_index} set({on}) failed: {e}");
                }
            },
            thread::sleep,
            || transmit_frames(&channel, &params, &frames, &sink),
        );
    }
}

fn rand_byte() -> u8 {
    rand::random()
}

fn transmit_frames(channel: &Channel, params: &crate::config::ChannelParams, frames: &[Vec<u8>], sink: &Mutex<Box<dyn AudioSink>>) {
    let mut transmitter = channel.transmitter.lock().unwrap_or_else(|e| e.into_inner());
    let mut sink = sink.lock().unwrap_or_else(|e| e.into_inner());
    let bit_period_ms = 1000.0 / channel.baud;
    let lead_flags = ((f64::from(params.txdelay_ms) / bit_period_ms) / 8.0).round().max(1.0) as usize;
    let trail_flags = ((f64::from(params.txtail_ms) / bit_period_ms) / 8.0).round().max(1.0) as usize;

    for (i, payload) in frames.iter().enumerate() {
        let lead = if i == 0 { lead_flags } else { 0 };
        let trail = if i + 1 == frames.len() { trail_flags } else { 1 };
        let bits = crate::hdlc::encode_frame(payload, lead, trail);
        let mut samples = Vec::with_capacity(bits.len() * 2);
        for bit in bits {
            transmitter.transmit_bit(bit, &mut samples);
        }
        if !sink.enqueue(channel.index, &samples) {
            log::warn!("audio: channel {} output buffer full, {} samples dropped", channel.index, samples.len());
        }
    }
}
