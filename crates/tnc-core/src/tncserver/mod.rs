// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! TCP TNC server: one listen socket speaking the fixed 36-octet
//! header protocol described in §4.10, serving concurrent clients up
//! to [`MAX_TNC_CLIENTS`].
//!
//! Grounded on the admin TCP server's accept-loop shape: a
//! `socket2`-built listener with `SO_REUSEADDR`, a non-blocking accept
//! thread polling a shutdown flag, and one thread per client. Each
//! client gets a second, writer thread so asynchronous `K`/`U` pushes
//! (digipeated traffic landing on a channel this client subscribed to)
//! can be delivered without blocking behind that client's next
//! request.

mod client;
mod format;
mod header;

pub use client::ClientRegistry;
pub use header::{Datakind, Header};

use crate::ax25::{Address, Frame};
use crate::config::{ChannelParams, RuntimeConfig, MAX_TNC_CLIENTS};
use crate::txqueue::{Priority, TxQueue};
use header::{pack_callsign, unpack_callsign, HEADER_LEN};
use std::fmt;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// This core's reported protocol version (`R` query). These values match
/// the AGWPE-compatible version numbering real TNC clients (Xastir, UI-View,
/// APRSIS32) expect and hardcode comparisons against, not a semantic version
/// of this crate (§8 scenario 5).
const PROTOCOL_MAJOR: i32 = 2005;
const PROTOCOL_MINOR: i32 = 127;

/// Upper bound on a request body before the connection is dropped as
/// malformed (§7: "protocol header data length out of bounds").
const MAX_BODY_LEN: u32 = 65_536;

/// TNC TCP protocol failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// A header was not exactly [`header::HEADER_LEN`] bytes.
    HeaderTooShort(usize),
    /// `data_len` exceeded [`MAX_BODY_LEN`].
    BodyTooLarge(u32),
    /// `port` named a channel outside the configured range.
    PortOutOfRange(u8),
    /// A `V`/`M`/`K` transmit request's body did not match its
    /// expected shape.
    MalformedTransmitRequest,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaderTooShort(n) => write!(f, "tnc protocol header was {n} bytes, expected {HEADER_LEN}"),
            Self::BodyTooLarge(n) => write!(f, "tnc protocol body length {n} exceeds {MAX_BODY_LEN}"),
            Self::PortOutOfRange(p) => write!(f, "tnc protocol port {p} out of range"),
            Self::MalformedTransmitRequest => write!(f, "malformed transmit request body"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// One logical radio port as seen by the TNC-protocol server: its
/// descriptor text, a baud-rate code for `g`, the channel's transmit
/// queue, and a live signal-level byte the demodulator thread updates
/// (§4.2 step 4, the `g` response's `traffic` field).
pub struct PortInfo {
    pub descriptor: String,
    pub baud_code: u8,
    pub queue: Arc<TxQueue>,
    pub traffic: Arc<std::sync::atomic::AtomicU8>,
}

/// The TCP TNC server. Owns the listen socket's accept thread; client
/// threads are detached and self-terminate on socket close.
pub struct TncServer {
    shutdown: Arc<AtomicBool>,
    registry: Arc<ClientRegistry>,
    accept_thread: Option<thread::JoinHandle<()>>,
}

impl TncServer {
    /// Bind and start serving. `ports` is indexed by the protocol's
    /// `port` byte.
    pub fn bind(
        bind_addr: &str,
        port: u16,
        ports: Vec<PortInfo>,
        config: Arc<RuntimeConfig>,
    ) -> std::io::Result<Self> {
        let listener = create_tcp_listener(bind_addr, port)?;
        let shutdown = Arc::new(AtomicBool::new(false));
        let registry = Arc::new(ClientRegistry::new());
        let ports = Arc::new(ports);

        let accept_thread = {
            let listener = listener.try_clone()?;
            let shutdown = shutdown.clone();
            let registry = registry.clone();
            thread::spawn(move || accept_loop(listener, shutdown, registry, ports, config))
        };

        Ok(Self {
            shutdown,
            registry,
            accept_thread: Some(accept_thread),
        })
    }

    /// The shared client registry, for the router to push `K`/`U`
    /// broadcasts into as frames are received.
    #[must_use]
    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Signal the accept loop (and, on their next I/O timeout, every
    /// client thread) to stop.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }
}

impl Drop for TncServer {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(handle) = self.accept_thread.take() {
            let _ = handle.join();
        }
    }
}

fn create_tcp_listener(bind_addr: &str, port: u16) -> std::io::Result<TcpListener> {
    let addr = format!("{bind_addr}:{port}");
    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("invalid address: {e}")))?;

    let socket = socket2::Socket::new(socket2::Domain::IPV4, socket2::Type::STREAM, Some(socket2::Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(128)?;

    let listener: TcpListener = socket.into();
    listener.set_nonblocking(true)?;
    Ok(listener)
}

fn accept_loop(
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
    registry: Arc<ClientRegistry>,
    ports: Arc<Vec<PortInfo>>,
    config: Arc<RuntimeConfig>,
) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        match listener.accept() {
            Ok((stream, _addr)) => {
                let _ = stream.set_nonblocking(false);
                let _ = stream.set_read_timeout(Some(Duration::from_secs(30)));
                spawn_client(stream, shutdown.clone(), registry.clone(), ports.clone(), config.clone());
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(10));
            }
            Err(_) => {}
        }
    }
}

fn spawn_client(
    stream: TcpStream,
    shutdown: Arc<AtomicBool>,
    registry: Arc<ClientRegistry>,
    ports: Arc<Vec<PortInfo>>,
    config: Arc<RuntimeConfig>,
) {
    let Some((id, outbound)) = registry.accept() else {
        log::warn!("tncserver: client rejected, at capacity ({MAX_TNC_CLIENTS})");
        return;
    };

    let writer_stream = match stream.try_clone() {
        Ok(s) => s,
        Err(e) => {
            log::warn!("tncserver: failed to clone client socket: {e}");
            registry.disconnect(id);
            return;
        }
    };

    thread::spawn(move || writer_loop(writer_stream, outbound));

    thread::spawn(move || {
        reader_loop(stream, id, &shutdown, &registry, &ports, &config);
        registry.disconnect(id);
    });
}

fn writer_loop(mut stream: TcpStream, outbound: crossbeam::channel::Receiver<Vec<u8>>) {
    for message in outbound {
        if stream.write_all(&message).is_err() {
            break;
        }
    }
}

fn reader_loop(
    mut stream: TcpStream,
    client_id: usize,
    shutdown: &AtomicBool,
    registry: &ClientRegistry,
    ports: &[PortInfo],
    config: &RuntimeConfig,
) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        let mut header_bytes = [0u8; HEADER_LEN];
        if stream.read_exact(&mut header_bytes).is_err() {
            break;
        }
        let header = match Header::from_wire(&header_bytes) {
            Ok(h) => h,
            Err(e) => {
                log::debug!("tncserver: bad header from client {client_id}: {e}");
                break;
            }
        };
        if header.data_len > MAX_BODY_LEN {
            log::debug!("tncserver: client {client_id} body too large ({})", header.data_len);
            break;
        }
        let mut body = vec![0u8; header.data_len as usize];
        if stream.read_exact(&mut body).is_err() {
            break;
        }

        match dispatch(&header, &body, client_id, registry, ports, config) {
            Ok(Some(reply)) => {
                if stream.write_all(&reply).is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => {
                log::debug!("tncserver: client {client_id} request failed: {e}");
            }
        }
    }
}

/// Handle one request, returning the raw bytes to write back (header +
/// payload) for synchronous replies, or `None` for silent/async
/// commands.
fn dispatch(
    header: &Header,
    body: &[u8],
    client_id: usize,
    registry: &ClientRegistry,
    ports: &[PortInfo],
    config: &RuntimeConfig,
) -> Result<Option<Vec<u8>>, ProtocolError> {
    match header.datakind {
        Datakind::VersionQuery => {
            let mut payload = Vec::with_capacity(8);
            payload.extend_from_slice(&PROTOCOL_MAJOR.to_le_bytes());
            payload.extend_from_slice(&PROTOCOL_MINOR.to_le_bytes());
            Ok(Some(reply(header, Datakind::VersionQuery, &payload)))
        }
        Datakind::PortList => {
            let descriptors: Vec<String> = ports.iter().map(|p| p.descriptor.clone()).collect();
            let payload = format::port_list(&descriptors).into_bytes();
            Ok(Some(reply(header, Datakind::PortList, &payload)))
        }
        Datakind::PortCapabilities => {
            let port = ports_get(ports, header.port)?;
            let params = config.params(header.port as usize).unwrap_or(ChannelParams::default());
            let traffic = port.traffic.load(std::sync::atomic::Ordering::Relaxed);
            let payload = format::port_capabilities(port.baud_code, traffic, &params, 7, registry.client_count() as u8, 0);
            Ok(Some(reply(header, Datakind::PortCapabilities, &payload)))
        }
        Datakind::ToggleRawFrames => {
            registry.set_raw(client_id, true);
            Ok(None)
        }
        Datakind::ToggleMonitor => {
            registry.set_monitor(client_id, true);
            Ok(None)
        }
        Datakind::TransmitWithPath => {
            transmit_with_path(header, body, ports)?;
            Ok(None)
        }
        Datakind::TransmitNoDigis => {
            transmit_no_digis(header, body, ports)?;
            Ok(None)
        }
        Datakind::TransmitRaw => {
            transmit_raw(body, ports, header.port)?;
            Ok(None)
        }
        Datakind::RegisterCallsign => {
            let callsign = unpack_callsign(&header.call_from);
            let ok = registry.register_callsign(client_id, &callsign);
            Ok(Some(reply(header, Datakind::RegisterCallsign, &[u8::from(ok)])))
        }
        Datakind::UnregisterCallsign => {
            registry.unregister_callsign(&unpack_callsign(&header.call_from));
            Ok(None)
        }
        Datakind::OutstandingCount => {
            let port = ports_get(ports, header.port)?;
            let count = port.queue.count() as i32;
            Ok(Some(reply(header, Datakind::OutstandingCount, &count.to_le_bytes())))
        }
        Datakind::ConnectedMode(letter) => {
            log::error!("tncserver: connected-mode request '{}' not implemented", letter as char);
            Ok(None)
        }
        Datakind::ReceivedRaw | Datakind::ReceivedMonitor | Datakind::Other(_) => Ok(None),
    }
}

fn ports_get(ports: &[PortInfo], port: u8) -> Result<&PortInfo, ProtocolError> {
    ports.get(port as usize).ok_or(ProtocolError::PortOutOfRange(port))
}

fn reply(header: &Header, datakind: Datakind, payload: &[u8]) -> Vec<u8> {
    let reply_header = header.reply(datakind, payload.len() as u32);
    let mut out = reply_header.to_wire().to_vec();
    out.extend_from_slice(payload);
    out
}

/// `V`: body is `[digi_count: u8][digi_callsign: [u8; 10]; digi_count][info...]`.
fn transmit_with_path(header: &Header, body: &[u8], ports: &[PortInfo]) -> Result<(), ProtocolError> {
    let port = ports_get(ports, header.port)?;
    let &digi_count = body.first().ok_or(ProtocolError::MalformedTransmitRequest)?;
    let digis_end = 1 + digi_count as usize * 10;
    if body.len() < digis_end {
        return Err(ProtocolError::MalformedTransmitRequest);
    }
    let mut digis = Vec::with_capacity(digi_count as usize);
    for chunk in body[1..digis_end].chunks_exact(10) {
        let field: [u8; 10] = chunk.try_into().unwrap();
        let addr = Address::from_text(&unpack_callsign(&field)).map_err(|_| ProtocolError::MalformedTransmitRequest)?;
        digis.push(addr);
    }
    let info = body[digis_end..].to_vec();
    let source = Address::from_text(&unpack_callsign(&header.call_from)).map_err(|_| ProtocolError::MalformedTransmitRequest)?;
    let destination = Address::from_text(&unpack_callsign(&header.call_to)).map_err(|_| ProtocolError::MalformedTransmitRequest)?;
    let frame = Frame::new_ui(source, destination, digis, header.pid, info).map_err(|_| ProtocolError::MalformedTransmitRequest)?;
    let _ = port.queue.push(Priority::Low, frame.to_wire());
    Ok(())
}

/// `M`: body is the information field directly, no digipeater path.
fn transmit_no_digis(header: &Header, body: &[u8], ports: &[PortInfo]) -> Result<(), ProtocolError> {
    let port = ports_get(ports, header.port)?;
    let source = Address::from_text(&unpack_callsign(&header.call_from)).map_err(|_| ProtocolError::MalformedTransmitRequest)?;
    let destination = Address::from_text(&unpack_callsign(&header.call_to)).map_err(|_| ProtocolError::MalformedTransmitRequest)?;
    let frame = Frame::new_ui(source, destination, Vec::new(), header.pid, body.to_vec())
        .map_err(|_| ProtocolError::MalformedTransmitRequest)?;
    let _ = port.queue.push(Priority::Low, frame.to_wire());
    Ok(())
}

/// `K`: body is an on-air frame (minus CRC); priority follows whether
/// any digipeater's has-been-repeated bit is already set.
fn transmit_raw(body: &[u8], ports: &[PortInfo], port_index: u8) -> Result<(), ProtocolError> {
    let port = ports_get(ports, port_index)?;
    let frame = Frame::from_wire(body).map_err(|_| ProtocolError::MalformedTransmitRequest)?;
    let priority = if frame.digis.iter().any(|d| d.c_or_h_bit) {
        Priority::High
    } else {
        Priority::Low
    };
    let _ = port.queue.push(priority, frame.to_wire());
    Ok(())
}

/// Build the outbound `K` (raw received frame) push for subscribed
/// clients: a zero reserved byte followed by the on-air frame.
#[must_use]
pub fn build_raw_push(frame: &Frame) -> Vec<u8> {
    let mut out = Vec::with_capacity(frame.to_wire().len() + 1);
    out.push(0);
    out.extend_from_slice(&frame.to_wire());
    out
}

/// Build the outbound `U` (monitor) push for subscribed clients.
#[must_use]
pub fn build_monitor_push(channel: u8, frame: &Frame) -> Vec<u8> {
    let (hh, mm, ss) = format::wall_clock_hms();
    format::monitor_text(
        channel,
        &frame.source.to_text(),
        &frame.destination.to_text(),
        frame.pid.unwrap_or(0xF0),
        &frame.info,
        hh,
        mm,
        ss,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::header::pack_callsign;

    fn sample_header(datakind: Datakind, port: u8, data_len: u32) -> Header {
        Header {
            port,
            datakind,
            pid: 0xF0,
            call_from: pack_callsign("N0CALL"),
            call_to: pack_callsign("APRS"),
            data_len,
            user_reserved: 0,
        }
    }

    fn sample_ports() -> Vec<PortInfo> {
        vec![PortInfo {
            descriptor: "Port 1 (1200 baud AFSK)".to_string(),
            baud_code: 0,
            queue: Arc::new(TxQueue::new()),
            traffic: Arc::new(std::sync::atomic::AtomicU8::new(0)),
        }]
    }

    #[test]
    fn version_query_reports_configured_version() {
        let header = sample_header(Datakind::VersionQuery, 0, 0);
        let registry = ClientRegistry::new();
        let ports = sample_ports();
        let config = RuntimeConfig::new(1);
        let reply = dispatch(&header, &[], 0, &registry, &ports, &config).unwrap().unwrap();
        let payload = &reply[HEADER_LEN..];
        assert_eq!(i32::from_le_bytes(payload[0..4].try_into().unwrap()), PROTOCOL_MAJOR);
        assert_eq!(i32::from_le_bytes(payload[4..8].try_into().unwrap()), PROTOCOL_MINOR);
    }

    #[test]
    fn transmit_no_digis_enqueues_low_priority() {
        let header = sample_header(Datakind::TransmitNoDigis, 0, 2);
        let registry = ClientRegistry::new();
        let ports = sample_ports();
        let config = RuntimeConfig::new(1);
        dispatch(&header, b"hi", 0, &registry, &ports, &config).unwrap();
        assert_eq!(ports[0].queue.count(), 1);
    }

    #[test]
    fn transmit_raw_with_used_digi_is_high_priority() {
        let registry = ClientRegistry::new();
        let ports = sample_ports();
        let config = RuntimeConfig::new(1);
        let mut digi = Address::new("WIDE1", 0, false).unwrap();
        digi.c_or_h_bit = true;
        let frame = Frame::new_ui(
            Address::new("N0CALL", 0, false).unwrap(),
            Address::new("APRS", 0, false).unwrap(),
            vec![digi],
            0xF0,
            b"hi".to_vec(),
        )
        .unwrap();
        let header = sample_header(Datakind::TransmitRaw, 0, frame.to_wire().len() as u32);
        dispatch(&header, &frame.to_wire(), 0, &registry, &ports, &config).unwrap();
        assert_eq!(ports[0].queue.try_pop().map(|_| ()), Some(()));
    }

    #[test]
    fn register_callsign_replies_with_success_byte() {
        let header = sample_header(Datakind::RegisterCallsign, 0, 0);
        let registry = ClientRegistry::new();
        let (id, _rx) = registry.accept().unwrap();
        let ports = sample_ports();
        let config = RuntimeConfig::new(1);
        let reply = dispatch(&header, &[], id, &registry, &ports, &config).unwrap().unwrap();
        assert_eq!(reply[HEADER_LEN], 1);
    }

    #[test]
    fn out_of_range_port_is_rejected() {
        let header = sample_header(Datakind::OutstandingCount, 5, 0);
        let registry = ClientRegistry::new();
        let ports = sample_ports();
        let config = RuntimeConfig::new(1);
        assert!(matches!(
            dispatch(&header, &[], 0, &registry, &ports, &config),
            Err(ProtocolError::PortOutOfRange(5))
        ));
    }
}
