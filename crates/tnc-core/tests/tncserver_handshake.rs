// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! §8 scenario 5: a real TCP client speaking the 36-octet-header
//! protocol end to end against a bound [`TncServer`].

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use tnc_core::config::RuntimeConfig;
use tnc_core::tncserver::{Datakind, Header, PortInfo, TncServer};
use tnc_core::txqueue::TxQueue;

fn start_server() -> (TncServer, u16) {
    // Bind to an ephemeral port by trying a small range; `TncServer::bind`
    // takes a fixed port, so probe with a throwaway listener first.
    let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = probe.local_addr().unwrap().port();
    drop(probe);

    let ports = vec![PortInfo {
        descriptor: "Port 1 (1200 baud AFSK)".to_string(),
        baud_code: 0,
        queue: Arc::new(TxQueue::new()),
        traffic: Arc::new(std::sync::atomic::AtomicU8::new(0)),
    }];
    let config = Arc::new(RuntimeConfig::new(1));
    let server = TncServer::bind("127.0.0.1", port, ports, config).expect("bind");
    (server, port)
}

fn header_bytes(datakind: u8, port: u8, data_len: u32) -> Vec<u8> {
    let header = Header::from_wire(&{
        let mut raw = [0u8; 36];
        raw[0] = port;
        raw[4] = datakind;
        raw[28..32].copy_from_slice(&data_len.to_le_bytes());
        raw
    })
    .unwrap();
    header.to_wire().to_vec()
}

#[test]
fn version_query_handshake_matches_literal_scenario() {
    let (_server, port) = start_server();
    // Give the accept thread a moment to start listening.
    std::thread::sleep(Duration::from_millis(50));

    let mut stream = TcpStream::connect(("127.0.0.1", port)).expect("connect");
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

    stream.write_all(&header_bytes(b'R', 0, 0)).unwrap();

    let mut reply_header = [0u8; 36];
    stream.read_exact(&mut reply_header).unwrap();
    let header = Header::from_wire(&reply_header).unwrap();
    assert_eq!(header.datakind, Datakind::VersionQuery);
    assert_eq!(header.data_len, 8);

    let mut payload = [0u8; 8];
    stream.read_exact(&mut payload).unwrap();
    let major = i32::from_le_bytes(payload[0..4].try_into().unwrap());
    let minor = i32::from_le_bytes(payload[4..8].try_into().unwrap());
    assert_eq!((major, minor), (2005, 127));
}

#[test]
fn register_then_unregister_callsign_over_tcp() {
    let (_server, port) = start_server();
    std::thread::sleep(Duration::from_millis(50));

    let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

    let mut req = header_bytes(b'X', 0, 0);
    req[8..18].copy_from_slice(b"N0CALL\0\0\0\0");
    stream.write_all(&req).unwrap();

    let mut reply_header = [0u8; 36];
    stream.read_exact(&mut reply_header).unwrap();
    let header = Header::from_wire(&reply_header).unwrap();
    assert_eq!(header.data_len, 1);
    let mut status = [0u8; 1];
    stream.read_exact(&mut status).unwrap();
    assert_eq!(status[0], 1, "first registration should succeed");
}
