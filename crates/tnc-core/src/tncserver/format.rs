// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Payload formatting for TNC-protocol responses that are not just
//! raw structs: the port list, port capabilities, and human-readable
//! monitor text (§4.10).

use crate::config::ChannelParams;

/// Build the `G` (port list) response body: `count;descr1;descr2;...`.
#[must_use]
pub fn port_list(descriptors: &[String]) -> String {
    let mut out = descriptors.len().to_string();
    for d in descriptors {
        out.push(';');
        out.push_str(d);
    }
    out
}

/// Build the `g` (port capabilities) 12-byte response body.
#[must_use]
pub fn port_capabilities(
    baud_code: u8,
    traffic: u8,
    params: &ChannelParams,
    maxframe: u8,
    active_conns: u8,
    count: u32,
) -> [u8; 12] {
    let mut out = [0u8; 12];
    out[0] = baud_code;
    out[1] = traffic;
    out[2] = (params.txdelay_ms / 10).min(255) as u8;
    out[3] = (params.txtail_ms / 10).min(255) as u8;
    out[4] = params.persist;
    out[5] = (params.slottime_ms / 10).min(255) as u8;
    out[6] = maxframe;
    out[7] = active_conns;
    out[8..12].copy_from_slice(&count.to_le_bytes());
    out
}

/// Format a received UI frame as monitor text (§4.10): `" ch:Fm SRC To
/// DEST <UI pid=XX Len=N >[HH:MM:SS]\rINFO\r\r"`, NUL-terminated.
#[must_use]
pub fn monitor_text(
    channel: u8,
    source: &str,
    destination: &str,
    pid: u8,
    info: &[u8],
    hh: u8,
    mm: u8,
    ss: u8,
) -> Vec<u8> {
    let header = format!(
        " {channel}:Fm {source} To {destination} <UI pid={pid:02X} Len={len} >[{hh:02}:{mm:02}:{ss:02}]\r",
        len = info.len(),
    );
    let mut out = header.into_bytes();
    out.extend_from_slice(info);
    out.extend_from_slice(b"\r\r");
    out.push(0);
    out
}

/// Current UTC wall-clock time as `(hour, minute, second)`, derived
/// from the system clock without pulling in a calendar crate.
#[must_use]
pub fn wall_clock_hms() -> (u8, u8, u8) {
    let secs_today = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() % 86_400)
        .unwrap_or(0);
    (
        (secs_today / 3600) as u8,
        ((secs_today / 60) % 60) as u8,
        (secs_today % 60) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_list_formats_count_and_descriptors() {
        let descriptors = vec!["Port 1 (1200 baud AFSK)".to_string()];
        assert_eq!(port_list(&descriptors), "1;Port 1 (1200 baud AFSK)");
    }

    #[test]
    fn monitor_text_matches_expected_shape() {
        let text = monitor_text(0, "N0CALL", "APRS", 0xF0, b"hello", 1, 2, 3);
        let text = String::from_utf8_lossy(&text);
        assert_eq!(
            text,
            " 0:Fm N0CALL To APRS <UI pid=F0 Len=5 >[01:02:03]\rhello\r\r\u{0}"
        );
    }

    #[test]
    fn port_capabilities_packs_channel_params() {
        let params = ChannelParams {
            txdelay_ms: 300,
            txtail_ms: 50,
            slottime_ms: 100,
            persist: 63,
            full_duplex: false,
        };
        let body = port_capabilities(0, 0, &params, 7, 1, 1);
        assert_eq!(body[2], 30);
        assert_eq!(body[3], 5);
        assert_eq!(body[4], 63);
        assert_eq!(body[5], 10);
    }
}
