// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! §8 scenario 2: the literal AX.25 text-form parse example.

use tnc_core::ax25::Frame;

/// UI frame control octet, P/F bit clear (§4.4).
const CONTROL_UI: u8 = 0x03;

#[test]
fn literal_text_parse_scenario() {
    let frame = Frame::from_text("N0CALL-1>APRS,WIDE1-1:!4012.34N/07400.56W-test").unwrap();

    assert_eq!(frame.source.callsign, "N0CALL");
    assert_eq!(frame.source.ssid, 1);
    assert_eq!(frame.destination.callsign, "APRS");
    assert_eq!(frame.destination.ssid, 0);

    assert_eq!(frame.digis.len(), 1);
    assert_eq!(frame.digis[0].callsign, "WIDE1");
    assert_eq!(frame.digis[0].ssid, 1);
    assert!(!frame.digis[0].c_or_h_bit, "WIDE1-1 not yet used");

    assert_eq!(frame.control, CONTROL_UI);
    assert_eq!(frame.pid, Some(0xF0));
    assert_eq!(frame.info, b"!4012.34N/07400.56W-test");
}

#[test]
fn missing_digipeater_list_and_omitted_zero_ssid_are_accepted() {
    let frame = Frame::from_text("N0CALL>APRS:hello").unwrap();
    assert!(frame.digis.is_empty());
    assert_eq!(frame.source.ssid, 0);
    assert_eq!(frame.to_text(), "N0CALL>APRS:hello");
}
