// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! §8 scenario 1: the literal KISS encoding example from the spec.

use tnc_core::kiss::{encode, KissCodec, KissCommand};

#[test]
fn literal_kiss_encoding_scenario() {
    // Input bytes 0xC0 0x01 0xDB 0x02, channel 0, command Data.
    let input = [0xC0u8, 0x01, 0xDB, 0x02];
    let encoded = encode(0, KissCommand::Data, &input);
    assert_eq!(
        encoded,
        vec![0xC0, 0xDB, 0xDC, 0x01, 0xDB, 0xDD, 0x02, 0xC0]
    );

    let mut codec = KissCodec::new();
    let mut decoded = None;
    for &b in &encoded {
        if let Some(result) = codec.push_byte(b) {
            decoded = Some(result.unwrap());
        }
    }
    let frame = decoded.expect("one frame decoded");
    assert_eq!(frame.channel, 0);
    assert_eq!(frame.command, KissCommand::Data);
    assert_eq!(frame.body, input);
}

#[test]
fn kiss_round_trip_for_arbitrary_bytes() {
    let samples: &[&[u8]] = &[
        &[],
        &[0x00],
        &[0xC0, 0xC0, 0xC0],
        &[0xDB, 0xDB, 0xDB],
        &(0u8..=255).collect::<Vec<u8>>(),
    ];
    for body in samples {
        let encoded = encode(2, KissCommand::Data, body);
        let mut codec = KissCodec::new();
        let mut decoded = None;
        for &b in &encoded {
            if let Some(result) = codec.push_byte(b) {
                decoded = Some(result.unwrap());
            }
        }
        let frame = decoded.unwrap_or_else(|| panic!("frame for {body:?} never completed"));
        assert_eq!(frame.channel, 2);
        assert_eq!(&frame.body, body);
    }
}
