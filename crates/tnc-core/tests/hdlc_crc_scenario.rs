// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! §8 scenario 6: HDLC encoding plus CRC-16/X.25 over a literal frame.

use tnc_core::hdlc::{crc, encode_frame, HdlcReceiver};

/// Addresses for `AAB123>TEST-W`, control 0x03, PID 0xF0, info "hi".
const FRAME: [u8; 18] = [
    0xA8, 0xA0, 0x64, 0x82, 0xA4, 0xA6, 0x60, 0x96, 0x6E, 0x84, 0x96, 0xA4, 0xA8, 0x7B, 0x03, 0xF0,
    0x68, 0x69,
];

#[test]
fn fcs_is_deterministic_and_checked_by_the_receiver() {
    let fcs = crc::fcs(&FRAME);

    let mut with_fcs = FRAME.to_vec();
    with_fcs.extend_from_slice(&fcs.to_le_bytes());
    assert_eq!(crc::verify_and_strip(&with_fcs), Some(&FRAME[..]));

    // Flipping any payload bit must change the computed FCS.
    let mut corrupted = FRAME;
    corrupted[0] ^= 0x01;
    assert_ne!(crc::fcs(&corrupted), fcs);
}

#[test]
fn hdlc_encoded_stream_is_flag_delimited_and_contains_no_unstuffed_runs() {
    let bits = encode_frame(&FRAME, 1, 1);

    // Starts and ends with the flag octet 0x7E = 01111110, LSB first.
    let flag_bits: Vec<bool> = (0..8).map(|i| (0x7Eu8 >> i) & 1 != 0).collect();
    assert_eq!(&bits[0..8], &flag_bits[..]);
    assert_eq!(&bits[bits.len() - 8..], &flag_bits[..]);

    // Between the flags, no six consecutive 1-bits may survive (every
    // run of five real 1-bits has a stuffed 0 after it).
    let body = &bits[8..bits.len() - 8];
    let mut run = 0u32;
    for &bit in body {
        if bit {
            run += 1;
            assert!(run <= 5, "unstuffed run of {run} ones found in encoded body");
        } else {
            run = 0;
        }
    }
}

#[test]
fn hdlc_round_trip_recovers_the_original_frame_and_strips_the_fcs() {
    let bits = encode_frame(&FRAME, 2, 2);
    let mut rx = HdlcReceiver::new();
    let mut frames = Vec::new();
    for bit in bits {
        if let Ok(Some(frame)) = rx.push_bit(bit) {
            frames.push(frame);
        }
    }
    assert_eq!(frames, vec![FRAME.to_vec()]);
}
