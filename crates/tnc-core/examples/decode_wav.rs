// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Offline WAV decode example
//!
//! Demodulates a mono, 16-bit PCM WAV recording of an AFSK 1200 bps
//! packet channel and prints every AX.25 frame recovered from it.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example decode_wav -- capture.wav
//! ```
//!
//! The WAV file's sample rate must match the demodulator's configured
//! rate (9600 Hz by default).

use tnc_core::ax25::Frame;
use tnc_core::audio::wav::decode_file;
use tnc_core::config::DEFAULT_SAMPLE_RATE_HZ;
use tnc_core::demod::{DemodConfig, Demodulator};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .ok_or("usage: decode_wav <path-to-wav>")?;

    println!("=== tnc-core offline WAV decode ===\n");
    println!("[1/2] Opening {path} at {DEFAULT_SAMPLE_RATE_HZ} Hz, AFSK 1200...");

    let config = DemodConfig::afsk_1200(DEFAULT_SAMPLE_RATE_HZ);
    let mut demod = Demodulator::new(&config);

    println!("[2/2] Decoding...\n");
    let events = decode_file(&path, &mut demod)?;

    let mut frame_count = 0;
    for event in events {
        match event.result {
            Ok(payload) => match Frame::from_wire(&payload) {
                Ok(frame) => {
                    frame_count += 1;
                    println!("{}", frame.to_text());
                }
                Err(e) => eprintln!("slicer {}: bad AX.25 frame: {e:?}", event.slicer),
            },
            Err(e) => eprintln!("slicer {}: HDLC error: {e:?}", event.slicer),
        }
    }

    println!("\n=== {frame_count} frame(s) decoded ===");
    Ok(())
}
