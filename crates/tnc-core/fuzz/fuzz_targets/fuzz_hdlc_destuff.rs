// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use tnc_core::hdlc::HdlcReceiver;

fuzz_target!(|data: &[u8]| {
    let mut rx = HdlcReceiver::new();
    for &byte in data {
        for i in 0..8 {
            let bit = (byte >> i) & 1 != 0;
            let _ = rx.push_bit(bit);
        }
    }
});
