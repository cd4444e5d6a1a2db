// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use tnc_core::kiss::KissCodec;

fuzz_target!(|data: &[u8]| {
    let mut codec = KissCodec::new();
    for &byte in data {
        let _ = codec.push_byte(byte);
    }
});
