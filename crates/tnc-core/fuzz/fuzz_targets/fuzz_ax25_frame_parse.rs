// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use tnc_core::ax25::Frame;

fuzz_target!(|data: &[u8]| {
    let _ = Frame::from_wire(data);
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = Frame::from_text(text);
    }
});
