// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Octet-level HDLC receiver and transmitter built on top of
//! [`crate::hdlc::bitstream`] and [`crate::hdlc::crc`] (§4.3, §4.7).

use crate::config::AX25_MAX_INFO_LEN;
use crate::hdlc::bitstream::{stuff_bits, BitDestuffer, BitEvent, OctetAssembler};
use crate::hdlc::crc;
use crate::{tnc_trace_debug, tnc_trace_warn};
use std::fmt;

/// Smallest legal HDLC frame: two address octets is impossible for
/// AX.25, but at the bit layer the only hard floor is "enough for an
/// FCS".
const MIN_FRAME_LEN: usize = 2;

/// Largest raw (address+control+PID+info+FCS) frame this receiver will
/// assemble before giving up and discarding it as oversized.
const MAX_RAW_FRAME_LEN: usize = AX25_MAX_INFO_LEN + 32 + 2;

/// HDLC-layer failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HdlcError {
    /// A 7+ run of one-bits was seen mid-frame.
    Abort,
    /// The frame's FCS did not match.
    CrcMismatch,
    /// The frame was shorter than the minimum two FCS octets.
    TooShort,
    /// The frame exceeded the maximum size and was discarded.
    TooLong,
}

impl fmt::Display for HdlcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => write!(f, "abort sequence received"),
            Self::CrcMismatch => write!(f, "frame check sequence mismatch"),
            Self::TooShort => write!(f, "frame shorter than minimum length"),
            Self::TooLong => write!(f, "frame exceeded maximum length"),
        }
    }
}

impl std::error::Error for HdlcError {}

/// Bit-by-bit HDLC frame receiver.
///
/// Consumes one destuffed line bit at a time (after NRZI decode, in
/// [`crate::demod`]) and yields complete, FCS-verified frames with the
/// trailing FCS octets already stripped.
#[derive(Debug)]
pub struct HdlcReceiver {
    destuffer: BitDestuffer,
    assembler: OctetAssembler,
    buf: Vec<u8>,
    in_frame: bool,
}

impl HdlcReceiver {
    /// New receiver, not currently inside a frame.
    #[must_use]
    pub fn new() -> Self {
        Self {
            destuffer: BitDestuffer::new(),
            assembler: OctetAssembler::new(),
            buf: Vec::with_capacity(MAX_RAW_FRAME_LEN),
            in_frame: false,
        }
    }

    /// Feed one NRZI-decoded data bit in.
    ///
    /// Returns `Ok(Some(frame))` for each successfully verified frame
    /// (FCS already stripped), `Ok(None)` when no frame boundary has
    /// been reached yet, or `Err` for an abort/CRC/length failure on
    /// the frame just terminated (the receiver resets and keeps going).
    pub fn push_bit(&mut self, bit: bool) -> Result<Option<Vec<u8>>, HdlcError> {
        match self.destuffer.push_bit(bit) {
            BitEvent::Pending => Ok(None),
            BitEvent::Abort => {
                self.reset();
                tnc_trace_warn!("hdlc: abort sequence");
                Err(HdlcError::Abort)
            }
            BitEvent::Flag => {
                let result = if self.in_frame && self.buf.len() >= MIN_FRAME_LEN {
                    Some(self.finish_frame())
                } else {
                    None
                };
                self.buf.clear();
                self.assembler.reset();
                self.in_frame = true;
                match result {
                    Some(Ok(frame)) => Ok(Some(frame)),
                    Some(Err(e)) => Err(e),
                    None => Ok(None),
                }
            }
            BitEvent::Bit(b) => {
                if !self.in_frame {
                    return Ok(None);
                }
                if let Some(octet) = self.assembler.push_bit(b) {
                    if self.buf.len() >= MAX_RAW_FRAME_LEN {
                        self.reset();
                        return Err(HdlcError::TooLong);
                    }
                    self.buf.push(octet);
                }
                Ok(None)
            }
        }
    }

    fn finish_frame(&mut self) -> Result<Vec<u8>, HdlcError> {
        if self.buf.len() < MIN_FRAME_LEN {
            return Err(HdlcError::TooShort);
        }
        match crc::verify_and_strip(&self.buf) {
            Some(payload) => {
                tnc_trace_debug!("hdlc: frame ok, {} octets", payload.len());
                Ok(payload.to_vec())
            }
            None => Err(HdlcError::CrcMismatch),
        }
    }

    /// Abandon any in-progress frame (used on abort, disconnect, or DCD loss).
    pub fn reset(&mut self) {
        self.buf.clear();
        self.assembler.reset();
        self.in_frame = false;
    }
}

impl Default for HdlcReceiver {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a complete AX.25 frame payload (address + control + PID +
/// info, no FCS, no flags) into the NRZI-ready bit sequence: FCS
/// appended, bit-stuffed, and framed with leading/trailing flag octets.
///
/// `lead_flags`/`trail_flags` let the caller fold preamble/postamble
/// flag padding into the same stuffed bit stream (the flags themselves
/// are never bit-stuffed).
#[must_use]
pub fn encode_frame(payload: &[u8], lead_flags: usize, trail_flags: usize) -> Vec<bool> {
    let mut with_fcs = payload.to_vec();
    crc::append_fcs(&mut with_fcs);

    let flag_bits = octet_bits(crate::config::HDLC_FLAG);
    let mut out = Vec::with_capacity(
        lead_flags * 8 + with_fcs.len() * 9 / 8 + 8 + trail_flags * 8,
    );
    for _ in 0..lead_flags {
        out.extend_from_slice(&flag_bits);
    }
    out.extend(stuff_bits(&with_fcs));
    out.extend_from_slice(&flag_bits);
    for _ in 1..trail_flags {
        out.extend_from_slice(&flag_bits);
    }
    out
}

fn octet_bits(octet: u8) -> [bool; 8] {
    let mut bits = [false; 8];
    for (i, bit) in bits.iter_mut().enumerate() {
        *bit = (octet >> i) & 1 != 0;
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(bits: &[bool]) -> Vec<Result<Vec<u8>, HdlcError>> {
        let mut rx = HdlcReceiver::new();
        let mut out = Vec::new();
        for &bit in bits {
            match rx.push_bit(bit) {
                Ok(Some(frame)) => out.push(Ok(frame)),
                Err(e) => out.push(Err(e)),
                Ok(None) => {}
            }
        }
        out
    }

    #[test]
    fn round_trips_a_frame() {
        let payload = b"\x82\xA0\xA4\xA6\x40\x40\x60\x03\xF0hello".to_vec();
        let bits = encode_frame(&payload, 2, 2);
        let frames = decode_all(&bits);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref().unwrap(), &payload);
    }

    #[test]
    fn back_to_back_frames_share_one_flag() {
        let a = b"AAAA".to_vec();
        let b = b"BBBBBB".to_vec();
        let mut bits = encode_frame(&a, 1, 1);
        bits.extend(encode_frame(&b, 0, 1));
        let frames = decode_all(&bits);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_ref().unwrap(), &a);
        assert_eq!(frames[1].as_ref().unwrap(), &b);
    }

    #[test]
    fn corrupted_frame_reports_crc_mismatch() {
        let payload = b"corrupt me".to_vec();
        let mut bits = encode_frame(&payload, 1, 1);
        // Flip a data bit well inside the frame (after the leading flag).
        let flip_at = 12;
        bits[flip_at] = !bits[flip_at];
        let frames = decode_all(&bits);
        assert!(frames.iter().any(|f| matches!(f, Err(HdlcError::CrcMismatch))));
    }

    #[test]
    fn abort_sequence_is_reported() {
        let mut rx = HdlcReceiver::new();
        rx.in_frame = true;
        let mut saw_abort = false;
        for _ in 0..7 {
            if let Err(HdlcError::Abort) = rx.push_bit(true) {
                saw_abort = true;
            }
        }
        assert!(saw_abort);
    }
}
