// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! AX.25 address field: callsign, SSID, and the per-address control bits
//! packed into the 7-octet shifted-ASCII wire form (§4.4).

use crate::ax25::Ax25ParseError;

/// Width in octets of one address field on the wire.
pub const WIRE_LEN: usize = 7;

/// Maximum callsign length (before SSID).
pub const MAX_CALLSIGN_LEN: usize = 6;

/// One AX.25 address: a callsign, SSID, and the bit that is either the
/// command/response ("C") bit (destination/source addresses) or the
/// has-been-repeated ("H") bit (digipeater addresses), depending on
/// where the address sits in the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Callsign, 1-6 uppercase alphanumeric characters.
    pub callsign: String,
    /// Secondary station ID, 0-15.
    pub ssid: u8,
    /// Command/response bit on dest/source addresses; has-been-repeated
    /// bit on digipeater addresses. Bit 7 of the SSID octet.
    pub c_or_h_bit: bool,
}

impl Address {
    /// Build an address, validating callsign length and SSID range.
    pub fn new(callsign: &str, ssid: u8, c_or_h_bit: bool) -> Result<Self, Ax25ParseError> {
        if callsign.is_empty() || callsign.len() > MAX_CALLSIGN_LEN {
            return Err(Ax25ParseError::InvalidCallsign);
        }
        if !callsign.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(Ax25ParseError::InvalidCallsign);
        }
        if ssid > 15 {
            return Err(Ax25ParseError::SsidOutOfRange(ssid));
        }
        Ok(Self {
            callsign: callsign.to_ascii_uppercase(),
            ssid,
            c_or_h_bit,
        })
    }

    /// Decode one 7-octet shifted-ASCII address field.
    ///
    /// `last_address` reports whether the wire extension bit (bit 0 of
    /// the SSID octet) was set, i.e. no further address fields follow.
    pub fn from_wire(bytes: &[u8]) -> Result<(Self, bool), Ax25ParseError> {
        if bytes.len() < WIRE_LEN {
            return Err(Ax25ParseError::InvalidAddressLength);
        }
        let mut callsign = String::with_capacity(MAX_CALLSIGN_LEN);
        for &b in &bytes[0..6] {
            let ch = (b >> 1) as char;
            if ch != ' ' {
                if !ch.is_ascii_alphanumeric() {
                    return Err(Ax25ParseError::InvalidCallsign);
                }
                callsign.push(ch);
            }
        }
        if callsign.is_empty() {
            return Err(Ax25ParseError::InvalidCallsign);
        }
        let ssid_octet = bytes[6];
        let ssid = (ssid_octet >> 1) & 0x0F;
        let c_or_h_bit = ssid_octet & 0x80 != 0;
        let last_address = ssid_octet & 0x01 != 0;
        Ok((
            Self {
                callsign,
                ssid,
                c_or_h_bit,
            },
            last_address,
        ))
    }

    /// Encode this address into its 7-octet shifted-ASCII wire form.
    ///
    /// `last_address` sets the wire extension bit; reserved bits 5-6 of
    /// the SSID octet are always transmitted as 1 per convention.
    pub fn to_wire(&self, last_address: bool) -> [u8; WIRE_LEN] {
        let mut out = [0u8; WIRE_LEN];
        let padded = format!("{:<6}", self.callsign);
        for (i, ch) in padded.bytes().take(6).enumerate() {
            out[i] = ch << 1;
        }
        let mut ssid_octet = (self.ssid << 1) | 0x60;
        if self.c_or_h_bit {
            ssid_octet |= 0x80;
        }
        if last_address {
            ssid_octet |= 0x01;
        }
        out[6] = ssid_octet;
        out
    }

    /// Render as `CALL` or `CALL-SSID` (SSID 0 is never written out).
    #[must_use]
    pub fn to_text(&self) -> String {
        if self.ssid == 0 {
            self.callsign.clone()
        } else {
            format!("{}-{}", self.callsign, self.ssid)
        }
    }

    /// Parse `CALL` or `CALL-SSID` text form.
    pub fn from_text(text: &str) -> Result<Self, Ax25ParseError> {
        let (call, ssid) = match text.split_once('-') {
            Some((call, ssid_str)) => {
                let ssid = ssid_str
                    .parse::<u8>()
                    .map_err(|_| Ax25ParseError::TextFormatInvalid)?;
                (call, ssid)
            }
            None => (text, 0),
        };
        Self::new(call, ssid, false)
    }
}
