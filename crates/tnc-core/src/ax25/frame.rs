// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! AX.25 frame object and wire/text codec (§4.4).

use crate::ax25::address::{Address, WIRE_LEN};
use crate::ax25::Ax25ParseError;
use crate::config::{AX25_MAX_DIGIS, AX25_MAX_INFO_LEN};

/// Control-field value for an Unnumbered Information (UI) frame, P/F
/// bit clear. UI frames are the only unconnected, info-carrying frame
/// type this TNC originates or needs to fully decode.
pub const CONTROL_UI: u8 = 0x03;

/// A decoded AX.25 frame: addresses, control/PID octets, info field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Destination address.
    pub destination: Address,
    /// Source address.
    pub source: Address,
    /// Digipeater path, in transmission order (first hop first).
    pub digis: Vec<Address>,
    /// Control octet.
    pub control: u8,
    /// Protocol ID octet, present for I and UI frames only.
    pub pid: Option<u8>,
    /// Information field payload.
    pub info: Vec<u8>,
}

impl Frame {
    /// Build a connectionless UI frame, the shape originated by the
    /// digipeater/router path (§4.8) and most TNC-protocol clients.
    pub fn new_ui(
        source: Address,
        destination: Address,
        digis: Vec<Address>,
        pid: u8,
        info: Vec<u8>,
    ) -> Result<Self, Ax25ParseError> {
        if digis.len() > AX25_MAX_DIGIS {
            return Err(Ax25ParseError::TooManyDigis(digis.len()));
        }
        if info.len() > AX25_MAX_INFO_LEN {
            return Err(Ax25ParseError::InfoTooLong(info.len()));
        }
        Ok(Self {
            destination,
            source,
            digis,
            control: CONTROL_UI,
            pid: Some(pid),
            info,
        })
    }

    /// Whether this frame carries a PID octet and information field
    /// (true for I frames and UI frames, false for S and other U
    /// frames).
    #[must_use]
    pub fn control_carries_info(control: u8) -> bool {
        if control & 0x01 == 0 {
            true // I frame
        } else if control & 0x03 == 0x03 {
            (control & !0x10) == CONTROL_UI
        } else {
            false // S frame
        }
    }

    /// Decode a frame from its wire form: destination, source, up to
    /// [`AX25_MAX_DIGIS`] digipeater addresses, control, optional PID,
    /// info.
    pub fn from_wire(bytes: &[u8]) -> Result<Self, Ax25ParseError> {
        if bytes.len() < WIRE_LEN * 2 + 1 {
            return Err(Ax25ParseError::FrameTooShort);
        }
        let mut offset = 0;
        let (destination, dest_last) = Address::from_wire(&bytes[offset..])?;
        offset += WIRE_LEN;
        if dest_last {
            return Err(Ax25ParseError::MissingSourceAddress);
        }
        let (source, mut last_seen) = Address::from_wire(&bytes[offset..])?;
        offset += WIRE_LEN;

        let mut digis = Vec::new();
        while !last_seen {
            if digis.len() >= AX25_MAX_DIGIS {
                return Err(Ax25ParseError::TooManyDigis(digis.len() + 1));
            }
            if bytes.len() < offset + WIRE_LEN {
                return Err(Ax25ParseError::FrameTooShort);
            }
            let (digi, last) = Address::from_wire(&bytes[offset..])?;
            digis.push(digi);
            offset += WIRE_LEN;
            last_seen = last;
        }

        if bytes.len() <= offset {
            return Err(Ax25ParseError::MissingControl);
        }
        let control = bytes[offset];
        offset += 1;

        let (pid, info_start) = if Self::control_carries_info(control) {
            if bytes.len() <= offset {
                return Err(Ax25ParseError::MissingPid);
            }
            (Some(bytes[offset]), offset + 1)
        } else {
            (None, offset)
        };

        let info = bytes[info_start..].to_vec();
        if info.len() > AX25_MAX_INFO_LEN {
            return Err(Ax25ParseError::InfoTooLong(info.len()));
        }

        Ok(Self {
            destination,
            source,
            digis,
            control,
            pid,
            info,
        })
    }

    /// Encode this frame to its wire form: destination, source, digis,
    /// control, optional PID, info. No HDLC flags or FCS (see
    /// [`crate::hdlc`]).
    #[must_use]
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            WIRE_LEN * (2 + self.digis.len()) + 2 + self.info.len(),
        );
        out.extend_from_slice(&self.destination.to_wire(false));
        let source_is_last = self.digis.is_empty();
        out.extend_from_slice(&self.source.to_wire(source_is_last));
        for (i, digi) in self.digis.iter().enumerate() {
            let last = i == self.digis.len() - 1;
            out.extend_from_slice(&digi.to_wire(last));
        }
        out.push(self.control);
        if let Some(pid) = self.pid {
            out.push(pid);
        }
        out.extend_from_slice(&self.info);
        out
    }

    /// Parse `SRC>DEST[,DIGI1[*],...]:INFO` text form into a UI frame
    /// (PID defaults to 0xF0, "no layer 3 protocol", the conventional
    /// value for APRS/packet text traffic).
    pub fn from_text(text: &str) -> Result<Self, Ax25ParseError> {
        let (header, info) = text
            .split_once(':')
            .ok_or(Ax25ParseError::TextFormatInvalid)?;
        let (src_str, rest) = header
            .split_once('>')
            .ok_or(Ax25ParseError::TextFormatInvalid)?;

        let mut path = rest.split(',');
        let dest_str = path.next().ok_or(Ax25ParseError::TextFormatInvalid)?;

        let source = Address::from_text(src_str)?;
        let destination = Address::from_text(dest_str)?;

        let mut digis = Vec::new();
        for digi_str in path {
            let has_been_repeated = digi_str.ends_with('*');
            let clean = digi_str.trim_end_matches('*');
            let mut digi = Address::from_text(clean)?;
            digi.c_or_h_bit = has_been_repeated;
            digis.push(digi);
        }

        Self::new_ui(source, destination, digis, 0xF0, info.as_bytes().to_vec())
    }

    /// Render as `SRC>DEST[,DIGI1[*],...]:INFO`.
    ///
    /// A digi marked `has_been_repeated` (the `H` bit) gets a trailing
    /// `*`, matching common TNC monitor output.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = format!("{}>{}", self.source.to_text(), self.destination.to_text());
        for digi in &self.digis {
            out.push(',');
            out.push_str(&digi.to_text());
            if digi.c_or_h_bit {
                out.push('*');
            }
        }
        out.push(':');
        out.push_str(&String::from_utf8_lossy(&self.info));
        out
    }
}
