// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Crate-wide error type.
//!
//! Each subsystem defines its own small error enum next to the code it
//! guards (`hdlc::HdlcError`, `ax25::Ax25ParseError`, `kiss::KissError`,
//! `tncserver::ProtocolError`, `txqueue::QueueError`). This module only
//! unifies them for callers of the top-level [`crate::runtime::Tnc`] API.

use std::fmt;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error returned by [`crate::runtime::Tnc`] entry points.
#[derive(Debug)]
pub enum Error {
    /// A channel index was out of the configured range.
    ChannelOutOfRange(usize),
    /// Malformed AX.25 frame (wire or text form).
    Ax25(crate::ax25::Ax25ParseError),
    /// HDLC bit-level receive/transmit failure.
    Hdlc(crate::hdlc::HdlcError),
    /// KISS codec failure.
    Kiss(crate::kiss::KissError),
    /// TNC TCP protocol failure.
    Protocol(crate::tncserver::ProtocolError),
    /// Transmit queue failure.
    Queue(crate::txqueue::QueueError),
    /// Underlying I/O failure (socket, serial, pty).
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelOutOfRange(ch) => write!(f, "channel {ch} out of range"),
            Self::Ax25(e) => write!(f, "ax.25: {e}"),
            Self::Hdlc(e) => write!(f, "hdlc: {e}"),
            Self::Kiss(e) => write!(f, "kiss: {e}"),
            Self::Protocol(e) => write!(f, "tnc protocol: {e}"),
            Self::Queue(e) => write!(f, "tx queue: {e}"),
            Self::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Ax25(e) => Some(e),
            Self::Hdlc(e) => Some(e),
            Self::Kiss(e) => Some(e),
            Self::Protocol(e) => Some(e),
            Self::Queue(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::ChannelOutOfRange(_) => None,
        }
    }
}

impl From<crate::ax25::Ax25ParseError> for Error {
    fn from(e: crate::ax25::Ax25ParseError) -> Self {
        Self::Ax25(e)
    }
}

impl From<crate::hdlc::HdlcError> for Error {
    fn from(e: crate::hdlc::HdlcError) -> Self {
        Self::Hdlc(e)
    }
}

impl From<crate::kiss::KissError> for Error {
    fn from(e: crate::kiss::KissError) -> Self {
        Self::Kiss(e)
    }
}

impl From<crate::tncserver::ProtocolError> for Error {
    fn from(e: crate::tncserver::ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

impl From<crate::txqueue::QueueError> for Error {
    fn from(e: crate::txqueue::QueueError) -> Self {
        Self::Queue(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
