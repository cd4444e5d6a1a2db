// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! KISS host endpoints: pseudo-terminal, TCP, or anything else that
//! can read and write a byte stream (§6 External Interfaces).

use std::io::{self, Read, Write};
use std::net::TcpStream;

/// A byte-stream endpoint a [`super::KissCodec`] can be driven over.
///
/// Implementors own their transport; `close` is best-effort and safe
/// to call more than once.
pub trait KissEndpoint: Send {
    /// Block for up to one byte of input. Returns `Ok(None)` on a
    /// clean remote close.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Write a complete encoded KISS frame (or any raw bytes).
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Release the underlying transport.
    fn close(&mut self);
}

/// A KISS endpoint backed by a plain TCP stream (network KISS, §6).
pub struct TcpEndpoint {
    stream: TcpStream,
}

impl TcpEndpoint {
    #[must_use]
    pub fn new(stream: TcpStream) -> Self {
        let _ = stream.set_nodelay(true);
        Self { stream }
    }
}

impl KissEndpoint for TcpEndpoint {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.stream.read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(e) => Err(e),
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes)
    }

    fn close(&mut self) {
        let _ = self.stream.shutdown(std::net::Shutdown::Both);
    }
}

#[cfg(unix)]
pub use unix::PtyEndpoint;

#[cfg(unix)]
mod unix {
    use super::KissEndpoint;
    use std::ffi::CStr;
    use std::fs::File;
    use std::io::{self, Read, Write};
    use std::os::unix::io::FromRawFd;
    use std::path::{Path, PathBuf};

    /// A KISS endpoint backed by a Unix pseudo-terminal. The slave side's
    /// device path is symlinked at `link_path` (conventionally
    /// `/tmp/kisstnc`) so a host application can open it like a serial
    /// port (§6 External Interfaces).
    pub struct PtyEndpoint {
        master: File,
        link_path: PathBuf,
    }

    impl PtyEndpoint {
        /// Open a new pseudo-terminal pair and publish its slave path at
        /// `link_path` via a symlink, replacing any stale symlink left
        /// behind by a previous run.
        pub fn open(link_path: impl Into<PathBuf>) -> io::Result<Self> {
            let link_path = link_path.into();

            // SAFETY: `posix_openpt` is called with a valid flag
            // combination and its return value is checked before use.
            let master_fd = unsafe { libc::posix_openpt(libc::O_RDWR | libc::O_NOCTTY) };
            if master_fd < 0 {
                return Err(io::Error::last_os_error());
            }

            // SAFETY: `master_fd` was just returned by `posix_openpt` and
            // is a valid, open descriptor at this point.
            if unsafe { libc::grantpt(master_fd) } != 0 {
                return Err(io::Error::last_os_error());
            }
            // SAFETY: same descriptor, still open and owned by this call.
            if unsafe { libc::unlockpt(master_fd) } != 0 {
                return Err(io::Error::last_os_error());
            }

            let slave_path = slave_name(master_fd)?;

            let _ = std::fs::remove_file(&link_path);
            std::os::unix::fs::symlink(&slave_path, &link_path)?;

            // SAFETY: `master_fd` is a valid, open, uniquely-owned
            // descriptor; wrapping it in `File` transfers ownership so it
            // is closed exactly once, on drop.
            let master = unsafe { File::from_raw_fd(master_fd) };

            Ok(Self { master, link_path })
        }

        /// The filesystem path of the published symlink.
        #[must_use]
        pub fn link_path(&self) -> &Path {
            &self.link_path
        }
    }

    fn slave_name(master_fd: libc::c_int) -> io::Result<PathBuf> {
        let mut buf = vec![0u8; 256];
        // SAFETY: `buf` is large enough for any realistic pty device path
        // and `master_fd` is the valid master descriptor being queried.
        let rc = unsafe { libc::ptsname_r(master_fd, buf.as_mut_ptr().cast(), buf.len()) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: `ptsname_r` NUL-terminates on success.
        let cstr = unsafe { CStr::from_ptr(buf.as_ptr().cast()) };
        Ok(PathBuf::from(cstr.to_string_lossy().into_owned()))
    }

    impl KissEndpoint for PtyEndpoint {
        fn read_byte(&mut self) -> io::Result<Option<u8>> {
            let mut byte = [0u8; 1];
            match self.master.read(&mut byte) {
                Ok(0) => Ok(None),
                Ok(_) => Ok(Some(byte[0])),
                Err(e) => Err(e),
            }
        }

        fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
            self.master.write_all(bytes)
        }

        fn close(&mut self) {
            let _ = std::fs::remove_file(&self.link_path);
        }
    }

    impl Drop for PtyEndpoint {
        fn drop(&mut self) {
            self.close();
        }
    }
}
