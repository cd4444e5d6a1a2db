// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Compile-time configurable protocol tracing.
//!
//! Day-to-day operational logging goes through the `log` crate facade
//! (`log::debug!`/`log::warn!`/...) exactly as it does throughout the rest
//! of this crate, so a host binary picks its own backend. This module is a
//! second, narrower tier: wire-level tracing (HDLC frame hex dumps, KISS
//! frame boundaries, TNC-protocol headers) that would be too noisy to run
//! through the ordinary logger in production but is invaluable when
//! debugging a modem or protocol issue.
//!
//! - **Zero-cost when disabled**: macros expand to nothing unless the
//!   `logging` Cargo feature is enabled.
//! - **Thread-safe**: a single global logger guarded by a mutex.
//! - **Flexible output**: console or file.
//!
//! ## Example
//!
//! ```ignore
//! use tnc_core::logging::{init_logger, ConsoleOutput, LogLevel};
//! use std::sync::Arc;
//!
//! let console = Arc::new(ConsoleOutput::new(LogLevel::Debug));
//! init_logger(console, LogLevel::Debug);
//!
//! tnc_trace_debug!("hdlc: flag sync acquired on ch {} slicer {}", ch, slicer);
//! ```

#[cfg(feature = "logging")]
pub mod logger;
#[cfg(feature = "logging")]
mod output;

#[cfg(feature = "logging")]
pub use output::{ConsoleOutput, FileOutput, LogLevel, Output};

#[cfg(feature = "logging")]
pub use logger::{flush_logger, init_logger};

/// Debug-level protocol trace message.
///
/// Only emitted if compiled with the `logging` feature and level >= Debug.
#[macro_export]
#[cfg(feature = "logging")]
macro_rules! tnc_trace_debug {
    ($($arg:tt)*) => {
        let _ = $crate::logging::logger::log_message(
            $crate::logging::LogLevel::Debug,
            &format!($($arg)*),
        );
    };
}

/// Info-level protocol trace message.
#[macro_export]
#[cfg(feature = "logging")]
macro_rules! tnc_trace_info {
    ($($arg:tt)*) => {
        let _ = $crate::logging::logger::log_message(
            $crate::logging::LogLevel::Info,
            &format!($($arg)*),
        );
    };
}

/// Warning-level protocol trace message.
#[macro_export]
#[cfg(feature = "logging")]
macro_rules! tnc_trace_warn {
    ($($arg:tt)*) => {
        let _ = $crate::logging::logger::log_message(
            $crate::logging::LogLevel::Warning,
            &format!($($arg)*),
        );
    };
}

/// Error-level protocol trace message.
#[macro_export]
#[cfg(feature = "logging")]
macro_rules! tnc_trace_error {
    ($($arg:tt)*) => {
        let _ = $crate::logging::logger::log_message(
            $crate::logging::LogLevel::Error,
            &format!($($arg)*),
        );
    };
}

/// Function entry trace marker (only active with `logging` + `trace` features).
#[macro_export]
#[cfg(all(feature = "logging", feature = "trace"))]
macro_rules! tnc_trace_fn {
    ($fn_name:expr) => {
        let _ = $crate::logging::logger::trace_entry($fn_name);
    };
}

/// No-op trace-fn marker (when `trace` feature disabled).
#[macro_export]
#[cfg(not(all(feature = "logging", feature = "trace")))]
macro_rules! tnc_trace_fn {
    ($fn_name:expr) => {};
}

/// No-op debug trace macro (when `logging` feature disabled).
#[macro_export]
#[cfg(not(feature = "logging"))]
macro_rules! tnc_trace_debug {
    ($($arg:tt)*) => {};
}

/// No-op info trace macro (when `logging` feature disabled).
#[macro_export]
#[cfg(not(feature = "logging"))]
macro_rules! tnc_trace_info {
    ($($arg:tt)*) => {};
}

/// No-op warn trace macro (when `logging` feature disabled).
#[macro_export]
#[cfg(not(feature = "logging"))]
macro_rules! tnc_trace_warn {
    ($($arg:tt)*) => {};
}

/// No-op error trace macro (when `logging` feature disabled).
#[macro_export]
#[cfg(not(feature = "logging"))]
macro_rules! tnc_trace_error {
    ($($arg:tt)*) => {};
}

#[cfg(all(test, feature = "logging"))]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn macros_compile() {
        tnc_trace_debug!("debug message");
        tnc_trace_info!("info message");
        tnc_trace_warn!("warn message");
        tnc_trace_error!("error message");
        tnc_trace_debug!("with args: {}", 42);
    }

    #[test]
    fn init_and_log() {
        let console = Arc::new(ConsoleOutput::new(LogLevel::Debug));
        init_logger(console, LogLevel::Debug);

        tnc_trace_debug!("test debug");
        tnc_trace_info!("test info");
        assert!(flush_logger().is_ok());
    }
}

#[cfg(all(test, not(feature = "logging")))]
mod tests_disabled {
    #[test]
    fn macros_noop_disabled() {
        tnc_trace_debug!("not compiled");
        tnc_trace_info!("not compiled");
        tnc_trace_warn!("not compiled");
        tnc_trace_error!("not compiled");
    }
}
