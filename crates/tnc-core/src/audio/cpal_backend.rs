// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `cpal`-backed live audio, behind the `audio-cpal` feature. Real
//! soundcard I/O is the one ambient concern this core cannot exercise
//! in CI, so it stays optional; the default feature set builds and
//! tests entirely against the offline WAV path and `NullPtt`.

use crate::audio::AudioSource;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream};
use std::io;

/// An `AudioSource` backed by the host's default input device via
/// `cpal`.
pub struct CpalSource {
    stream: Option<Stream>,
}

impl CpalSource {
    #[must_use]
    pub fn new() -> Self {
        Self { stream: None }
    }
}

impl Default for CpalSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for CpalSource {
    fn start(
        &mut self,
        sample_rate_hz: u32,
        channels: u16,
        mut callback: Box<dyn FnMut(usize, f64) + Send>,
    ) -> io::Result<()> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no default input audio device"))?;

        let config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate_hz),
            buffer_size: cpal::BufferSize::Default,
        };

        let supported_format = device
            .default_input_config()
            .map_err(|e| io::Error::other(e.to_string()))?
            .sample_format();

        let err_fn = |e| log::warn!("audio: cpal input stream error: {e}");

        let stream = match supported_format {
            SampleFormat::F32 => device
                .build_input_stream(
                    &config,
                    move |data: &[f32], _| {
                        for (i, &sample) in data.iter().enumerate() {
                            callback(i % channels as usize, f64::from(sample));
                        }
                    },
                    err_fn,
                    None,
                )
                .map_err(|e| io::Error::other(e.to_string()))?,
            SampleFormat::I16 => device
                .build_input_stream(
                    &config,
                    move |data: &[i16], _| {
                        for (i, &sample) in data.iter().enumerate() {
                            callback(i % channels as usize, f64::from(sample) / f64::from(i16::MAX));
                        }
                    },
                    err_fn,
                    None,
                )
                .map_err(|e| io::Error::other(e.to_string()))?,
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("unsupported cpal sample format: {other:?}"),
                ))
            }
        };

        stream.play().map_err(|e| io::Error::other(e.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) {
        self.stream.take();
    }
}
