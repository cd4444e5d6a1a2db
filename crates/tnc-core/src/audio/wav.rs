// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Offline RIFF/WAVE decoder mode (§6): drives the same per-sample
//! demodulator entry point as live audio, for batch decoding captured
//! recordings and for deterministic tests.

use crate::demod::{Demodulator, SlicerEvent};
use std::fmt;
use std::path::Path;

/// Offline WAV decode failure.
#[derive(Debug)]
pub enum WavError {
    /// The container's declared sample rate did not match the
    /// demodulator it is being fed into.
    SampleRateMismatch { expected: u32, actual: u32 },
    /// Any error surfaced by the underlying WAV reader (bad header,
    /// truncated file, unsupported sample format).
    Hound(hound::Error),
}

impl fmt::Display for WavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SampleRateMismatch { expected, actual } => {
                write!(f, "wav sample rate {actual} does not match configured {expected}")
            }
            Self::Hound(e) => write!(f, "wav decode error: {e}"),
        }
    }
}

impl std::error::Error for WavError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Hound(e) => Some(e),
            Self::SampleRateMismatch { .. } => None,
        }
    }
}

impl From<hound::Error> for WavError {
    fn from(e: hound::Error) -> Self {
        Self::Hound(e)
    }
}

/// Decode every sample of a mono, 16-bit PCM WAV file at `path`
/// through `demod`, returning every HDLC frame-boundary event
/// produced along the way, in sample order.
pub fn decode_file(path: impl AsRef<Path>, demod: &mut Demodulator) -> Result<Vec<SlicerEvent>, WavError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let expected = demod.sample_rate_hz().round() as u32;
    if spec.sample_rate != expected {
        return Err(WavError::SampleRateMismatch {
            expected,
            actual: spec.sample_rate,
        });
    }

    let mut events = Vec::new();
    for sample in reader.samples::<i16>() {
        let sample = sample?;
        let normalized = f64::from(sample) / f64::from(i16::MAX);
        events.extend(demod.process_sample(normalized));
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demod::{DemodConfig, Demodulator};
    use crate::tone::{AfskModulator, NrziEncoder};
    use hound::{SampleFormat, WavSpec, WavWriter};
    use tempfile::NamedTempFile;

    #[test]
    fn decodes_a_synthesized_frame_from_a_wav_file() {
        let sample_rate = crate::config::DEFAULT_SAMPLE_RATE_HZ as u32;
        let payload = b"\x82\xA0\xA4\xA6\x40\x40\x60\x03\xF0wav".to_vec();
        let bits = crate::hdlc::encode_frame(&payload, 8, 4);

        let config = DemodConfig::afsk_1200(f64::from(sample_rate));
        let mut modulator = AfskModulator::new(f64::from(sample_rate), config.baud, config.mark_hz, config.space_hz);
        let mut line = NrziEncoder::new();

        let file = NamedTempFile::new().unwrap();
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        {
            let mut writer = WavWriter::create(file.path(), spec).unwrap();
            for bit in bits {
                let line_bit = line.encode_bit(bit);
                let mut samples = Vec::new();
                modulator.modulate_bit(line_bit, &mut samples);
                for s in samples {
                    writer.write_sample((s * f32::from(i16::MAX)) as i16).unwrap();
                }
            }
            writer.finalize().unwrap();
        }

        let mut demod = Demodulator::new(&config);
        let events = decode_file(file.path(), &mut demod).unwrap();
        let decoded = events.into_iter().find_map(|e| e.result.ok());
        assert_eq!(decoded, Some(payload));
    }

    #[test]
    fn mismatched_sample_rate_is_rejected() {
        let file = NamedTempFile::new().unwrap();
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        {
            let mut writer = WavWriter::create(file.path(), spec).unwrap();
            writer.write_sample(0i16).unwrap();
            writer.finalize().unwrap();
        }
        let config = DemodConfig::afsk_1200(crate::config::DEFAULT_SAMPLE_RATE_HZ);
        let mut demod = Demodulator::new(&config);
        assert!(matches!(
            decode_file(file.path(), &mut demod),
            Err(WavError::SampleRateMismatch { .. })
        ));
    }
}
