//! Audio resampling using rubato

use crate::error::Result;
use rubato::{FftFixedIn, Resampler};

/// Resampling quality presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResampleQuality {
    Fast,
    #[default]
    Medium,
    High,
}

impl ResampleQuality {
    fn chunk_size(&self) -> usize {
        match self {
            ResampleQuality::Fast => 512,
            ResampleQuality::Medium => 1024,
            ResampleQuality::High => 2048,
        }
    }

    fn sub_chunks(&self) -> usize {
        match self {
            ResampleQuality::Fast => 1,
            ResampleQuality::Medium => 2,
            ResampleQuality::High => 4,
        }
    }
}

/// Convert a mono signal from `source_rate` to `target_rate`.
///
/// Output length is `ceil(len * target / source)`.
pub fn resample_mono(
    samples: &[f32],
    source_rate: u32,
    target_rate: u32,
    quality: ResampleQuality,
) -> Result<Vec<f32>> {
    if source_rate == target_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let chunk_size = quality.chunk_size();
    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        chunk_size,
        quality.sub_chunks(),
        1,
    )?;

    let expected =
        (samples.len() as f64 * target_rate as f64 / source_rate as f64).ceil() as usize;
    let mut output = Vec::with_capacity(expected + chunk_size);

    let mut pos = 0;
    while pos < samples.len() {
        let needed = resampler.input_frames_next();
        let available = (samples.len() - pos).min(needed);

        // Last chunk is zero padded.
        let mut chunk = vec![0.0f32; needed];
        chunk[..available].copy_from_slice(&samples[pos..pos + available]);

        let input = vec![chunk];
        let out = resampler.process(&input, None)?;
        output.extend_from_slice(&out[0]);
        pos += needed;
    }

    // Flush the filter delay so the tail is not lost.
    let delay = resampler.output_delay();
    while output.len() < expected + delay {
        let input = vec![vec![0.0f32; resampler.input_frames_next()]];
        let out = resampler.process(&input, None)?;
        if out[0].is_empty() {
            break;
        }
        output.extend_from_slice(&out[0]);
    }

    output.drain(..delay.min(output.len()));
    output.resize(expected, 0.0);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_no_resample_needed() {
        let audio = vec![1.0, 2.0, 3.0];
        assert_eq!(
            resample_mono(&audio, 16000, 16000, ResampleQuality::Fast).unwrap(),
            audio
        );
    }

    #[test]
    fn test_downsample_length() {
        let audio = sine(440.0, 48000, 4800);
        let out = resample_mono(&audio, 48000, 16000, ResampleQuality::Medium).unwrap();
        assert_eq!(out.len(), 1600);
    }

    #[test]
    fn test_upsample_preserves_level() {
        let audio = sine(440.0, 16000, 8000);
        let out = resample_mono(&audio, 16000, 44100, ResampleQuality::High).unwrap();
        assert_eq!(out.len(), 22050);

        // Skip the edges, where the filter ramps in and out.
        let middle = &out[out.len() / 4..out.len() * 3 / 4];
        let peak = middle.iter().fold(0.0f32, |a, s| a.max(s.abs()));
        assert!((peak - 0.5).abs() < 0.05, "peak {}", peak);
    }
}
