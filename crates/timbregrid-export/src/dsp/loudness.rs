//! Level normalization for mono renders.

#[cfg(feature = "loudness")]
use crate::error::Result;
#[cfg(feature = "loudness")]
use ebur128::{EbuR128, Mode};

/// Sample peak in dBFS, or `None` for silence.
pub fn sample_peak_db(samples: &[f32]) -> Option<f64> {
    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    (peak > 0.0).then(|| 20.0 * (peak as f64).log10())
}

/// Scale so the sample peak sits at `target_db`. Silence is left untouched.
pub fn normalize_peak(samples: &mut [f32], target_db: f64) {
    let Some(current_peak) = sample_peak_db(samples) else {
        return;
    };
    let gain = 10.0_f64.powf((target_db - current_peak) / 20.0) as f32;

    for sample in samples.iter_mut() {
        *sample *= gain;
    }
}

/// Integrated loudness (LUFS) and true peak (dBTP) of a mono signal.
#[cfg(feature = "loudness")]
pub fn measure_loudness(samples: &[f32], sample_rate: u32) -> Result<(f64, f64)> {
    let mut meter = EbuR128::new(1, sample_rate, Mode::I | Mode::TRUE_PEAK)?;
    if !samples.is_empty() {
        meter.add_frames_f32(samples)?;
    }

    let integrated_lufs = meter.loudness_global()?;
    let true_peak_linear = meter.true_peak(0)?;
    let true_peak_dbtp = if true_peak_linear > 0.0 {
        20.0 * true_peak_linear.log10()
    } else {
        -144.0
    };
    Ok((integrated_lufs, true_peak_dbtp))
}

/// Apply loudness normalization (EBU R128), limited by a true peak ceiling.
///
/// Signals too quiet to gate (silence, very short renders) are left untouched.
#[cfg(feature = "loudness")]
pub fn normalize_loudness(
    samples: &mut [f32],
    sample_rate: u32,
    target_lufs: f64,
    true_peak_limit: f64,
) -> Result<()> {
    let (current_lufs, current_peak) = measure_loudness(samples, sample_rate)?;
    if !current_lufs.is_finite() {
        log::debug!("Loudness not measurable, skipping normalization");
        return Ok(());
    }

    let mut gain_db = target_lufs - current_lufs;
    let new_peak = current_peak + gain_db;
    if new_peak > true_peak_limit {
        gain_db -= new_peak - true_peak_limit;
    }

    let gain = 10.0_f64.powf(gain_db / 20.0) as f32;
    for sample in samples.iter_mut() {
        *sample *= gain;
    }
    Ok(())
}
