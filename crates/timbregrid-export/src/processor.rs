//! Per-file cleanup of raw renders.
//!
//! Each render is decoded, resampled if needed, declicked and normalized, then
//! written as a 16-bit `cleaned_<name>.wav` intermediate that the transcoder
//! turns into `<name>.<ext>`. The intermediate is always removed. A file that
//! fails at any step is logged and skipped; the remaining files still run.

use crate::dsp::{declick, normalize_peak, resample_mono};
use crate::error::{ExportError, Result};
use crate::format::{read_wav_mono, write_wav_16bit};
use crate::options::{NormalizationMode, PostProcessOptions, INTERMEDIATE_PREFIX};
use crate::transcode::Transcoder;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A render that made it to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedFile {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Samples repaired by the declicker.
    pub clicks: usize,
}

/// A render that was skipped, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub source: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostProcessReport {
    pub cleaned: Vec<CleanedFile>,
    pub skipped: Vec<SkippedFile>,
}

impl PostProcessReport {
    pub fn total(&self) -> usize {
        self.cleaned.len() + self.skipped.len()
    }
}

pub struct AudioPostProcessor {
    options: PostProcessOptions,
    transcoder: Arc<dyn Transcoder>,
}

impl AudioPostProcessor {
    pub fn new(options: PostProcessOptions, transcoder: Arc<dyn Transcoder>) -> Self {
        Self {
            options,
            transcoder,
        }
    }

    pub fn options(&self) -> &PostProcessOptions {
        &self.options
    }

    /// Clean one waveform: resample to the target rate, declick, normalize.
    ///
    /// Returns the cleaned samples and the number of clicks repaired.
    pub fn process(&self, raw: &[f32], sample_rate: u32) -> Result<(Vec<f32>, usize)> {
        if raw.is_empty() {
            return Err(ExportError::InvalidData("empty waveform".into()));
        }
        if raw.iter().any(|s| !s.is_finite()) {
            return Err(ExportError::InvalidData("waveform contains NaN or infinity".into()));
        }

        let mut audio = resample_mono(
            raw,
            sample_rate,
            self.options.sample_rate,
            self.options.resample_quality,
        )?;
        let clicks = declick(&mut audio, self.options.declick_threshold);

        match self.options.normalization {
            NormalizationMode::None => {}
            NormalizationMode::Peak(target_db) => normalize_peak(&mut audio, target_db),
            #[cfg(feature = "loudness")]
            NormalizationMode::Loudness {
                target_lufs,
                true_peak_dbtp,
            } => crate::dsp::normalize_loudness(
                &mut audio,
                self.options.sample_rate,
                target_lufs,
                true_peak_dbtp,
            )?,
            #[cfg(not(feature = "loudness"))]
            NormalizationMode::Loudness { .. } => {
                return Err(ExportError::InvalidData(
                    "loudness normalization requires the `loudness` feature".into(),
                ))
            }
        }

        Ok((audio, clicks))
    }

    /// Output stem for a render: its file stem without the generator prefix.
    pub fn output_stem(&self, raw_path: &Path) -> Result<String> {
        let stem = raw_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                ExportError::InvalidData(format!("unusable file name {}", raw_path.display()))
            })?;
        let stem = stem.strip_prefix(&self.options.strip_prefix).unwrap_or(stem);
        if stem.is_empty() {
            return Err(ExportError::InvalidData(format!(
                "{} has nothing left after removing '{}'",
                raw_path.display(),
                self.options.strip_prefix
            )));
        }
        Ok(stem.to_string())
    }

    /// Clean a single render into `out_dir`.
    pub fn process_file(&self, raw_path: &Path, out_dir: &Path) -> Result<CleanedFile> {
        let stem = self.output_stem(raw_path)?;
        let decoded = read_wav_mono(raw_path)?;
        let (cleaned, clicks) = self.process(&decoded.samples, decoded.sample_rate)?;
        if clicks > 0 {
            log::debug!("{}: repaired {} click(s)", raw_path.display(), clicks);
        }

        let intermediate = out_dir.join(format!("{}{}.wav", INTERMEDIATE_PREFIX, stem));
        let output = out_dir.join(format!("{}.{}", stem, self.transcoder.extension()));

        let encoded = write_wav_16bit(&intermediate, &cleaned, self.options.sample_rate)
            .and_then(|()| self.transcoder.transcode(&intermediate, &output));
        let removed = remove_if_present(&intermediate);

        if let Err(e) = encoded {
            let _ = remove_if_present(&output);
            return Err(e);
        }
        removed?;

        Ok(CleanedFile {
            source: raw_path.to_path_buf(),
            output,
            clicks,
        })
    }

    /// Clean every `.wav` in `raw_dir`, in name order.
    ///
    /// Only listing `raw_dir` or creating `out_dir` can fail the whole pass.
    pub fn process_dir(&self, raw_dir: &Path, out_dir: &Path) -> Result<PostProcessReport> {
        std::fs::create_dir_all(out_dir)?;

        let mut renders: Vec<PathBuf> = std::fs::read_dir(raw_dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
            })
            .collect();
        renders.sort();

        log::info!(
            "Post-processing {} render(s) from {} into {}",
            renders.len(),
            raw_dir.display(),
            out_dir.display()
        );

        let mut report = PostProcessReport::default();
        for source in renders {
            match self.process_file(&source, out_dir) {
                Ok(cleaned) => report.cleaned.push(cleaned),
                Err(e) => {
                    log::warn!("Skipping {}: {}", source.display(), e);
                    report.skipped.push(SkippedFile {
                        source,
                        reason: e.to_string(),
                    });
                }
            }
        }

        log::info!(
            "Post-processing done: {} cleaned, {} skipped",
            report.cleaned.len(),
            report.skipped.len()
        );
        Ok(report)
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
