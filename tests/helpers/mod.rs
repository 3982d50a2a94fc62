//! Test helpers and fixtures for timbregrid integration tests
//!
//! External tools are replaced by in-process fakes: [`FakeTools`] plays both
//! the embedding extractor and the generator, [`CopyTranscoder`] stands in for
//! the MP3 encoder by copying the 16-bit intermediate.

#![allow(dead_code)]

pub mod tolerances;

use hound::{SampleFormat, WavSpec, WavWriter};
use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use timbregrid::export::ExportError;
use timbregrid::generate::GenerationError;
use timbregrid::{
    Embedding, EmbeddingKey, ExternalToolInvocation, Settings, ToolRunner, ToolStatus, Transcoder,
};

/// Sample rate of fake renders.
pub const RENDER_SAMPLE_RATE: u32 = 16000;

/// Settings for a 2x2 grid rooted in a temp directory.
pub const DEMO_SETTINGS: &str = r#"
name = "demo"
instruments = [["flute", "guitar_acoustic"], ["organ", "bass"]]
pitches = [60, 62]
resolution = 2
final_length = 800
gpus = 2
batch_size_generate = 4
checkpoint_dir = "/models/wavenet"
"#;

pub fn demo_settings() -> Settings {
    Settings::from_toml_str(DEMO_SETTINGS).expect("demo settings are valid")
}

/// Write a canonical embedding file.
pub fn write_embedding(dir: &Path, instrument: &str, pitch: u8, values: Vec<f32>) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(EmbeddingKey::new(instrument, pitch).file_name());
    Embedding::new(values).save(&path).unwrap();
    path
}

/// Write a mono float WAV.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

/// Read every sample of a WAV file as f32 in `[-1, 1]`.
pub fn read_wav(path: &Path) -> (Vec<f32>, WavSpec) {
    let mut reader = hound::WavReader::open(path).unwrap();
    let spec = reader.spec();
    let samples = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().map(|s| s.unwrap()).collect(),
        SampleFormat::Int => reader
            .samples::<i16>()
            .map(|s| s.unwrap() as f32 / 32768.0)
            .collect(),
    };
    (samples, spec)
}

/// Generate a test signal: sine wave at given frequency for specified samples.
pub fn generate_sine(frequency: f32, amplitude: f32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / RENDER_SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
}

/// Sorted file names in `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Reference recordings in `audio_input/`, one per instrument and pitch.
pub fn write_reference_recordings(root: &Path, settings: &Settings) {
    let dir = root.join("audio_input");
    std::fs::create_dir_all(&dir).unwrap();
    for row in &settings.instruments {
        for instrument in row {
            for &pitch in &settings.pitches {
                let name = format!("{}.wav", EmbeddingKey::new(instrument.as_str(), pitch).stem());
                write_wav(&dir.join(name), &generate_sine(440.0, 0.5, 160), RENDER_SAMPLE_RATE);
            }
        }
    }
}

/// In-process stand-in for the extraction and generation tools.
///
/// Extraction writes the configured embeddings (optionally under truncated
/// names). Conversion writes a WAV tone at its output path. Generation
/// writes one `gen_<stem>.wav` per input artifact whose tone
/// amplitude follows the first embedding value, with a single-sample click.
#[derive(Default)]
pub struct FakeTools {
    /// Embeddings produced by the extraction tool.
    pub embeddings: BTreeMap<EmbeddingKey, Vec<f32>>,
    /// Embedding stems written under a shortened name: full stem -> written stem.
    pub truncate: BTreeMap<String, String>,
    /// Workers whose generation run reports this status instead of rendering.
    pub fail: BTreeMap<usize, ToolStatus>,
    /// Render sample rate, `RENDER_SAMPLE_RATE` when unset.
    pub render_rate: Option<u32>,
    /// Worker 0 also leaves an undecodable `gen_zz_corrupt.wav`.
    pub corrupt_render: bool,
    pub calls: Mutex<Vec<ExternalToolInvocation>>,
}

impl FakeTools {
    /// Extractor producing scalar-valued embeddings for a 2x2 demo grid.
    pub fn for_demo() -> Self {
        let mut tools = Self::default();
        let settings = demo_settings();
        let values = [1.0f32, 2.0, 3.0, 4.0];
        let instruments = settings.instruments.iter().flatten();
        for (instrument, value) in instruments.zip(values) {
            for &pitch in &settings.pitches {
                tools
                    .embeddings
                    .insert(EmbeddingKey::new(instrument.as_str(), pitch), vec![value, -value]);
            }
        }
        tools
    }

    pub fn calls(&self) -> Vec<ExternalToolInvocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Distinct programs invoked.
    pub fn programs(&self) -> BTreeSet<String> {
        self.calls()
            .iter()
            .map(|c| c.program().display().to_string())
            .collect()
    }

    fn extract(&self, save: &Path) -> Result<ToolStatus, GenerationError> {
        for (key, values) in &self.embeddings {
            let stem = self.truncate.get(&key.stem()).cloned().unwrap_or_else(|| key.stem());
            let path = save.join(format!("{}_embeddings.npy", stem));
            Embedding::new(values.clone()).save(&path)?;
        }
        Ok(ToolStatus::Success)
    }

    /// Writes a short tone at the output path, the last argument.
    fn convert(&self, invocation: &ExternalToolInvocation) -> Result<ToolStatus, GenerationError> {
        let output = invocation.args().last().expect("converter output path");
        write_wav(Path::new(output), &generate_sine(440.0, 0.5, 160), RENDER_SAMPLE_RATE);
        Ok(ToolStatus::Success)
    }

    fn generate(&self, invocation: &ExternalToolInvocation) -> Result<ToolStatus, GenerationError> {
        let worker: usize = flag(invocation, "gpu_number").parse().unwrap();
        if let Some(status) = self.fail.get(&worker) {
            return Ok(*status);
        }

        let source = PathBuf::from(flag(invocation, "source_path"));
        let save = PathBuf::from(flag(invocation, "save_path"));
        let length: usize = flag(invocation, "sample_length").parse().unwrap();
        let rate = self.render_rate.unwrap_or(RENDER_SAMPLE_RATE);

        for entry in std::fs::read_dir(source)? {
            let path = entry?.path();
            let embedding = Embedding::load(&path)?;
            let amplitude = 0.1 * embedding.values()[0].abs().max(0.5);
            let mut samples = generate_sine(220.0, amplitude, length);
            samples[length / 2] = 1.5;

            let stem = path.file_stem().unwrap().to_string_lossy();
            write_wav(&save.join(format!("gen_{}.wav", stem)), &samples, rate);
        }
        if self.corrupt_render && worker == 0 {
            std::fs::write(save.join("gen_zz_corrupt.wav"), b"RIFF but not really")?;
        }
        Ok(ToolStatus::Success)
    }
}

fn flag<'a>(invocation: &'a ExternalToolInvocation, name: &str) -> &'a str {
    invocation
        .flag_value(name)
        .and_then(OsStr::to_str)
        .unwrap_or_else(|| panic!("missing --{}", name))
}

impl ToolRunner for FakeTools {
    fn run(
        &self,
        invocation: &ExternalToolInvocation,
        _timeout: Option<Duration>,
    ) -> Result<ToolStatus, GenerationError> {
        self.calls.lock().unwrap().push(invocation.clone());
        match invocation.program().to_str() {
            Some("nsynth_save_embeddings") => self.extract(Path::new(flag(invocation, "save_path"))),
            Some("nsynth_generate") => self.generate(invocation),
            Some("sox") => self.convert(invocation),
            other => panic!("unexpected program {:?}", other),
        }
    }
}

/// Copies the intermediate to the output. Names containing `refuse` fail.
pub struct CopyTranscoder;

impl Transcoder for CopyTranscoder {
    fn extension(&self) -> &str {
        "mp3"
    }

    fn transcode(&self, input: &Path, output: &Path) -> Result<(), ExportError> {
        let name = input.file_name().unwrap_or_default().to_string_lossy();
        if name.contains("refuse") {
            return Err(ExportError::Transcode {
                path: input.to_path_buf(),
                reason: "encoder refused input".into(),
            });
        }
        std::fs::copy(input, output)?;
        Ok(())
    }
}
