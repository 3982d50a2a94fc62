//! Audio file formats.

pub mod wav;

pub use wav::{read_wav_mono, write_wav_16bit, MonoAudio};
