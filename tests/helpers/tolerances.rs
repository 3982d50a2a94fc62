//! Tolerance constants for pipeline tests.

/// Interpolated embeddings are blended in f64 and stored as f32.
pub const EMBEDDING_EPSILON: f32 = 1e-5;

/// 16-bit quantization step size.
/// Cleaned audio passes through a 16-bit intermediate.
pub const INT16_EPSILON: f32 = 1.0 / 32768.0;

/// Peak level after normalization and 16-bit quantization, in dB.
pub const LEVEL_DB_EPSILON: f64 = 0.01;
