//! Lossy encoding of the cleaned intermediate.

use crate::error::{ExportError, Result};
use std::path::Path;
use std::process::Stdio;
use timbregrid_core::ExternalToolInvocation;

/// Encodes a 16-bit WAV into the distribution format.
pub trait Transcoder: Send + Sync {
    /// Extension of the files produced, without the dot.
    fn extension(&self) -> &str;

    /// Encode `input` into `output`. `output` must exist afterwards.
    fn transcode(&self, input: &Path, output: &Path) -> Result<()>;
}

/// MP3 encoding through the `lame` command line encoder.
#[derive(Debug, Clone)]
pub struct LameTranscoder {
    program: String,
}

impl Default for LameTranscoder {
    fn default() -> Self {
        Self::new("lame")
    }
}

impl LameTranscoder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn invocation(&self, input: &Path, output: &Path) -> ExternalToolInvocation {
        ExternalToolInvocation::new(&self.program)
            .arg("--quiet")
            .arg(input)
            .arg(output)
    }
}

impl Transcoder for LameTranscoder {
    fn extension(&self) -> &str {
        "mp3"
    }

    fn transcode(&self, input: &Path, output: &Path) -> Result<()> {
        let invocation = self.invocation(input, output);
        log::debug!("Running: {}", invocation);

        let status = invocation
            .to_command()
            .stdin(Stdio::null())
            .status()
            .map_err(|e| ExportError::Transcode {
                path: input.to_path_buf(),
                reason: format!("could not run {}: {}", self.program, e),
            })?;

        if !status.success() {
            return Err(ExportError::Transcode {
                path: input.to_path_buf(),
                reason: format!("{} exited with {}", self.program, status),
            });
        }
        if !output.is_file() {
            return Err(ExportError::Transcode {
                path: input.to_path_buf(),
                reason: format!("{} did not produce {}", self.program, output.display()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lame_arguments() {
        let lame = LameTranscoder::default();
        let inv = lame.invocation(Path::new("/out/cleaned_a b.wav"), Path::new("/out/a b.mp3"));
        assert_eq!(inv.program(), Path::new("lame"));
        let args: Vec<&str> = inv.args().iter().filter_map(|a| a.to_str()).collect();
        assert_eq!(args, ["--quiet", "/out/cleaned_a b.wav", "/out/a b.mp3"]);
        assert_eq!(lame.extension(), "mp3");
    }

    #[test]
    fn test_missing_encoder_is_transcode_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        std::fs::write(&input, b"").unwrap();
        let err = LameTranscoder::new("/nonexistent/lame")
            .transcode(&input, &dir.path().join("out.mp3"))
            .unwrap_err();
        assert!(matches!(err, ExportError::Transcode { .. }));
    }
}
