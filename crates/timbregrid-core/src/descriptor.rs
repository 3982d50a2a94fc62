//! Grid descriptor (`options`) consumed by the playback device.
//!
//! One line: `1, <min_pitch> <step> <pitch_count> <n> <n> <instruments> <instruments> <name>;`

use crate::error::{Error, Result};
use crate::grid::GridGeometry;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DESCRIPTOR_FILE_NAME: &str = "options";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridDescriptor {
    pub min_pitch: u8,
    /// Semitones between consecutive pitches (0 for a single pitch).
    pub pitch_step: u8,
    pub pitches_per_instrument: usize,
    /// Interpolated samples per axis.
    pub interpolation_count: usize,
    /// Corner instruments per axis.
    pub instrument_count: usize,
    pub grid_name: String,
}

impl GridDescriptor {
    /// Build from the geometry the interpolator actually sampled with.
    ///
    /// The name must be non-empty and free of whitespace and `;` so the line
    /// parses back.
    pub fn from_geometry(geometry: &GridGeometry, pitches: &[u8], grid_name: &str) -> Result<Self> {
        if grid_name.is_empty() || grid_name.contains(|c: char| c.is_whitespace() || c == ';') {
            return Err(Error::InvalidSettings(format!(
                "grid name '{}' cannot be written to a descriptor",
                grid_name
            )));
        }
        let min_pitch = *pitches
            .first()
            .ok_or_else(|| Error::InvalidSettings("descriptor needs at least one pitch".into()))?;
        let pitch_step = match pitches {
            [first, second, ..] => second.saturating_sub(*first),
            _ => 0,
        };
        Ok(Self {
            min_pitch,
            pitch_step,
            pitches_per_instrument: pitches.len(),
            interpolation_count: geometry.sub_resolution,
            instrument_count: geometry.instrument_count,
            grid_name: grid_name.to_string(),
        })
    }

    /// Write `options` into `dir`.
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(DESCRIPTOR_FILE_NAME);
        std::fs::write(&path, self.to_string())?;
        tracing::info!("Wrote grid descriptor {}", path.display());
        Ok(path)
    }

    pub fn read(path: &Path) -> Result<Self> {
        std::fs::read_to_string(path)?
            .parse()
            .map_err(|reason: String| Error::artifact(path, reason))
    }
}

impl fmt::Display for GridDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "1, {} {} {} {} {} {} {} {};",
            self.min_pitch,
            self.pitch_step,
            self.pitches_per_instrument,
            self.interpolation_count,
            self.interpolation_count,
            self.instrument_count,
            self.instrument_count,
            self.grid_name
        )
    }
}

impl FromStr for GridDescriptor {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let body = s
            .trim()
            .strip_suffix(';')
            .ok_or("descriptor must end with ';'")?;
        let body = body
            .strip_prefix("1,")
            .ok_or("descriptor must start with '1,'")?;

        let fields: Vec<&str> = body.split_whitespace().collect();
        let [min_pitch, step, count, nx, ny, ix, iy, name] = fields.as_slice() else {
            return Err(format!("expected 8 fields after '1,', found {}", fields.len()));
        };
        if nx != ny || ix != iy {
            return Err("per-axis counts differ".into());
        }

        fn num<T: FromStr>(field: &str, what: &str) -> std::result::Result<T, String> {
            field
                .parse()
                .map_err(|_| format!("invalid {} '{}'", what, field))
        }

        Ok(Self {
            min_pitch: num(min_pitch, "min pitch")?,
            pitch_step: num(step, "pitch step")?,
            pitches_per_instrument: num(count, "pitch count")?,
            interpolation_count: num(nx, "interpolation count")?,
            instrument_count: num(ix, "instrument count")?,
            grid_name: name.to_string(),
        })
    }
}
