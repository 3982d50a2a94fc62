//! Dense interpolation of reference embeddings over the instrument grid.
//!
//! For every mesh point the four enclosing corner instruments are blended with
//! distance-derived weights, once per pitch. Results are streamed to a sink
//! (usually the interp directory) rather than kept in memory.

use crate::embedding::{Embedding, EmbeddingStore};
use crate::error::{Error, Result};
use crate::grid::{GridCoordinate, GridGeometry, InstrumentGrid, InterpolationWeights, MeshPoint};
use std::path::{Path, PathBuf};

/// Identity of one interpolated embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatedArtifact {
    pub grid_name: String,
    /// Linear mesh index.
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub pitch: u8,
}

impl InterpolatedArtifact {
    /// `<grid_name>_<index:06>_x<x:.2>_y<y:.2>_pitch<pitch>`
    pub fn stem(&self) -> String {
        format!(
            "{}_{:06}_x{:.2}_y{:.2}_pitch{}",
            self.grid_name, self.index, self.x, self.y, self.pitch
        )
    }

    pub fn file_name(&self) -> String {
        format!("{}.npy", self.stem())
    }
}

/// Blends corner embeddings across a grid for a fixed set of pitches.
pub struct GridInterpolator<'a> {
    grid: &'a InstrumentGrid,
    pitches: &'a [u8],
    grid_name: &'a str,
    geometry: GridGeometry,
}

impl<'a> GridInterpolator<'a> {
    /// `resolution` must be at least 2.
    pub fn new(
        grid: &'a InstrumentGrid,
        resolution: usize,
        pitches: &'a [u8],
        grid_name: &'a str,
    ) -> Result<Self> {
        if resolution < 2 {
            return Err(Error::InvalidSettings(format!(
                "resolution must be at least 2, got {}",
                resolution
            )));
        }
        Ok(Self {
            grid,
            pitches,
            grid_name,
            geometry: GridGeometry::new(grid, resolution),
        })
    }

    /// Geometry actually used for sampling. The grid descriptor is built from this.
    pub fn geometry(&self) -> GridGeometry {
        self.geometry
    }

    pub fn pitches(&self) -> &[u8] {
        self.pitches
    }

    /// Number of artifacts a full run produces.
    pub fn artifact_count(&self) -> usize {
        self.geometry.point_count() * self.pitches.len()
    }

    /// Interpolated embedding at an arbitrary coordinate.
    pub fn interpolate_at(
        &self,
        store: &EmbeddingStore,
        coord: GridCoordinate,
        pitch: u8,
    ) -> Result<Embedding> {
        let corners = self.grid.corners(coord)?;
        blend(store, &corners.instruments, &corners.weights, pitch)
    }

    /// Walk the whole mesh, handing each artifact and its embedding to `sink`.
    pub fn for_each<F>(&self, store: &EmbeddingStore, mut sink: F) -> Result<usize>
    where
        F: FnMut(InterpolatedArtifact, Embedding) -> Result<()>,
    {
        store.ensure_covers(self.grid, self.pitches)?;

        let mut produced = 0;
        for MeshPoint {
            index,
            lookup,
            reported,
        } in self.geometry.mesh()
        {
            let corners = self.grid.corners(lookup)?;
            for &pitch in self.pitches {
                let embedding = blend(store, &corners.instruments, &corners.weights, pitch)?;
                let artifact = InterpolatedArtifact {
                    grid_name: self.grid_name.to_string(),
                    index,
                    x: reported.x,
                    y: reported.y,
                    pitch,
                };
                sink(artifact, embedding)?;
                produced += 1;
            }
        }
        Ok(produced)
    }

    /// Write every interpolated embedding into `dir`, returning paths in mesh order.
    pub fn write_to(&self, store: &EmbeddingStore, dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(self.artifact_count());

        self.for_each(store, |artifact, embedding| {
            let path = dir.join(artifact.file_name());
            embedding.save(&path)?;
            written.push(path);
            Ok(())
        })?;

        tracing::info!(
            "Wrote {} interpolated embeddings ({} points x {} pitches) to {}",
            written.len(),
            self.geometry.point_count(),
            self.pitches.len(),
            dir.display()
        );
        Ok(written)
    }
}

/// Weighted sum of the four corner embeddings for one pitch.
///
/// Computed as `e0 + sum(w_i * (e_i - e0))` so identical corners reproduce
/// `e0` exactly.
fn blend(
    store: &EmbeddingStore,
    instruments: &[&str; 4],
    weights: &InterpolationWeights,
    pitch: u8,
) -> Result<Embedding> {
    let base = store.get(instruments[0], pitch)?;
    let mut others = Vec::with_capacity(3);
    for &instrument in &instruments[1..] {
        let embedding = store.get(instrument, pitch)?;
        if embedding.shape() != base.shape() {
            return Err(Error::ShapeMismatch {
                instrument: instrument.to_string(),
                pitch,
                expected: base.shape().to_vec(),
                actual: embedding.shape().to_vec(),
            });
        }
        others.push(embedding);
    }

    let values = base
        .values()
        .iter()
        .enumerate()
        .map(|(i, &b)| {
            let b = b as f64;
            let delta: f64 = others
                .iter()
                .zip(&weights.0[1..])
                .map(|(e, w)| w * (e.values()[i] as f64 - b))
                .sum();
            (b + delta) as f32
        })
        .collect();

    Embedding::with_shape(base.shape().to_vec(), values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingKey;
    use crate::grid::MESH_EPSILON;
    use approx::assert_relative_eq;

    fn grid_2x2() -> InstrumentGrid {
        InstrumentGrid::new(vec![
            vec!["A".into(), "B".into()],
            vec!["C".into(), "D".into()],
        ])
        .unwrap()
    }

    fn scalar_store() -> EmbeddingStore {
        [("A", 1.0), ("B", 2.0), ("C", 3.0), ("D", 4.0)]
            .into_iter()
            .map(|(id, v)| (EmbeddingKey::new(id, 60), Embedding::new(vec![v])))
            .collect()
    }

    #[test]
    fn test_centroid_is_average() {
        let grid = grid_2x2();
        let interp = GridInterpolator::new(&grid, 2, &[60], "demo").unwrap();
        let centroid = GridCoordinate::new(0.5 + MESH_EPSILON, 0.5 + MESH_EPSILON);
        let e = interp.interpolate_at(&scalar_store(), centroid, 60).unwrap();
        assert_relative_eq!(e.values()[0], 2.5, epsilon = 1e-5);
    }

    #[test]
    fn test_artifact_count_and_names() {
        let grid = grid_2x2();
        let pitches = [60, 64];
        let store: EmbeddingStore = ["A", "B", "C", "D"]
            .iter()
            .flat_map(|id| {
                pitches.map(|p| (EmbeddingKey::new(*id, p), Embedding::new(vec![p as f32; 3])))
            })
            .collect();

        let interp = GridInterpolator::new(&grid, 3, &pitches, "demo").unwrap();
        let mut names = Vec::new();
        let count = interp
            .for_each(&store, |artifact, embedding| {
                assert_eq!(embedding.len(), 3);
                names.push(artifact.file_name());
                Ok(())
            })
            .unwrap();

        // sub_resolution = 3, so 4 x 4 points per pitch.
        assert_eq!(count, 32);
        assert_eq!(count, interp.artifact_count());
        assert_eq!(names[0], "demo_000000_x0.00_y0.00_pitch60.npy");
        assert_eq!(names[1], "demo_000000_x0.00_y0.00_pitch64.npy");
        assert_eq!(names[31], "demo_000015_x1.00_y1.00_pitch64.npy");
    }

    #[test]
    fn test_identical_corners_are_reproduced_exactly() {
        let grid = grid_2x2();
        let shared = vec![0.1f32, -3.75, 1e-3, 42.0];
        let store: EmbeddingStore = ["A", "B", "C", "D"]
            .iter()
            .map(|id| (EmbeddingKey::new(*id, 48), Embedding::new(shared.clone())))
            .collect();

        let interp = GridInterpolator::new(&grid, 5, &[48], "same").unwrap();
        interp
            .for_each(&store, |_, embedding| {
                assert_eq!(embedding.values(), shared.as_slice());
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_missing_corner_fails_before_writing() {
        let grid = grid_2x2();
        let interp = GridInterpolator::new(&grid, 2, &[60, 62], "demo").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = interp.write_to(&scalar_store(), dir.path()).unwrap_err();
        assert!(matches!(err, Error::MissingEmbedding { pitch: 62, .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_shape_mismatch() {
        let grid = grid_2x2();
        let mut store = scalar_store();
        store.insert(EmbeddingKey::new("D", 60), Embedding::new(vec![1.0, 2.0]));
        let interp = GridInterpolator::new(&grid, 2, &[60], "demo").unwrap();
        assert!(matches!(
            interp.for_each(&store, |_, _| Ok(())),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_write_to_round_trips_values() {
        let grid = grid_2x2();
        let interp = GridInterpolator::new(&grid, 2, &[60], "demo").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let paths = interp.write_to(&scalar_store(), dir.path()).unwrap();
        assert_eq!(paths.len(), 9);

        // Mesh point 4 is the centroid.
        let centre = Embedding::load(&paths[4]).unwrap();
        assert_relative_eq!(centre.values()[0], 2.5, epsilon = 1e-5);
        let first = Embedding::load(&paths[0]).unwrap();
        assert_relative_eq!(first.values()[0], 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_rejects_low_resolution() {
        let grid = grid_2x2();
        assert!(GridInterpolator::new(&grid, 1, &[60], "demo").is_err());
    }
}
