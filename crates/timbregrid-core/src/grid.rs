//! Instrument lattice, sampling mesh and corner weighting.

use crate::error::{Error, Result};

/// Offset that keeps mesh points off exact lattice boundaries during corner lookup.
pub const MESH_EPSILON: f64 = 1e-10;

/// Square, corner-addressable lattice of instrument ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentGrid {
    cells: Vec<Vec<String>>,
}

impl InstrumentGrid {
    /// Rows must all have the same length as the row count, and the grid must be at least 2x2.
    pub fn new(cells: Vec<Vec<String>>) -> Result<Self> {
        let rows = cells.len();
        if rows < 2 {
            return Err(Error::InvalidSettings(format!(
                "instrument grid needs at least 2 rows, got {}",
                rows
            )));
        }
        if let Some((i, row)) = cells.iter().enumerate().find(|(_, r)| r.len() != rows) {
            return Err(Error::InvalidSettings(format!(
                "instrument grid must be square: row {} has {} entries, expected {}",
                i,
                row.len(),
                rows
            )));
        }
        if cells.iter().flatten().any(|id| id.is_empty()) {
            return Err(Error::InvalidSettings(
                "instrument ids must be non-empty".into(),
            ));
        }
        Ok(Self { cells })
    }

    /// Number of cells along one axis.
    pub fn grid_size(&self) -> usize {
        self.cells[0].len() - 1
    }

    /// Number of corner instruments along one axis.
    pub fn instrument_count(&self) -> usize {
        self.cells.len()
    }

    pub fn get(&self, u: usize, v: usize) -> Option<&str> {
        self.cells.get(u)?.get(v).map(String::as_str)
    }

    /// Distinct instrument ids, in first-seen order.
    pub fn instruments(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for id in self.cells.iter().flatten() {
            if !seen.contains(&id.as_str()) {
                seen.push(id.as_str());
            }
        }
        seen
    }

    /// The four instruments enclosing `coord`, in
    /// `[(u, v), (u, v+1), (u+1, v), (u+1, v+1)]` order, with their weights.
    ///
    /// Points on the far edge (`x == grid_size`) are assigned to the last cell.
    pub fn corners(&self, coord: GridCoordinate) -> Result<Corners<'_>> {
        let grid_size = self.grid_size();
        let (u, v) = cell_of(coord, grid_size)?;

        let lookup = |u: usize, v: usize| {
            self.get(u, v).ok_or(Error::CornerOutOfBounds {
                x: coord.x,
                y: coord.y,
                u,
                v,
                grid_size,
            })
        };

        let instruments = [
            lookup(u, v)?,
            lookup(u, v + 1)?,
            lookup(u + 1, v)?,
            lookup(u + 1, v + 1)?,
        ];

        Ok(Corners {
            instruments,
            weights: InterpolationWeights::at(coord, u, v),
        })
    }
}

/// Locate the enclosing cell, clamping the far edge into the last cell.
fn cell_of(coord: GridCoordinate, grid_size: usize) -> Result<(usize, usize)> {
    let limit = grid_size as f64 + MESH_EPSILON * 2.0;
    let out_of_bounds = |x: f64, y: f64| Error::CornerOutOfBounds {
        x,
        y,
        u: x.max(0.0).floor() as usize,
        v: y.max(0.0).floor() as usize,
        grid_size,
    };

    if !coord.x.is_finite()
        || !coord.y.is_finite()
        || coord.x < 0.0
        || coord.y < 0.0
        || coord.x > limit
        || coord.y > limit
    {
        return Err(out_of_bounds(coord.x, coord.y));
    }

    let last = grid_size.saturating_sub(1);
    let u = (coord.x.floor() as usize).min(last);
    let v = (coord.y.floor() as usize).min(last);
    Ok((u, v))
}

/// Continuous position in `[0, grid_size]²`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCoordinate {
    pub x: f64,
    pub y: f64,
}

impl GridCoordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Corner instruments and weights for one coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct Corners<'a> {
    pub instruments: [&'a str; 4],
    pub weights: InterpolationWeights,
}

/// Non-negative corner weights that sum to one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolationWeights(pub [f64; 4]);

impl InterpolationWeights {
    /// `max(1 - distance, 0)` to each corner of cell `(u, v)`, renormalized.
    pub fn at(coord: GridCoordinate, u: usize, v: usize) -> Self {
        let (u, v) = (u as f64, v as f64);
        let corners = [(u, v), (u, v + 1.0), (u + 1.0, v), (u + 1.0, v + 1.0)];

        let mut weights = corners.map(|(cx, cy)| {
            let distance = ((coord.x - cx).powi(2) + (coord.y - cy).powi(2)).sqrt();
            (1.0 - distance).max(0.0)
        });

        // Inside a unit cell the nearest corner is at most sqrt(2)/2 away, so the sum is positive.
        let sum: f64 = weights.iter().sum();
        if sum > 0.0 {
            for w in &mut weights {
                *w /= sum;
            }
        }
        Self(weights)
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }
}

/// Sampling geometry shared by interpolation and the grid descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    /// Cells along one axis.
    pub grid_size: usize,
    /// Samples per cell edge.
    pub resolution: usize,
    /// `(resolution - 1) * grid_size + 1`, the interpolation count per axis.
    pub sub_resolution: usize,
    /// Corner instruments along one axis.
    pub instrument_count: usize,
}

impl GridGeometry {
    pub fn new(grid: &InstrumentGrid, resolution: usize) -> Self {
        let grid_size = grid.grid_size();
        Self {
            grid_size,
            resolution,
            sub_resolution: (resolution - 1) * grid_size + 1,
            instrument_count: grid.instrument_count(),
        }
    }

    /// Mesh points along one axis.
    pub fn points_per_axis(&self) -> usize {
        self.sub_resolution + 1
    }

    pub fn point_count(&self) -> usize {
        self.points_per_axis() * self.points_per_axis()
    }

    /// Mesh coordinates in row-major order (`y` outer, `x` inner).
    ///
    /// Each axis runs over `[MESH_EPSILON, grid_size + MESH_EPSILON]` in
    /// `sub_resolution + 1` evenly spaced steps; the reported coordinate has the
    /// epsilon removed, so it spans `[0, grid_size]`.
    pub fn mesh(&self) -> impl Iterator<Item = MeshPoint> + '_ {
        let n = self.points_per_axis();
        let axis: Vec<f64> = linspace(MESH_EPSILON, self.grid_size as f64 + MESH_EPSILON, n);
        (0..n * n).map(move |index| {
            let (row, col) = (index / n, index % n);
            let lookup = GridCoordinate::new(axis[col], axis[row]);
            MeshPoint {
                index,
                lookup,
                reported: GridCoordinate::new(lookup.x - MESH_EPSILON, lookup.y - MESH_EPSILON),
            }
        })
    }
}

/// One mesh sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshPoint {
    /// Linear index in mesh order.
    pub index: usize,
    /// Coordinate used for corner lookup and weighting.
    pub lookup: GridCoordinate,
    /// Coordinate written into artifact names.
    pub reported: GridCoordinate,
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}
