//! Grid-method cut/fill volumes between two surfaces.

use log::{debug, info, warn};

use crate::error::{EarthworkError, Result};
use crate::geometry::{polygon_area, Point};
use crate::interpolate::LinearInterpolator;
use crate::project::Project;
use crate::region::RegionIndex;
use crate::settings;
use crate::surface::{ElevationPoints, Surface};

/// Row-major 2D array; rows follow `grid_y`, columns follow `grid_x`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Grid {
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<f32>,
}

impl Grid {
    pub fn empty() -> Self {
        Self {
            rows: 0,
            cols: 0,
            values: Vec::new(),
        }
    }

    pub fn filled(rows: usize, cols: usize, value: f32) -> Self {
        Self {
            rows,
            cols,
            values: vec![value; rows * cols],
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row < self.rows && col < self.cols {
            self.values.get(row * self.cols + col).copied()
        } else {
            None
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
}

/// Output of [`VolumeCalculator::calculate_grid_method`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GridVolumeResult {
    pub cut: f64,
    pub fill: f64,
    /// `fill - cut`.
    pub net: f64,
    /// Elevation change (surface2 - stripped surface1), `NaN` where either
    /// surface has no value.
    pub dz_grid: Grid,
    pub grid_x: Vec<f32>,
    pub grid_y: Vec<f32>,
    /// Grid nodes where both surfaces had a value.
    pub valid_cells: usize,
}

impl GridVolumeResult {
    fn zero(dz_grid: Grid, grid_x: Vec<f32>, grid_y: Vec<f32>) -> Self {
        Self {
            cut: 0.0,
            fill: 0.0,
            net: 0.0,
            dz_grid,
            grid_x,
            grid_y,
            valid_cells: 0,
        }
    }
}

/// Cut/fill/net triple for plane comparisons.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CutFill {
    pub cut: f64,
    pub fill: f64,
    pub net: f64,
}

#[derive(Debug, Clone, Copy)]
struct BoundingBox {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl BoundingBox {
    fn include(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }
}

/// Node coordinates `min, min + r, ...` up to `max` inclusive (within a
/// millionth of a cell).
fn axis(min: f64, max: f64, resolution: f64) -> Vec<f64> {
    let epsilon = resolution * 1e-6;
    let span = (max + epsilon - min) / resolution;
    if !span.is_finite() || span <= 0.0 {
        return Vec::new();
    }
    let count = span.ceil() as usize;
    (0..count).map(|i| min + i as f64 * resolution).collect()
}

/// Volume calculator bound to a project's stripping regions.
#[derive(Debug, Clone, Copy)]
pub struct VolumeCalculator<'a> {
    project: Option<&'a Project>,
    strip_depth_default: Option<f64>,
}

impl<'a> VolumeCalculator<'a> {
    pub fn new(project: &'a Project) -> Self {
        Self {
            project: Some(project),
            strip_depth_default: None,
        }
    }

    /// Calculator without regions; every grid node uses the default depth.
    pub fn without_project() -> Self {
        Self {
            project: None,
            strip_depth_default: None,
        }
    }

    /// Uses `depth` instead of the process-wide settings value.
    pub fn with_strip_depth_default(mut self, depth: f64) -> Self {
        self.strip_depth_default = Some(depth);
        self
    }

    /// Cut, fill and the elevation-change grid between `surface1` (existing)
    /// and `surface2` (proposed).
    ///
    /// Both surfaces are sampled on a square grid covering their combined
    /// extents and every project region. Existing elevations are lowered by
    /// the stripping depth of the first region containing the node.
    pub fn calculate_grid_method<S1, S2>(
        &self,
        surface1: &S1,
        surface2: &S2,
        grid_resolution: f64,
    ) -> Result<GridVolumeResult>
    where
        S1: ElevationPoints + ?Sized,
        S2: ElevationPoints + ?Sized,
    {
        info!(
            "Grid volume between '{}' and '{}' at resolution {grid_resolution}",
            surface1.label(),
            surface2.label()
        );
        let bounds = match (surface1.bounds(), surface2.bounds()) {
            (Some(a), Some(b)) => a.union(&b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => {
                return Err(EarthworkError::Validation(
                    "both input surfaces are empty".into(),
                ))
            }
        };
        if grid_resolution.is_nan() || grid_resolution <= 0.0 {
            return Err(EarthworkError::Validation(format!(
                "grid resolution must be positive, got {grid_resolution}"
            )));
        }
        let default_depth = self
            .strip_depth_default
            .unwrap_or_else(|| settings::current().strip_depth_default());

        let mut bbox = BoundingBox {
            min_x: bounds.min_x,
            min_y: bounds.min_y,
            max_x: bounds.max_x,
            max_y: bounds.max_y,
        };
        let regions = self.project.map(|p| p.regions.as_slice()).unwrap_or(&[]);
        for region in regions {
            for p in &region.polygon {
                bbox.include(*p);
            }
        }

        let gx = axis(bbox.min_x, bbox.max_x, grid_resolution);
        let gy = axis(bbox.min_y, bbox.max_y, grid_resolution);
        if gx.is_empty() || gy.is_empty() {
            warn!("Calculation grid is empty; returning zero volumes");
            return Ok(GridVolumeResult::zero(Grid::empty(), Vec::new(), Vec::new()));
        }
        let (rows, cols) = (gy.len(), gx.len());
        debug!("Grid created: {rows} rows, {cols} columns");
        let grid_x: Vec<f32> = gx.iter().map(|&v| v as f32).collect();
        let grid_y: Vec<f32> = gy.iter().map(|&v| v as f32).collect();

        let existing = LinearInterpolator::new(surface1);
        let proposed = LinearInterpolator::new(surface2);
        let index = RegionIndex::new(regions);

        let cell_area = grid_resolution * grid_resolution;
        let mut dz_grid = Grid::filled(rows, cols, f32::NAN);
        let mut cut = 0.0;
        let mut fill = 0.0;
        let mut valid = 0usize;
        for (r, &y) in gy.iter().enumerate() {
            for (c, &x) in gx.iter().enumerate() {
                let z1 = existing.value_at(x, y);
                if z1.is_nan() {
                    continue;
                }
                let z1 = z1 - index.depth_at(Point::new(x, y), default_depth);
                let z2 = proposed.value_at(x, y);
                if z1.is_nan() || z2.is_nan() {
                    continue;
                }
                let dz = z2 - z1;
                dz_grid.values[r * cols + c] = dz as f32;
                valid += 1;
                let volume = dz * cell_area;
                if volume > 0.0 {
                    fill += volume;
                } else if volume < 0.0 {
                    cut += -volume;
                }
            }
        }

        if valid == 0 {
            warn!("No overlapping grid points with valid elevations found");
            return Ok(GridVolumeResult::zero(dz_grid, grid_x, grid_y));
        }
        let net = fill - cut;
        info!(
            "Grid volume complete over {valid} nodes: cut={cut:.3}, fill={fill:.3}, net={net:.3}"
        );
        Ok(GridVolumeResult {
            cut,
            fill,
            net,
            dz_grid,
            grid_x,
            grid_y,
            valid_cells: valid,
        })
    }

    /// Volume between a surface's triangles and a horizontal plane.
    ///
    /// Material above the plane is cut, material below it is fill.
    pub fn calculate_surface_to_elevation(
        &self,
        surface: &Surface,
        elevation: f64,
    ) -> Result<CutFill> {
        if surface.triangles.is_empty() {
            return Err(EarthworkError::Validation(format!(
                "surface '{}' has no triangles",
                surface.name
            )));
        }
        info!("Volume between '{}' and elevation {elevation}", surface.name);
        let mut volume = 0.0;
        for tri in surface.triangles.values() {
            let [a, b, c] = tri.points();
            let area = polygon_area(&[
                Point::new(a.x, a.y),
                Point::new(b.x, b.y),
                Point::new(c.x, c.y),
            ]);
            let avg_z = (a.z + b.z + c.z) / 3.0;
            volume += area * (avg_z - elevation);
        }
        Ok(CutFill {
            cut: volume.max(0.0),
            fill: (-volume).max(0.0),
            net: volume,
        })
    }
}
