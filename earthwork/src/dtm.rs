//! TIN construction from elevation-tagged linework.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};

use crate::error::{EarthworkError, Result};
use crate::interpolate::LinearInterpolator;
use crate::project::PolylineData;
use crate::surface::{Point3D, Surface, SurfaceType, Triangle};

/// Hash key for exact coordinate equality; `-0.0` and `0.0` share a key.
pub(crate) fn coord_key(v: f64) -> u64 {
    (v + 0.0).to_bits()
}

/// Builds triangulated surfaces from traced geometry.
pub struct SurfaceBuilder;

impl SurfaceBuilder {
    /// Builds a TIN from the polylines of one layer.
    ///
    /// Only vertices of polylines carrying an elevation are used, deduplicated
    /// by exact `(x, y, z)`. The triangulation runs on unique planar locations;
    /// where several elevations share one location the lowest becomes the
    /// triangle vertex while every point stays in the surface. The other
    /// engines resolve stacked locations the same way.
    pub fn build_from_polylines(layer_name: &str, polylines: &[PolylineData]) -> Result<Surface> {
        info!(
            "Building surface from layer '{layer_name}' ({} polylines)",
            polylines.len()
        );
        let mut pts_3d: Vec<(f64, f64, f64)> = Vec::new();
        let mut seen: HashSet<(u64, u64, u64)> = HashSet::new();
        for (i, poly) in polylines.iter().enumerate() {
            let Some(elevation) = poly.elevation else {
                continue;
            };
            if !elevation.is_finite() || poly.points.iter().any(|p| !p.is_finite()) {
                warn!("Skipping polyline {i} in layer '{layer_name}': non-finite coordinates");
                continue;
            }
            let mut added = 0;
            for p in &poly.points {
                let key = (coord_key(p.x), coord_key(p.y), coord_key(elevation));
                if seen.insert(key) {
                    pts_3d.push((p.x, p.y, elevation));
                    added += 1;
                }
            }
            if added > 0 {
                debug!("Added {added} unique vertices from polyline {i} (elev {elevation})");
            }
        }
        info!(
            "Extracted {} unique 3D points from layer '{layer_name}'",
            pts_3d.len()
        );
        if pts_3d.len() < 3 {
            return Err(EarthworkError::InsufficientData(format!(
                "layer '{layer_name}' needs at least 3 unique points with elevation, found {}",
                pts_3d.len()
            )));
        }

        // one representative per planar location, the lowest elevation
        let mut unique_xy: Vec<usize> = Vec::new();
        let mut slot_of: HashMap<(u64, u64), usize> = HashMap::new();
        for (i, &(x, y, z)) in pts_3d.iter().enumerate() {
            match slot_of.entry((coord_key(x), coord_key(y))) {
                Entry::Occupied(slot) => {
                    let rep = &mut unique_xy[*slot.get()];
                    if z < pts_3d[*rep].2 {
                        *rep = i;
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(unique_xy.len());
                    unique_xy.push(i);
                }
            }
        }
        if unique_xy.len() < 3 {
            return Err(EarthworkError::InsufficientData(format!(
                "layer '{layer_name}' needs at least 3 unique XY locations, found {}",
                unique_xy.len()
            )));
        }

        let coords: Vec<delaunator::Point> = unique_xy
            .iter()
            .map(|&i| delaunator::Point {
                x: pts_3d[i].0,
                y: pts_3d[i].1,
            })
            .collect();
        let triangulation = delaunator::triangulate(&coords);
        if triangulation.triangles.is_empty() {
            return Err(EarthworkError::Triangulation {
                layer: layer_name.to_string(),
                reason: format!(
                    "Delaunay triangulation of {} locations produced no faces; points are collinear or degenerate",
                    coords.len()
                ),
            });
        }
        let faces: Vec<[usize; 3]> = triangulation
            .triangles
            .chunks(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        debug!("Triangulation produced {} faces", faces.len());

        let mut surface = Surface::new(format!("{layer_name}_Surface"), SurfaceType::Tin);
        let mut by_index: HashMap<usize, Point3D> = HashMap::with_capacity(pts_3d.len());
        for (i, &(x, y, z)) in pts_3d.iter().enumerate() {
            let point = Point3D::new(x, y, z);
            surface.add_point(point.clone());
            by_index.insert(i, point);
        }

        let mut added = 0;
        let mut skipped = 0;
        for face in faces {
            let vertices = face.map(|k| unique_xy.get(k).and_then(|i| by_index.get(i)));
            match vertices {
                [Some(a), Some(b), Some(c)] => {
                    surface.add_triangle(Triangle::new(a.clone(), b.clone(), c.clone()));
                    added += 1;
                }
                _ => {
                    warn!("Skipping face with unmapped vertex index: {face:?}");
                    skipped += 1;
                }
            }
        }
        info!(
            "Built surface '{}' with {} points, {added} triangles ({skipped} faces skipped)",
            surface.name,
            surface.points.len()
        );
        Ok(surface)
    }
}

/// Square surface of `size` feet centred on the origin at constant `z`,
/// made of four corners and two triangles.
pub fn flat_surface(name: &str, z: f64, size: f64) -> Surface {
    let half = size / 2.0;
    let bl = Point3D::new(-half, -half, z);
    let br = Point3D::new(half, -half, z);
    let tr = Point3D::new(half, half, z);
    let tl = Point3D::new(-half, half, z);
    let mut surface = Surface::new(name, SurfaceType::Tin);
    surface.add_triangle(Triangle::new(bl.clone(), br.clone(), tl.clone()));
    surface.add_triangle(Triangle::new(br, tr, tl));
    surface
}

/// Composite of the lower of two surfaces at every design point.
///
/// The result keeps the design topology. Each design elevation is replaced by
/// the existing ground elevation interpolated at the same location when that
/// is lower; locations outside the existing surface keep the design value.
pub fn lowest_surface(design: &Surface, existing: &Surface) -> Surface {
    let ground = LinearInterpolator::new(existing);
    let mut lowest = Surface::new("Lowest", design.surface_type);
    let mut lowered: HashMap<&str, Point3D> = HashMap::with_capacity(design.points.len());
    for (id, p) in &design.points {
        let g = ground.value_at(p.x, p.y);
        let z = if g.is_nan() { p.z } else { p.z.min(g) };
        let point = Point3D::new(p.x, p.y, z);
        lowest.add_point(point.clone());
        lowered.insert(id.as_str(), point);
    }
    for tri in design.triangles.values() {
        let vertices = tri.points().map(|p| lowered.get(p.id.as_str()));
        if let [Some(a), Some(b), Some(c)] = vertices {
            lowest.add_triangle(Triangle::new(a.clone(), b.clone(), c.clone()));
        }
    }
    debug!(
        "Lowest surface built from '{}' and '{}': {} points",
        design.name,
        existing.name,
        lowest.points.len()
    );
    lowest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn line(points: &[(f64, f64)], elevation: Option<f64>) -> PolylineData {
        PolylineData::new(
            points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            elevation,
        )
    }

    #[test]
    fn contours_build_a_tin() {
        let polylines = vec![
            line(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)], Some(100.0)),
            line(&[(0.0, 10.0), (10.0, 12.0), (20.0, 10.0)], Some(102.0)),
            line(&[(50.0, 50.0), (60.0, 60.0)], None),
        ];
        let surface = SurfaceBuilder::build_from_polylines("contours", &polylines).unwrap();
        assert_eq!(surface.name, "contours_Surface");
        assert_eq!(surface.surface_type, SurfaceType::Tin);
        assert_eq!(surface.points.len(), 6);
        assert!(!surface.triangles.is_empty());
        for tri in surface.triangles.values() {
            for p in tri.points() {
                assert!(surface.points.contains_key(&p.id));
            }
        }
    }

    #[test]
    fn duplicate_vertices_are_merged() {
        let polylines = vec![
            line(&[(0.0, 0.0), (1.0, 0.0), (0.0, 0.0)], Some(5.0)),
            line(&[(0.0, 1.0), (1.0, 0.0)], Some(5.0)),
        ];
        let surface = SurfaceBuilder::build_from_polylines("dup", &polylines).unwrap();
        assert_eq!(surface.points.len(), 3);
        assert_eq!(surface.triangles.len(), 1);
    }

    #[test]
    fn stacked_elevations_keep_all_points() {
        let polylines = vec![
            line(&[(0.0, 0.0)], Some(3.0)),
            line(&[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)], Some(1.0)),
            line(&[(0.0, 0.0)], Some(2.0)),
        ];
        let surface = SurfaceBuilder::build_from_polylines("stack", &polylines).unwrap();
        assert_eq!(surface.points.len(), 5);
        assert_eq!(surface.triangles.len(), 1);
        let tri = surface.triangles.values().next().unwrap();
        // the lowest elevation at (0, 0) is the vertex
        let origin = tri.points().into_iter().find(|p| p.x == 0.0 && p.y == 0.0).unwrap();
        assert_eq!(origin.z, 1.0);
    }

    #[test]
    fn too_few_points() {
        let polylines = vec![line(&[(0.0, 0.0), (1.0, 1.0)], Some(1.0))];
        let err = SurfaceBuilder::build_from_polylines("few", &polylines).unwrap_err();
        assert!(matches!(err, EarthworkError::InsufficientData(_)));
    }

    #[test]
    fn too_few_planar_locations() {
        let polylines = vec![
            line(&[(0.0, 0.0), (1.0, 1.0)], Some(1.0)),
            line(&[(0.0, 0.0), (1.0, 1.0)], Some(2.0)),
        ];
        let err = SurfaceBuilder::build_from_polylines("stacked", &polylines).unwrap_err();
        assert!(matches!(err, EarthworkError::InsufficientData(_)));
    }

    #[test]
    fn collinear_points_fail_triangulation() {
        let polylines = vec![line(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)], Some(1.0))];
        let err = SurfaceBuilder::build_from_polylines("line", &polylines).unwrap_err();
        assert!(matches!(err, EarthworkError::Triangulation { .. }));
    }

    #[test]
    fn flat_surface_shape() {
        let s = flat_surface("flat", 2.0, 10.0);
        assert_eq!(s.points.len(), 4);
        assert_eq!(s.triangles.len(), 2);
        assert_eq!(s.get_bounds(), Some((-5.0, -5.0, 5.0, 5.0)));
        assert_eq!(s.get_elevation_range(), Some((2.0, 2.0)));
    }

    #[test]
    fn lowest_takes_minimum() {
        let design = flat_surface("Design", 5.0, 10.0);
        let existing = flat_surface("Existing", 8.0, 10.0);
        let low = lowest_surface(&design, &existing);
        assert_eq!(low.points.len(), design.points.len());
        assert_eq!(low.triangles.len(), design.triangles.len());
        assert!(low.points.values().all(|p| (p.z - 5.0).abs() < 1e-6));

        let deep = flat_surface("Deep", 1.0, 10.0);
        let low = lowest_surface(&design, &deep);
        assert!(low.points.values().all(|p| (p.z - 1.0).abs() < 1e-6));
    }
}
