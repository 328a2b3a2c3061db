//! Piecewise-linear interpolation over a scattered point cloud.

use log::{debug, warn};
use rstar::{RTree, RTreeObject, AABB};

use crate::geometry::{Point, Point3};
use crate::surface::ElevationPoints;

/// Barycentric slack so points on shared edges and on the hull still hit.
const EDGE_TOLERANCE: f64 = 1e-9;

fn barycentric(p: Point, a: Point3, b: Point3, c: Point3) -> Option<(f64, f64, f64)> {
    let det = (b.y - c.y) * (a.x - c.x) + (c.x - b.x) * (a.y - c.y);
    // relative to the triangle's extent so small valid triangles survive
    let scale =
        ((b.x - c.x).abs() + (a.x - c.x).abs()) * ((b.y - c.y).abs() + (a.y - c.y).abs());
    if det.abs() <= f64::EPSILON * scale {
        return None;
    }
    let u = ((b.y - c.y) * (p.x - c.x) + (c.x - b.x) * (p.y - c.y)) / det;
    let v = ((c.y - a.y) * (p.x - c.x) + (a.x - c.x) * (p.y - c.y)) / det;
    let w = 1.0 - u - v;
    Some((u, v, w))
}

#[derive(Debug, Clone)]
struct TriangleEntry {
    index: usize,
    min: [f64; 2],
    max: [f64; 2],
}

impl RTreeObject for TriangleEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

/// Linear interpolator over the Delaunay triangulation of a point set.
///
/// Queries outside the convex hull, or against a set that could not be
/// triangulated (fewer than three points, collinear input), return `NaN`.
/// Building it is the expensive part; reuse one instance for repeated queries
/// against the same surface.
#[derive(Debug)]
pub struct LinearInterpolator {
    vertices: Vec<Point3>,
    triangles: Vec<[usize; 3]>,
    tree: RTree<TriangleEntry>,
}

impl LinearInterpolator {
    pub fn new<S: ElevationPoints + ?Sized>(surface: &S) -> Self {
        let mut vertices = surface.sorted_points();
        // lowest elevation stands for a stacked location
        vertices.dedup_by(|next, kept| next.x == kept.x && next.y == kept.y);
        if vertices.len() < 3 {
            warn!(
                "Interpolation skipped for '{}': has only {} distinct locations, linear interpolation requires at least 3",
                surface.label(),
                vertices.len()
            );
            return Self::empty(vertices);
        }

        let coords: Vec<delaunator::Point> = vertices
            .iter()
            .map(|p| delaunator::Point { x: p.x, y: p.y })
            .collect();
        let triangulation = delaunator::triangulate(&coords);
        let triangles: Vec<[usize; 3]> = triangulation
            .triangles
            .chunks(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        if triangles.is_empty() {
            warn!(
                "Interpolation skipped for '{}': {} points do not span an area",
                surface.label(),
                vertices.len()
            );
            return Self::empty(vertices);
        }

        let entries = triangles
            .iter()
            .enumerate()
            .map(|(index, tri)| {
                let [a, b, c] = tri.map(|i| vertices[i]);
                TriangleEntry {
                    index,
                    min: [a.x.min(b.x).min(c.x), a.y.min(b.y).min(c.y)],
                    max: [a.x.max(b.x).max(c.x), a.y.max(b.y).max(c.y)],
                }
            })
            .collect();
        debug!(
            "Interpolator for '{}' built with {} triangles",
            surface.label(),
            triangles.len()
        );
        Self {
            vertices,
            triangles,
            tree: RTree::bulk_load(entries),
        }
    }

    fn empty(vertices: Vec<Point3>) -> Self {
        Self {
            vertices,
            triangles: Vec::new(),
            tree: RTree::new(),
        }
    }

    /// `true` when no query can succeed.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Interpolated elevation at `(x, y)`, `NaN` outside the hull.
    pub fn value_at(&self, x: f64, y: f64) -> f64 {
        if self.is_empty() || !x.is_finite() || !y.is_finite() {
            return f64::NAN;
        }
        let p = Point::new(x, y);
        // grid nodes can land a rounding error outside the hull
        let pad = EDGE_TOLERANCE * x.abs().max(y.abs()).max(1.0);
        let query = AABB::from_corners([x - pad, y - pad], [x + pad, y + pad]);
        let mut hits: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&query)
            .map(|e| e.index)
            .collect();
        hits.sort_unstable();
        for index in hits {
            let [a, b, c] = self.triangles[index].map(|i| self.vertices[i]);
            if let Some((u, v, w)) = barycentric(p, a, b, c) {
                if u >= -EDGE_TOLERANCE && v >= -EDGE_TOLERANCE && w >= -EDGE_TOLERANCE {
                    return u * a.z + v * b.z + w * c.z;
                }
            }
        }
        f64::NAN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{Point3D, Surface, SurfaceType};

    fn surface(points: &[(f64, f64, f64)]) -> Surface {
        let mut s = Surface::new("test", SurfaceType::Tin);
        for &(x, y, z) in points {
            s.add_point(Point3D::new(x, y, z));
        }
        s
    }

    #[test]
    fn plane_is_reproduced_exactly() {
        // z = 2x + 3y + 1
        let s = surface(&[
            (0.0, 0.0, 1.0),
            (10.0, 0.0, 21.0),
            (10.0, 10.0, 51.0),
            (0.0, 10.0, 31.0),
            (4.0, 6.0, 27.0),
        ]);
        let interp = LinearInterpolator::new(&s);
        assert!(!interp.is_empty());
        assert!((interp.value_at(2.5, 7.5) - 28.5).abs() < 1e-9);
        // hull corner and hull edge
        assert!((interp.value_at(0.0, 0.0) - 1.0).abs() < 1e-9);
        assert!((interp.value_at(5.0, 0.0) - 11.0).abs() < 1e-9);
    }

    #[test]
    fn outside_hull_is_nan() {
        let s = surface(&[(0.0, 0.0, 1.0), (1.0, 0.0, 1.0), (0.0, 1.0, 1.0)]);
        let interp = LinearInterpolator::new(&s);
        assert!(interp.value_at(1.0, 1.0).is_nan());
        assert!(interp.value_at(0.25, 0.25).is_finite());
    }

    #[test]
    fn too_few_or_collinear_points_give_nan() {
        let two = surface(&[(0.0, 0.0, 1.0), (1.0, 0.0, 1.0)]);
        assert!(LinearInterpolator::new(&two).value_at(0.5, 0.0).is_nan());
        let line = surface(&[(0.0, 0.0, 1.0), (1.0, 0.0, 1.0), (2.0, 0.0, 1.0)]);
        let interp = LinearInterpolator::new(&line);
        assert!(interp.is_empty());
        assert!(interp.value_at(1.0, 0.0).is_nan());
    }

    #[test]
    fn stacked_location_uses_lowest_elevation() {
        let s = surface(&[
            (0.0, 0.0, 9.0),
            (0.0, 0.0, 1.0),
            (10.0, 0.0, 1.0),
            (10.0, 10.0, 1.0),
            (0.0, 10.0, 1.0),
        ]);
        for _ in 0..10 {
            let interp = LinearInterpolator::new(&s);
            assert!((interp.value_at(1.0, 1.0) - 1.0).abs() < 1e-9);
            assert!((interp.value_at(0.0, 0.0) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn rounding_past_the_hull_still_hits() {
        let s = surface(&[
            (-16.65, -16.65, 2.0),
            (16.65, -16.65, 2.0),
            (16.65, 16.65, 2.0),
            (-16.65, 16.65, 2.0),
        ]);
        let interp = LinearInterpolator::new(&s);
        assert!((interp.value_at(16.65 + 1e-14, 3.0) - 2.0).abs() < 1e-9);
        assert!((interp.value_at(0.0, -16.65 - 1e-14) - 2.0).abs() < 1e-9);
        assert!(interp.value_at(16.65 + 1e-3, 3.0).is_nan());
    }

    #[test]
    fn tiny_triangle_is_not_degenerate() {
        let a = Point3::new(0.0, 0.0, 1.0);
        let b = Point3::new(1e-8, 0.0, 2.0);
        let c = Point3::new(0.0, 1e-8, 3.0);
        let (u, v, w) = barycentric(Point::new(2.5e-9, 2.5e-9), a, b, c).unwrap();
        assert!((u - 0.5).abs() < 1e-9);
        assert!((v - 0.25).abs() < 1e-9);
        assert!((w - 0.25).abs() < 1e-9);
        let flat = Point3::new(2e-8, 0.0, 0.0);
        assert!(barycentric(Point::new(0.0, 0.0), a, b, flat).is_none());
    }
}
