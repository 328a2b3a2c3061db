//! Terrain surface model: identified points, triangles and derived bounds.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::geometry::Point3;

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Surveyed point with a stable identifier.
///
/// Identity is the `id`; two points with equal coordinates but different ids
/// are distinct members of a surface.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub id: String,
}

impl Point3D {
    /// Creates a point with a freshly generated id.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self::with_id(x, y, z, new_id())
    }

    pub fn with_id(x: f64, y: f64, z: f64, id: impl Into<String>) -> Self {
        Self {
            x,
            y,
            z,
            id: id.into(),
        }
    }

    pub fn coords(&self) -> Point3 {
        Point3::new(self.x, self.y, self.z)
    }
}

impl fmt::Display for Point3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point3D({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

/// Triangle face of a TIN. Its vertices are members of the owning surface.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Triangle {
    pub p1: Point3D,
    pub p2: Point3D,
    pub p3: Point3D,
    pub id: String,
}

impl Triangle {
    pub fn new(p1: Point3D, p2: Point3D, p3: Point3D) -> Self {
        Self {
            p1,
            p2,
            p3,
            id: new_id(),
        }
    }

    pub fn points(&self) -> [&Point3D; 3] {
        [&self.p1, &self.p2, &self.p3]
    }

    /// Centroid of the three vertices.
    pub fn center(&self) -> Point3 {
        Point3::new(
            (self.p1.x + self.p2.x + self.p3.x) / 3.0,
            (self.p1.y + self.p2.y + self.p3.y) / 3.0,
            (self.p1.z + self.p2.z + self.p3.z) / 3.0,
        )
    }
}

/// How the surface was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum SurfaceType {
    #[default]
    Tin,
    Grid,
}

/// Axis-aligned extents of a point set.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl Bounds {
    fn from_point(p: Point3) -> Self {
        Self {
            min_x: p.x,
            min_y: p.y,
            max_x: p.x,
            max_y: p.y,
            min_z: p.z,
            max_z: p.z,
        }
    }

    fn include(&mut self, p: Point3) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
        self.min_z = self.min_z.min(p.z);
        self.max_z = self.max_z.max(p.z);
    }

    /// Smallest bounds covering both `self` and `other`.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
            min_z: self.min_z.min(other.min_z),
            max_z: self.max_z.max(other.max_z),
        }
    }
}

/// Anything exposing an unordered set of elevation points.
///
/// The engines only rely on this contract, so a grid sampler or an imported
/// point cloud can be measured without first becoming a [`Surface`].
pub trait ElevationPoints {
    /// Name used in log messages.
    fn label(&self) -> &str;

    /// All points of the set; enumeration order carries no meaning.
    fn elevation_points(&self) -> Box<dyn Iterator<Item = Point3> + '_>;

    fn point_count(&self) -> usize {
        self.elevation_points().count()
    }

    fn is_empty(&self) -> bool {
        self.elevation_points().next().is_none()
    }

    /// All points ordered by `x`, then `y`, then `z`.
    ///
    /// Stacked elevations at one location come out lowest first, so every
    /// engine picks the same representative whatever the storage order.
    fn sorted_points(&self) -> Vec<Point3> {
        let mut pts: Vec<Point3> = self.elevation_points().collect();
        pts.sort_by(|a, b| {
            a.x.total_cmp(&b.x)
                .then(a.y.total_cmp(&b.y))
                .then(a.z.total_cmp(&b.z))
        });
        pts
    }

    /// Derived extents, `None` when the set is empty.
    fn bounds(&self) -> Option<Bounds> {
        let mut iter = self.elevation_points();
        let first = iter.next()?;
        let mut bounds = Bounds::from_point(first);
        for p in iter {
            bounds.include(p);
        }
        Some(bounds)
    }

    fn z_range(&self) -> Option<(f64, f64)> {
        self.bounds().map(|b| (b.min_z, b.max_z))
    }
}

/// Terrain model made of id-keyed points and triangles.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Surface {
    pub id: String,
    pub name: String,
    pub surface_type: SurfaceType,
    pub points: HashMap<String, Point3D>,
    pub triangles: HashMap<String, Triangle>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Surface {
    /// Creates an empty surface.
    pub fn new(name: impl Into<String>, surface_type: SurfaceType) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            surface_type,
            points: HashMap::new(),
            triangles: HashMap::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn add_point(&mut self, point: Point3D) {
        self.points.insert(point.id.clone(), point);
    }

    /// Adds a triangle, inserting any vertex the surface does not hold yet.
    pub fn add_triangle(&mut self, triangle: Triangle) {
        for p in triangle.points() {
            if !self.points.contains_key(&p.id) {
                self.points.insert(p.id.clone(), p.clone());
            }
        }
        self.triangles.insert(triangle.id.clone(), triangle);
    }

    /// Planar extents `(min_x, min_y, max_x, max_y)`.
    pub fn get_bounds(&self) -> Option<(f64, f64, f64, f64)> {
        self.bounds().map(|b| (b.min_x, b.min_y, b.max_x, b.max_y))
    }

    /// Elevation extents `(min_z, max_z)`.
    pub fn get_elevation_range(&self) -> Option<(f64, f64)> {
        self.z_range()
    }

    pub fn min_z(&self) -> Option<f64> {
        self.z_range().map(|r| r.0)
    }

    pub fn max_z(&self) -> Option<f64> {
        self.z_range().map(|r| r.1)
    }
}

impl ElevationPoints for Surface {
    fn label(&self) -> &str {
        &self.name
    }

    fn elevation_points(&self) -> Box<dyn Iterator<Item = Point3> + '_> {
        Box::new(self.points.values().map(Point3D::coords))
    }

    fn point_count(&self) -> usize {
        self.points.len()
    }

    fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Surface({}, {} points, {} triangles)",
            self.name,
            self.points.len(),
            self.triangles.len()
        )
    }
}
