//! Basic planar geometry shared by the surface and volume modules.

/// Distance below which a point is treated as lying on a polygon edge.
const BOUNDARY_TOLERANCE: f64 = 1e-9;

/// Representation of a 2D point.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Representation of a 3D coordinate without identity.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Calculates the Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
}

/// Calculates the area of a simple polygon using the shoelace formula.
pub fn polygon_area(vertices: &[Point]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..vertices.len() {
        let j = (i + 1) % vertices.len();
        sum += vertices[i].x * vertices[j].y - vertices[j].x * vertices[i].y;
    }
    sum.abs() * 0.5
}

fn orientation(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Shortest distance from `p` to the segment `a`-`b`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let (_, closest) = closest_on_segment(p, a, b);
    distance(p, closest)
}

/// Returns the segment parameter in `[0, 1]` and the closest point to `p`.
fn closest_on_segment(p: Point, a: Point, b: Point) -> (f64, Point) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len2 = dx * dx + dy * dy;
    if len2 <= f64::EPSILON {
        return (0.0, a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    (t, Point::new(a.x + t * dx, a.y + t * dy))
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Returns `true` when the closed segments `p1`-`p2` and `q1`-`q2` touch or cross.
pub fn segments_intersect(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}

/// Returns `true` if `p` lies on one of the edges of the closed ring `poly`.
pub fn point_on_boundary(p: Point, poly: &[Point]) -> bool {
    if poly.is_empty() {
        return false;
    }
    let mut j = poly.len() - 1;
    for i in 0..poly.len() {
        if distance_to_segment(p, poly[j], poly[i]) <= BOUNDARY_TOLERANCE {
            return true;
        }
        j = i;
    }
    false
}

/// Returns `true` if point `p` is strictly inside the polygon defined by
/// `poly` using the ray casting algorithm. Boundary points are outside.
pub fn point_in_polygon(p: Point, poly: &[Point]) -> bool {
    if poly.len() < 3 || point_on_boundary(p, poly) {
        return false;
    }
    let mut inside = false;
    let mut j = poly.len() - 1;
    for i in 0..poly.len() {
        let pi = poly[i];
        let pj = poly[j];
        if ((pi.y > p.y) != (pj.y > p.y))
            && (p.x < (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Checks that a ring is usable as an area: at least three finite vertices,
/// non-zero area and no edge crossing a non-adjacent edge.
pub fn polygon_is_simple(poly: &[Point]) -> bool {
    let n = poly.len();
    if n < 3 || poly.iter().any(|p| !p.is_finite()) {
        return false;
    }
    if polygon_area(poly) <= f64::EPSILON {
        return false;
    }
    for i in 0..n {
        let a1 = poly[i];
        let a2 = poly[(i + 1) % n];
        for j in (i + 1)..n {
            // adjacent edges share a vertex by construction
            if j == i + 1 || (i == 0 && j == n - 1) {
                continue;
            }
            let b1 = poly[j];
            let b2 = poly[(j + 1) % n];
            if segments_intersect(a1, a2, b1, b2) {
                return false;
            }
        }
    }
    true
}

/// Representation of a series of connected line segments.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Polyline {
    pub vertices: Vec<Point>,
}

impl Polyline {
    /// Creates a new polyline from a list of vertices.
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    /// Returns the total length of all segments in the polyline.
    pub fn length(&self) -> f64 {
        self.vertices
            .windows(2)
            .map(|pair| distance(pair[0], pair[1]))
            .sum()
    }

    /// Distance along the polyline to the point nearest `p`. When several
    /// segments are equally close the earliest one wins.
    pub fn project(&self, p: Point) -> f64 {
        let mut best_dist = f64::INFINITY;
        let mut best_station = 0.0;
        let mut travelled = 0.0;
        for pair in self.vertices.windows(2) {
            let len = distance(pair[0], pair[1]);
            let (t, closest) = closest_on_segment(p, pair[0], pair[1]);
            let d = distance(p, closest);
            if d < best_dist {
                best_dist = d;
                best_station = travelled + t * len;
            }
            travelled += len;
        }
        best_station
    }
}

impl From<geo_types::LineString<f64>> for Polyline {
    fn from(line: geo_types::LineString<f64>) -> Self {
        Self::new(line.coords().map(|c| Point::new(c.x, c.y)).collect())
    }
}

/// Exterior ring of a `geo_types` polygon without the repeated closing vertex.
pub fn ring_from_polygon(polygon: &geo_types::Polygon<f64>) -> Vec<Point> {
    let mut ring: Vec<Point> = polygon
        .exterior()
        .coords()
        .map(|c| Point::new(c.x, c.y))
        .collect();
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}
