//! Named stripping regions and the lookup used by the grid volume engine.

use log::warn;
use rstar::{RTree, RTreeObject, AABB};

use crate::error::{EarthworkError, Result};
use crate::geometry::{point_in_polygon, polygon_is_simple, ring_from_polygon, Point};

/// Named polygon with an optional stripping depth in feet.
///
/// A `None` depth means the global default applies inside the region.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub polygon: Vec<Point>,
    pub strip_depth_ft: Option<f64>,
}

impl Region {
    pub fn new(name: impl Into<String>, polygon: Vec<Point>, strip_depth_ft: Option<f64>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            polygon,
            strip_depth_ft,
        }
    }

    /// Builds a region from the exterior ring of a `geo_types` polygon.
    pub fn from_polygon(
        name: impl Into<String>,
        polygon: &geo_types::Polygon<f64>,
        strip_depth_ft: Option<f64>,
    ) -> Self {
        Self::new(name, ring_from_polygon(polygon), strip_depth_ft)
    }

    /// Checks that the polygon can be used for containment tests.
    pub fn validate(&self) -> Result<()> {
        if self.polygon.len() < 3 {
            return Err(EarthworkError::Geometry(format!(
                "region '{}' ({}) has {} vertices, at least 3 are required",
                self.name,
                self.id,
                self.polygon.len()
            )));
        }
        if !polygon_is_simple(&self.polygon) {
            return Err(EarthworkError::Geometry(format!(
                "region '{}' ({}) is not a simple polygon",
                self.name, self.id
            )));
        }
        Ok(())
    }

    fn envelope_corners(&self) -> ([f64; 2], [f64; 2]) {
        let mut min = [f64::INFINITY, f64::INFINITY];
        let mut max = [f64::NEG_INFINITY, f64::NEG_INFINITY];
        for p in &self.polygon {
            min[0] = min[0].min(p.x);
            min[1] = min[1].min(p.y);
            max[0] = max[0].max(p.x);
            max[1] = max[1].max(p.y);
        }
        (min, max)
    }
}

#[derive(Debug, Clone)]
struct RegionEntry {
    /// Position of the region in the caller's list.
    order: usize,
    min: [f64; 2],
    max: [f64; 2],
}

impl RTreeObject for RegionEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

/// Region lookup honouring list order: among all regions containing a point
/// the one listed first decides.
///
/// Malformed regions are dropped once at construction with a warning, which
/// gives the same answers as skipping them on every query.
#[derive(Debug)]
pub struct RegionIndex<'a> {
    regions: &'a [Region],
    tree: RTree<RegionEntry>,
    skipped: usize,
}

impl<'a> RegionIndex<'a> {
    pub fn new(regions: &'a [Region]) -> Self {
        let mut entries = Vec::with_capacity(regions.len());
        let mut skipped = 0;
        for (order, region) in regions.iter().enumerate() {
            if let Err(e) = region.validate() {
                warn!("Skipping region for stripping lookup: {e}");
                skipped += 1;
                continue;
            }
            let (min, max) = region.envelope_corners();
            entries.push(RegionEntry { order, min, max });
        }
        Self {
            regions,
            tree: RTree::bulk_load(entries),
            skipped,
        }
    }

    /// Number of regions excluded as malformed.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// First region, in list order, whose interior contains `p`.
    pub fn region_at(&self, p: Point) -> Option<&'a Region> {
        if !p.is_finite() {
            return None;
        }
        let mut candidates: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&AABB::from_point([p.x, p.y]))
            .map(|e| e.order)
            .collect();
        candidates.sort_unstable();
        candidates
            .into_iter()
            .map(|i| &self.regions[i])
            .find(|r| point_in_polygon(p, &r.polygon))
    }

    /// Stripping depth at `p`: the first containing region's depth, or
    /// `default_depth` when that region has none or no region contains `p`.
    pub fn depth_at(&self, p: Point, default_depth: f64) -> f64 {
        match self.region_at(p) {
            Some(region) => region.strip_depth_ft.unwrap_or(default_depth),
            None => default_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point> {
        vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ]
    }

    #[test]
    fn first_listed_region_wins() {
        let regions = vec![
            Region::new("A", rect(0.0, 0.0, 10.0, 10.0), Some(1.0)),
            Region::new("B", rect(5.0, 5.0, 20.0, 20.0), Some(3.0)),
        ];
        let index = RegionIndex::new(&regions);
        assert_eq!(index.depth_at(Point::new(7.0, 7.0), 0.5), 1.0);
        assert_eq!(index.depth_at(Point::new(15.0, 15.0), 0.5), 3.0);
        assert_eq!(index.depth_at(Point::new(30.0, 30.0), 0.5), 0.5);
    }

    #[test]
    fn region_without_depth_uses_default() {
        let regions = vec![
            Region::new("unset", rect(0.0, 0.0, 10.0, 10.0), None),
            Region::new("deep", rect(0.0, 0.0, 10.0, 10.0), Some(4.0)),
        ];
        let index = RegionIndex::new(&regions);
        assert_eq!(index.depth_at(Point::new(5.0, 5.0), 0.25), 0.25);
    }

    #[test]
    fn malformed_regions_are_skipped() {
        let regions = vec![
            Region::new("line", vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)], Some(9.0)),
            Region::new(
                "bow tie",
                vec![
                    Point::new(0.0, 0.0),
                    Point::new(10.0, 10.0),
                    Point::new(10.0, 0.0),
                    Point::new(0.0, 10.0),
                ],
                Some(8.0),
            ),
            Region::new("good", rect(0.0, 0.0, 10.0, 10.0), Some(2.0)),
        ];
        let index = RegionIndex::new(&regions);
        assert_eq!(index.skipped(), 2);
        assert_eq!(index.depth_at(Point::new(2.0, 5.0), 0.0), 2.0);
        assert!(matches!(regions[0].validate(), Err(EarthworkError::Geometry(_))));
    }

    #[test]
    fn from_geo_polygon() {
        let poly = geo_types::Polygon::new(
            vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)].into(),
            vec![],
        );
        let regions = vec![Region::from_polygon("geo", &poly, Some(0.5))];
        assert_eq!(regions[0].polygon.len(), 4);
        let index = RegionIndex::new(&regions);
        assert!(index.region_at(Point::new(2.0, 2.0)).is_some());
        // boundary points are outside
        assert!(index.region_at(Point::new(0.0, 2.0)).is_none());
    }
}
