//! Project context handed to the engines by the application layer.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::region::Region;

/// Traced or imported polyline, optionally tagged with an elevation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolylineData {
    pub points: Vec<Point>,
    pub elevation: Option<f64>,
}

impl PolylineData {
    pub fn new(points: Vec<Point>, elevation: Option<f64>) -> Self {
        Self { points, elevation }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    /// Stripping regions in precedence order.
    pub regions: Vec<Region>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            regions: Vec::new(),
        }
    }

    pub fn with_regions(mut self, regions: Vec<Region>) -> Self {
        self.regions = regions;
        self
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new("Untitled")
    }
}
