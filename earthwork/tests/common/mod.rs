#![allow(dead_code)]

use earthwork::geometry::Point3;
use earthwork::interpolate::LinearInterpolator;
use earthwork::ElevationPoints;

pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .is_test(true)
        .try_init();
}

/// Elevations sampled on a regular grid, as produced by a grid export.
pub struct GridSamples {
    pub name: String,
    pub points: Vec<Point3>,
}

impl GridSamples {
    /// Samples `f(x, y)` at every integer node of `[x0, x1] x [y0, y1]`.
    pub fn from_fn(
        name: &str,
        (x0, x1): (i32, i32),
        (y0, y1): (i32, i32),
        f: impl Fn(f64, f64) -> f64,
    ) -> Self {
        let mut points = Vec::new();
        for x in x0..=x1 {
            for y in y0..=y1 {
                let (x, y) = (f64::from(x), f64::from(y));
                points.push(Point3::new(x, y, f(x, y)));
            }
        }
        Self {
            name: name.to_string(),
            points,
        }
    }

    /// Samples an existing surface, dropping nodes outside its hull.
    pub fn resample<S: ElevationPoints>(
        name: &str,
        surface: &S,
        xs: (i32, i32),
        ys: (i32, i32),
    ) -> Self {
        let interp = LinearInterpolator::new(surface);
        let mut samples = Self::from_fn(name, xs, ys, |x, y| interp.value_at(x, y));
        samples.points.retain(|p| !p.z.is_nan());
        samples
    }
}

impl ElevationPoints for GridSamples {
    fn label(&self) -> &str {
        &self.name
    }

    fn elevation_points(&self) -> Box<dyn Iterator<Item = Point3> + '_> {
        Box::new(self.points.iter().copied())
    }
}
