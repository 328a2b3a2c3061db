//! Cut/fill volumes split into horizontal elevation bands.

use log::{debug, info, warn};

use crate::error::{EarthworkError, Result};
use crate::surface::ElevationPoints;

/// Cut and fill inside one band `[z_bottom, z_top)`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SliceResult {
    pub z_bottom: f64,
    pub z_top: f64,
    pub cut: f64,
    pub fill: f64,
}

/// Length of the column `[low, high]` that falls inside `[bottom, top]`.
fn overlap(low: f64, high: f64, bottom: f64, top: f64) -> f64 {
    (high.min(top) - low.max(bottom)).max(0.0)
}

/// Splits the elevation change from `surface_ref` to `surface_diff` into
/// bands of `slice_thickness_ft`, from the lowest to the highest elevation of
/// either surface.
///
/// Points are paired by their position after sorting both surfaces by
/// `(x, y, z)`, so both must enumerate the same locations (a shared grid).
/// Volumes are column heights summed over points: multiply by the
/// per-point area to obtain absolute volumes.
pub fn compute_slice_volumes<R, D>(
    surface_ref: &R,
    surface_diff: &D,
    slice_thickness_ft: f64,
) -> Result<Vec<SliceResult>>
where
    R: ElevationPoints + ?Sized,
    D: ElevationPoints + ?Sized,
{
    if slice_thickness_ft.is_nan() || slice_thickness_ft <= 0.0 {
        return Err(EarthworkError::Validation(format!(
            "slice thickness must be positive, got {slice_thickness_ft}"
        )));
    }
    let (z_min, z_max) = match (surface_ref.z_range(), surface_diff.z_range()) {
        (Some(a), Some(b)) => (a.0.min(b.0), a.1.max(b.1)),
        (Some(r), None) | (None, Some(r)) => r,
        (None, None) => {
            return Err(EarthworkError::Validation(
                "both input surfaces are empty".into(),
            ))
        }
    };

    let ref_pts = surface_ref.sorted_points();
    let diff_pts = surface_diff.sorted_points();
    if ref_pts.len() != diff_pts.len() {
        warn!(
            "Slice pairing '{}' ({} points) with '{}' ({} points); extra points are ignored",
            surface_ref.label(),
            ref_pts.len(),
            surface_diff.label(),
            diff_pts.len()
        );
    }

    let mut slices = Vec::new();
    let mut i = 0usize;
    loop {
        let z = z_min + i as f64 * slice_thickness_ft;
        if z >= z_max {
            break;
        }
        let z_top = z + slice_thickness_ft;
        let mut cut = 0.0;
        let mut fill = 0.0;
        for (pr, pd) in ref_pts.iter().zip(&diff_pts) {
            let dz = pd.z - pr.z;
            if dz > 0.0 {
                fill += overlap(pr.z, pd.z, z, z_top);
            } else if dz < 0.0 {
                cut += overlap(pd.z, pr.z, z, z_top);
            }
        }
        slices.push(SliceResult {
            z_bottom: z,
            z_top,
            cut,
            fill,
        });
        i += 1;
    }
    debug!("Slices span {z_min}..{z_max} in {} bands", slices.len());
    info!(
        "Slice volumes between '{}' and '{}': {} bands of {slice_thickness_ft} ft",
        surface_ref.label(),
        surface_diff.label(),
        slices.len()
    );
    Ok(slices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtm::flat_surface;

    #[test]
    fn overlap_clips_both_ends() {
        assert_eq!(overlap(0.0, 2.0, 0.0, 1.0), 1.0);
        assert_eq!(overlap(0.5, 3.0, 1.0, 2.0), 1.0);
        assert!((overlap(1.2, 1.7, 1.0, 2.0) - 0.5).abs() < 1e-12);
        assert_eq!(overlap(0.0, 0.5, 1.0, 2.0), 0.0);
        assert_eq!(overlap(2.5, 3.0, 1.0, 2.0), 0.0);
    }

    #[test]
    fn partial_top_band_is_included() {
        let r = flat_surface("r", 0.0, 10.0);
        let d = flat_surface("d", 2.5, 10.0);
        let slices = compute_slice_volumes(&r, &d, 1.0).unwrap();
        assert_eq!(slices.len(), 3);
        assert!((slices[2].z_bottom - 2.0).abs() < 1e-12);
        // four corners, half a foot each in the top band
        assert!((slices[2].fill - 2.0).abs() < 1e-9);
        assert!((slices[0].fill - 4.0).abs() < 1e-9);
    }

    #[test]
    fn cut_columns() {
        let r = flat_surface("r", 3.0, 10.0);
        let d = flat_surface("d", 1.0, 10.0);
        let slices = compute_slice_volumes(&r, &d, 1.0).unwrap();
        assert_eq!(slices.len(), 2);
        for s in &slices {
            assert_eq!(s.fill, 0.0);
            assert!((s.cut - 4.0).abs() < 1e-9);
        }
    }

    #[test]
    fn bad_thickness() {
        let r = flat_surface("r", 0.0, 10.0);
        assert!(compute_slice_volumes(&r, &r, 0.0).is_err());
        assert!(compute_slice_volumes(&r, &r, -0.5).is_err());
    }

    #[test]
    fn identical_flat_surfaces_have_no_bands() {
        let r = flat_surface("r", 4.0, 10.0);
        assert!(compute_slice_volumes(&r, &r, 1.0).unwrap().is_empty());
    }
}
