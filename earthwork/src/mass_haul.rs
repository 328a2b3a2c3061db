//! Mass-haul curve and overhaul along a route alignment.

use std::collections::HashMap;
use std::ops::Deref;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::dtm::coord_key;
use crate::error::{EarthworkError, Result};
use crate::geometry::{Point, Polyline};
use crate::surface::ElevationPoints;

/// Earthwork totals binned at one station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HaulStation {
    /// Distance along the alignment where the bin starts.
    pub station: f64,
    pub cut: f64,
    pub fill: f64,
    /// Running `fill - cut` up to and including this station.
    pub cumulative: f64,
}

/// Ordered stations plus the overhaul of the whole curve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HaulStationList {
    pub stations: Vec<HaulStation>,
    /// Volume times distance moved beyond the free-haul allowance.
    pub overhaul: f64,
}

impl Deref for HaulStationList {
    type Target = [HaulStation];

    fn deref(&self) -> &Self::Target {
        &self.stations
    }
}

impl<'a> IntoIterator for &'a HaulStationList {
    type Item = &'a HaulStation;
    type IntoIter = std::slice::Iter<'a, HaulStation>;

    fn into_iter(self) -> Self::IntoIter {
        self.stations.iter()
    }
}

/// Sum of `(distance - free_haul) * |Δcumulative|` over every station pair
/// further apart than the free-haul allowance.
fn overhaul(stations: &[HaulStation], station_interval: f64, free_haul_ft: f64) -> f64 {
    let free_stations = (free_haul_ft / station_interval).floor() as usize;
    let n = stations.len();
    let mut total = 0.0;
    for (i, s_i) in stations.iter().enumerate().take(n.saturating_sub(1)) {
        if n - i - 1 <= free_stations {
            break;
        }
        for (j, s_j) in stations.iter().enumerate().skip(i + free_stations + 1) {
            let volume = (s_j.cumulative - s_i.cumulative).abs();
            let dist = (j - i) as f64 * station_interval;
            total += (dist - free_haul_ft) * volume;
        }
    }
    total
}

/// Builds the mass-haul curve of the elevation change from `surface_ref` to
/// `surface_diff` along `alignment`.
///
/// Each reference point is paired with the diff point at exactly the same
/// `(x, y)`; unmatched points are skipped. Differences are binned as heights,
/// so pre-multiply by the per-point area when absolute volumes are needed.
pub fn build_mass_haul<R, D>(
    surface_ref: &R,
    surface_diff: &D,
    alignment: &Polyline,
    station_interval: f64,
    free_haul_ft: f64,
) -> Result<HaulStationList>
where
    R: ElevationPoints + ?Sized,
    D: ElevationPoints + ?Sized,
{
    if station_interval.is_nan() || station_interval <= 0.0 {
        return Err(EarthworkError::Validation(format!(
            "station interval must be positive, got {station_interval}"
        )));
    }
    if free_haul_ft.is_nan() || free_haul_ft < 0.0 {
        return Err(EarthworkError::Validation(format!(
            "free haul distance cannot be negative, got {free_haul_ft}"
        )));
    }
    if alignment.vertices.len() < 2 {
        return Err(EarthworkError::Validation(format!(
            "alignment needs at least 2 vertices, got {}",
            alignment.vertices.len()
        )));
    }
    if alignment.vertices.iter().any(|p| !p.is_finite()) {
        return Err(EarthworkError::Validation(
            "alignment has non-finite vertices".into(),
        ));
    }

    let length = alignment.length();
    let n_stations = (length / station_interval).ceil() as usize + 1;
    let mut cuts = vec![0.0; n_stations];
    let mut fills = vec![0.0; n_stations];

    // the lowest of stacked diff elevations represents its location
    let mut diff_lookup: HashMap<(u64, u64), f64> = HashMap::new();
    for p in surface_diff.sorted_points() {
        diff_lookup
            .entry((coord_key(p.x), coord_key(p.y)))
            .or_insert(p.z);
    }

    let ref_pts = surface_ref.sorted_points();

    let mut matched = 0usize;
    for p in &ref_pts {
        let Some(&z_diff) = diff_lookup.get(&(coord_key(p.x), coord_key(p.y))) else {
            continue;
        };
        matched += 1;
        let dist = alignment.project(Point::new(p.x, p.y));
        let idx = ((dist / station_interval).floor() as usize).min(n_stations - 1);
        let dz = z_diff - p.z;
        if dz > 0.0 {
            fills[idx] += dz;
        } else if dz < 0.0 {
            cuts[idx] += -dz;
        }
    }
    debug!(
        "Matched {matched} of {} reference points against '{}'",
        ref_pts.len(),
        surface_diff.label()
    );

    let mut cumulative = 0.0;
    let stations: Vec<HaulStation> = cuts
        .iter()
        .zip(&fills)
        .enumerate()
        .map(|(i, (&cut, &fill))| {
            cumulative += fill - cut;
            HaulStation {
                station: i as f64 * station_interval,
                cut,
                fill,
                cumulative,
            }
        })
        .collect();

    let overhaul = overhaul(&stations, station_interval, free_haul_ft);
    info!("Mass haul over {length:.2} ft: {n_stations} stations, overhaul {overhaul:.2}");
    Ok(HaulStationList { stations, overhaul })
}
