//! Earthwork volume core: surfaces, cut/fill volumes and mass haul.
//!
//! Surfaces are built from elevation-tagged polylines by
//! [`dtm::SurfaceBuilder`], compared on a regular grid by
//! [`volume::VolumeCalculator`], split into elevation bands by
//! [`slices::compute_slice_volumes`] and accumulated along a route by
//! [`mass_haul::build_mass_haul`].

pub mod dtm;
pub mod error;
pub mod geometry;
pub mod interpolate;
pub mod mass_haul;
pub mod project;
pub mod region;
pub mod settings;
pub mod slices;
pub mod surface;
pub mod volume;

pub use dtm::{flat_surface, lowest_surface, SurfaceBuilder};
pub use error::{EarthworkError, Result};
pub use mass_haul::{build_mass_haul, HaulStation, HaulStationList};
pub use project::{PolylineData, Project};
pub use region::Region;
pub use settings::Settings;
pub use slices::{compute_slice_volumes, SliceResult};
pub use surface::{ElevationPoints, Point3D, Surface, SurfaceType, Triangle};
pub use volume::{CutFill, GridVolumeResult, VolumeCalculator};
