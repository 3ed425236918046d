//! Fisheye Equirect Library
//!
//! Converts a pair of fisheye photographs into equirectangular projections and
//! stitches them into a single panorama. The library provides:
//! - Coordinate helpers for equirectangular grids ([`geometry`])
//! - The equidistant fisheye camera model ([`camera`])
//! - Nearest-neighbor remapping through precomputed tables ([`projection`])
//! - Stitching of the left and right projections ([`stitch`])
//! - The end-to-end pipeline used by the `fisheye2equi` tool ([`panorama`])

pub mod camera;
pub mod geometry;
pub mod panorama;
pub mod projection;
pub mod stitch;
pub mod util;

// Re-export commonly used types
pub use camera::{Aperture, CameraModel, EquidistantModel, FisheyeError, Resolution};

pub use panorama::{build_panorama, Panorama, PanoramaJob, PanoramaOutputs, PanoramaSettings};
pub use projection::{fisheye_to_equirect, Projector, RemapTable};
pub use stitch::{stitch, StitchMode};
pub use util::UtilError;
