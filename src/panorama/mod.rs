//! End-to-end dual fisheye to panorama conversion.
//!
//! [`build_panorama`] works on decoded images and is what the tests exercise;
//! [`PanoramaJob`] wraps it with loading and saving for the command line tool.

use crate::camera::{Aperture, EquidistantModel, FisheyeError, Resolution};
use crate::projection::Projector;
use crate::stitch::{stitch, StitchMode};
use crate::util::{ensure_output_dir, load_image, save_image, UtilError};
use image::RgbImage;
use log::{info, warn};
use std::path::PathBuf;

pub const RIGHT_FILE_NAME: &str = "equirect_right.jpg";
pub const LEFT_FILE_NAME: &str = "equirect_left.jpg";
pub const MERGED_FILE_NAME: &str = "equirect.jpg";

/// Parameters shared by both eyes.
#[derive(Debug, Clone)]
pub struct PanoramaSettings {
    /// Size of each equirectangular output, and of the merged panorama.
    pub size: Resolution,
    /// Lens aperture, ignored when `lens` is set.
    pub aperture: Aperture,
    pub stitch_mode: StitchMode,
    pub parallel: bool,
    /// Lens description loaded from file. Its resolution must match the inputs.
    pub lens: Option<EquidistantModel>,
}

impl Default for PanoramaSettings {
    fn default() -> Self {
        PanoramaSettings {
            size: Resolution::new(2000, 1000),
            aperture: Aperture::default(),
            stitch_mode: StitchMode::default(),
            parallel: true,
            lens: None,
        }
    }
}

impl PanoramaSettings {
    fn model_for(&self, image: &RgbImage) -> Result<EquidistantModel, FisheyeError> {
        let actual = Resolution::of(image);
        if actual.area() == 0 {
            return Err(FisheyeError::EmptyImage);
        }
        match &self.lens {
            Some(lens) if lens.resolution != actual => Err(FisheyeError::DimensionMismatch {
                expected: lens.resolution,
                actual,
            }),
            Some(lens) => Ok(lens.clone()),
            None => EquidistantModel::new(self.aperture, actual),
        }
    }
}

/// The two projections and the stitched result.
#[derive(Debug, Clone)]
pub struct Panorama {
    pub left: RgbImage,
    pub right: RgbImage,
    pub merged: RgbImage,
}

/// Projects both fisheye images and stitches them.
///
/// When both inputs share a lens model and size the remap table is computed
/// once and reused for the right eye.
pub fn build_panorama(
    left: &RgbImage,
    right: &RgbImage,
    settings: &PanoramaSettings,
) -> Result<Panorama, FisheyeError> {
    let projector = Projector::new(settings.size)?.parallel(settings.parallel);
    let left_model = settings.model_for(left)?;
    let right_model = settings.model_for(right)?;

    info!("Calculating left image ...");
    let left_table = projector.remap_table(&left_model)?;
    let equi_left = projector.sample(&left_table, left)?;

    info!("Calculating right image ...");
    let equi_right = if right_model == left_model {
        projector.sample(&left_table, right)?
    } else {
        warn!(
            "Left and right images differ in size ({} vs {}), building a second remap table",
            left_model.resolution, right_model.resolution
        );
        projector.project(&right_model, right)?
    };

    info!("Merging both images ({} layout) ...", settings.stitch_mode);
    let merged = stitch(&equi_left, &equi_right, settings.size, settings.stitch_mode)?;

    Ok(Panorama {
        left: equi_left,
        right: equi_right,
        merged,
    })
}

/// Paths written by [`PanoramaJob::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct PanoramaOutputs {
    pub right: PathBuf,
    pub left: PathBuf,
    pub merged: PathBuf,
}

/// One invocation of the conversion tool.
#[derive(Debug, Clone)]
pub struct PanoramaJob {
    pub left: PathBuf,
    pub right: PathBuf,
    pub output_dir: PathBuf,
    pub settings: PanoramaSettings,
}

impl PanoramaJob {
    /// Loads both fisheye images, converts them and writes
    /// `equirect_right.jpg`, `equirect_left.jpg` and `equirect.jpg`.
    pub fn run(&self) -> Result<PanoramaOutputs, UtilError> {
        let left = load_image(&self.left)?;
        let right = load_image(&self.right)?;
        info!(
            "Loaded left {} and right {} fisheye images",
            Resolution::of(&left),
            Resolution::of(&right)
        );

        let panorama = build_panorama(&left, &right, &self.settings)?;

        ensure_output_dir(&self.output_dir)?;
        let outputs = PanoramaOutputs {
            right: self.output_dir.join(RIGHT_FILE_NAME),
            left: self.output_dir.join(LEFT_FILE_NAME),
            merged: self.output_dir.join(MERGED_FILE_NAME),
        };
        save_image(&panorama.right, &outputs.right)?;
        save_image(&panorama.left, &outputs.left)?;
        save_image(&panorama.merged, &outputs.merged)?;

        info!("finished!");
        Ok(outputs)
    }
}
