//! Implements the equidistant fisheye camera model.
//!
//! The lens looks down the `+y` axis. A viewing direction at angle `φ` from
//! that axis lands on the image disk at normalized radius `r = 2φ / aperture`,
//! so the disk rim (`r = 1`) corresponds to half the aperture. The normalized
//! disk `[-1, 1]²` is stretched over the full image, whatever its aspect ratio.

use crate::camera::{validation, Aperture, CameraModel, FisheyeError, Resolution};
use crate::geometry::{denormalize_pixel, normalize_pixel};
use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fs;
use std::io::Write;
use yaml_rust::{Yaml, YamlLoader};

/// An equidistant fisheye lens described by its aperture and image size.
///
/// # Examples
///
/// ```rust
/// use fisheye_equirect::camera::{Aperture, CameraModel, EquidistantModel, Resolution};
/// use nalgebra::Vector3;
///
/// let model = EquidistantModel::new(
///     Aperture::from_degrees(180.0).unwrap(),
///     Resolution::new(1000, 1000),
/// )
/// .unwrap();
///
/// // The optical axis hits the image center.
/// let center = model.project(&Vector3::new(0.0, 1.0, 0.0)).unwrap();
/// assert!((center.x - 500.0).abs() < 1e-9);
/// assert!((center.y - 500.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquidistantModel {
    /// Total field of view of the lens.
    pub aperture: Aperture,
    /// Size of the fisheye image, [`Resolution`] (width, height).
    pub resolution: Resolution,
}

impl EquidistantModel {
    /// Creates a new [`EquidistantModel`] and validates it.
    ///
    /// # Errors
    ///
    /// * [`FisheyeError::InvalidResolution`] if either dimension is zero.
    pub fn new(aperture: Aperture, resolution: Resolution) -> Result<Self, FisheyeError> {
        let model = EquidistantModel {
            aperture,
            resolution,
        };
        model.validate_params()?;
        Ok(model)
    }

    /// Maps a viewing direction onto the normalized image disk.
    ///
    /// Returns `(x, y)` in normalized coordinates where the lens rim sits at
    /// radius 1. Directions behind the lens produce radii above 1.
    pub fn project_normalized(&self, direction: &Vector3<f64>) -> Vector2<f64> {
        let p_xz = (direction.x * direction.x + direction.z * direction.z).sqrt();
        let r = 2.0 * p_xz.atan2(direction.y) / self.aperture.radians();
        let theta = direction.z.atan2(direction.x);
        Vector2::new(r * theta.cos(), r * theta.sin())
    }
}

fn yaml_f64(value: &Yaml) -> Option<f64> {
    value.as_f64().or_else(|| value.as_i64().map(|v| v as f64))
}

impl CameraModel for EquidistantModel {
    /// Projects a viewing direction to continuous pixel coordinates.
    ///
    /// # Errors
    ///
    /// * [`FisheyeError::PointAtCameraCenter`]: the direction has (near) zero length.
    fn project(&self, direction: &Vector3<f64>) -> Result<Vector2<f64>, FisheyeError> {
        if direction.norm() < f64::EPSILON.sqrt() {
            return Err(FisheyeError::PointAtCameraCenter);
        }
        let normalized = self.project_normalized(direction);
        Ok(Vector2::new(
            denormalize_pixel(normalized.x, self.resolution.width),
            denormalize_pixel(normalized.y, self.resolution.height),
        ))
    }

    /// Unprojects pixel coordinates to a unit viewing direction.
    ///
    /// # Errors
    ///
    /// * [`FisheyeError::PointIsOutSideImage`]: the pixel lies further from the
    ///   center than the lens can see (angle from the axis above π).
    fn unproject(&self, point_2d: &Vector2<f64>) -> Result<Vector3<f64>, FisheyeError> {
        let x_norm = normalize_pixel(point_2d.x, self.resolution.width);
        let y_norm = normalize_pixel(point_2d.y, self.resolution.height);

        let r = (x_norm * x_norm + y_norm * y_norm).sqrt();
        let angle = r * self.aperture.radians() / 2.0;
        if angle > PI + f64::EPSILON.sqrt() {
            return Err(FisheyeError::PointIsOutSideImage);
        }

        let theta = y_norm.atan2(x_norm);
        let (sin_angle, cos_angle) = angle.sin_cos();
        Ok(Vector3::new(
            sin_angle * theta.cos(),
            cos_angle,
            sin_angle * theta.sin(),
        ))
    }

    /// Loads a lens description from a YAML file.
    ///
    /// The aperture is stored in degrees under `cam0.aperture`, the image size
    /// under `cam0.resolution` as `[width, height]`.
    fn load_from_yaml(path: &str) -> Result<Self, FisheyeError> {
        let contents = fs::read_to_string(path)?;
        let docs = YamlLoader::load_from_str(&contents)?;

        if docs.is_empty() {
            return Err(FisheyeError::InvalidParams(
                "Empty YAML document".to_string(),
            ));
        }

        let doc = &docs[0];
        let cam = &doc["cam0"];

        if let Some(camera_model) = cam["camera_model"].as_str() {
            if camera_model != "equidistant" {
                return Err(FisheyeError::InvalidParams(format!(
                    "Unsupported camera_model '{camera_model}', expected 'equidistant'"
                )));
            }
        }

        let aperture_deg = yaml_f64(&cam["aperture"]).ok_or_else(|| {
            FisheyeError::InvalidParams("YAML missing 'aperture' under 'cam0'".to_string())
        })?;

        let resolution_yaml_vec = cam["resolution"].as_vec().ok_or_else(|| {
            FisheyeError::InvalidParams(
                "YAML missing 'resolution' array under 'cam0'".to_string(),
            )
        })?;
        if resolution_yaml_vec.len() < 2 {
            return Err(FisheyeError::InvalidParams(
                "Resolution array in YAML must have 2 elements (width, height)".to_string(),
            ));
        }

        let dimension = |value: &Yaml, name: &str| -> Result<u32, FisheyeError> {
            value
                .as_i64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| {
                    FisheyeError::InvalidParams(format!(
                        "Invalid {name} in YAML: not a non-negative integer"
                    ))
                })
        };

        let resolution = Resolution {
            width: dimension(&resolution_yaml_vec[0], "width")?,
            height: dimension(&resolution_yaml_vec[1], "height")?,
        };

        EquidistantModel::new(Aperture::from_degrees(aperture_deg)?, resolution)
    }

    fn save_to_yaml(&self, path: &str) -> Result<(), FisheyeError> {
        let mut cam = serde_yaml::Mapping::new();
        cam.insert(
            serde_yaml::Value::String("camera_model".to_string()),
            serde_yaml::Value::String("equidistant".to_string()),
        );
        cam.insert(
            serde_yaml::Value::String("aperture".to_string()),
            serde_yaml::to_value(self.aperture.degrees())
                .map_err(|e| FisheyeError::YamlError(e.to_string()))?,
        );
        cam.insert(
            serde_yaml::Value::String("resolution".to_string()),
            serde_yaml::to_value(vec![self.resolution.width, self.resolution.height])
                .map_err(|e| FisheyeError::YamlError(e.to_string()))?,
        );

        let mut root = serde_yaml::Mapping::new();
        root.insert(
            serde_yaml::Value::String("cam0".to_string()),
            serde_yaml::Value::Mapping(cam),
        );

        let yaml_string = serde_yaml::to_string(&root)
            .map_err(|e| FisheyeError::YamlError(e.to_string()))?;

        let mut file = fs::File::create(path)?;
        file.write_all(yaml_string.as_bytes())?;
        Ok(())
    }

    fn validate_params(&self) -> Result<(), FisheyeError> {
        validation::validate_resolution(&self.resolution)?;
        validation::validate_aperture(self.aperture.radians())
    }

    fn get_resolution(&self) -> Resolution {
        self.resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::equirect_direction;
    use approx::assert_relative_eq;

    fn model(degrees: f64, width: u32, height: u32) -> EquidistantModel {
        EquidistantModel::new(
            Aperture::from_degrees(degrees).unwrap(),
            Resolution::new(width, height),
        )
        .unwrap()
    }

    /// Tests loading [`EquidistantModel`] parameters from "samples/equidistant.yaml".
    #[test]
    fn test_equidistant_load_from_yaml() {
        let model = EquidistantModel::load_from_yaml("samples/equidistant.yaml").unwrap();

        assert_relative_eq!(model.aperture.degrees(), 210.0, epsilon = 1e-9);
        assert_eq!(model.resolution.width, 1920);
        assert_eq!(model.resolution.height, 1920);
    }

    /// Tests saving [`EquidistantModel`] parameters and reloading them.
    #[test]
    fn test_equidistant_save_to_yaml() {
        fs::create_dir_all("output").expect("Failed to create output directory for test.");
        let output_path = "output/equidistant_saved.yaml";

        let model = model(195.0, 1280, 960);
        model.save_to_yaml(output_path).unwrap();
        let saved_model = EquidistantModel::load_from_yaml(output_path).unwrap();

        assert_relative_eq!(
            model.aperture.radians(),
            saved_model.aperture.radians(),
            epsilon = 1e-12
        );
        assert_eq!(model.resolution, saved_model.resolution);

        fs::remove_file(output_path).unwrap();
    }

    #[test]
    fn test_equidistant_load_rejects_other_models() {
        fs::create_dir_all("output").expect("Failed to create output directory for test.");
        let path = "output/equidistant_wrong_model.yaml";
        fs::write(
            path,
            "cam0:\n  camera_model: pinhole\n  aperture: 90\n  resolution: [640, 480]\n",
        )
        .unwrap();

        let result = EquidistantModel::load_from_yaml(path);
        assert!(matches!(result, Err(FisheyeError::InvalidParams(_))));

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_equidistant_load_rejects_bad_aperture() {
        fs::create_dir_all("output").expect("Failed to create output directory for test.");
        let path = "output/equidistant_bad_aperture.yaml";
        fs::write(path, "cam0:\n  aperture: 400\n  resolution: [640, 480]\n").unwrap();

        let result = EquidistantModel::load_from_yaml(path);
        assert!(matches!(result, Err(FisheyeError::InvalidAperture(_))));

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_equidistant_rejects_zero_resolution() {
        let aperture = Aperture::from_degrees(210.0).unwrap();
        let result = EquidistantModel::new(aperture, Resolution::new(0, 100));
        assert!(matches!(
            result,
            Err(FisheyeError::InvalidResolution { .. })
        ));
    }

    #[test]
    fn test_optical_axis_hits_center() {
        let model = model(210.0, 1920, 1080);
        let center = model.project(&Vector3::new(0.0, 1.0, 0.0)).unwrap();
        assert_relative_eq!(center.x, 960.0, epsilon = 1e-9);
        assert_relative_eq!(center.y, 540.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rim_radius_is_half_aperture() {
        // A 180 degree lens sees the x axis exactly on its rim.
        let model = model(180.0, 1000, 1000);
        let rim = model.project_normalized(&Vector3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(rim.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(rim.y, 0.0, epsilon = 1e-12);

        let point = model.project(&Vector3::new(0.0, 0.0, 1.0)).unwrap();
        assert_relative_eq!(point.x, 500.0, epsilon = 1e-9);
        assert_relative_eq!(point.y, 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_project_rejects_zero_direction() {
        let model = model(210.0, 100, 100);
        assert!(matches!(
            model.project(&Vector3::zeros()),
            Err(FisheyeError::PointAtCameraCenter)
        ));
    }

    /// Tests projection and unprojection consistency for the [`EquidistantModel`].
    #[test]
    fn test_equidistant_project_unproject() {
        let model = model(210.0, 1600, 1200);

        for (x_norm, y_norm) in [(0.5, 0.0), (0.3, 0.2), (0.7, -0.4), (0.1, 0.6)] {
            let direction = equirect_direction(x_norm, y_norm);
            let point_2d = model.project(&direction).unwrap();
            let ray = model.unproject(&point_2d).unwrap();

            assert_relative_eq!(ray.norm(), 1.0, epsilon = 1e-9);
            assert_relative_eq!(ray, direction, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_unproject_outside_coverage() {
        // A 90 degree lens cannot see beyond 180 degrees from its axis, which
        // corresponds to a normalized radius of 4.
        let model = model(90.0, 100, 100);
        let far = Vector2::new(500.0, 50.0);
        assert!(matches!(
            model.unproject(&far),
            Err(FisheyeError::PointIsOutSideImage)
        ));
    }
}
