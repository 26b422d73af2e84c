//! Domain DTOs for the carmod API.
//!
//! # Design
//! These types mirror the backend's JSON schema but are defined independently
//! from the mock-server crate; integration tests catch schema drift. Nothing
//! here is validated client-side beyond optional-field presence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// The authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
}

/// A project summary as returned by create and list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    pub id: i64,
    pub title: String,
    /// Server timestamp, kept verbatim.
    pub created_at: String,
    #[serde(default)]
    pub image_count: u32,
}

/// Full project record with its stored images.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectDetail {
    pub id: i64,
    pub title: String,
    pub created_at: String,
    #[serde(default)]
    pub images: Vec<ProjectImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectImage {
    pub id: i64,
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// A wheel asset from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Wheel {
    pub id: i64,
    pub brand: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_json: Option<String>,
}

/// Fitment data for a vehicle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleSpec {
    pub id: i64,
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(default)]
    pub trim: Option<String>,
    #[serde(default)]
    pub bolt_pattern: Option<String>,
    #[serde(default)]
    pub rim_diameter: Option<f64>,
    #[serde(default)]
    pub rim_width: Option<f64>,
    #[serde(default)]
    pub offset: Option<f64>,
    #[serde(default)]
    pub center_bore: Option<f64>,
}

/// Body returned by signup and login. A response without `access_token` is
/// accepted but does not sign anyone in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthToken {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub title: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageMeta {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub channels: Option<u32>,
}

/// Result of an image upload. `image_path` is relative to the base URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedImage {
    pub image_path: String,
    #[serde(default)]
    pub meta: Option<ImageMeta>,
    #[serde(default)]
    pub image_id: Option<i64>,
    #[serde(default)]
    pub project_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MaskResult {
    pub mask_path: String,
}

/// Output of recolor and wheel overlay: a new variant image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VariantResult {
    pub image_path: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentRequest {
    pub image_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecolorRequest {
    pub image_path: String,
    pub mask_path: String,
    pub dh: i32,
    pub ds: f64,
    pub dv: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayWheelRequest {
    pub base_image_path: String,
    pub wheel_image_path: String,
    pub dst_pts: [Point; 4],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareProject {
    pub project_id: i64,
    pub public: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShareLink {
    pub slug: String,
    pub public_url: String,
}

/// Public, read-only view of a shared project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SharedProject {
    pub title: String,
    #[serde(default)]
    pub images: Vec<ProjectImage>,
    #[serde(default)]
    pub variants: Vec<SharedVariant>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SharedVariant {
    pub id: i64,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
}

/// A stored image looked up on its own, with the project it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRecord {
    pub id: i64,
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    pub project_id: i64,
}

/// Wheels that fit a given vehicle, with the fitment that was matched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompatibleWheels {
    pub vehicle_spec: FitmentSummary,
    #[serde(default)]
    pub compatible_wheels: Vec<Wheel>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FitmentSummary {
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(default)]
    pub rim_diameter: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WheelFilter {
    pub brand: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleFilter {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
}

/// A local image file staged for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// Read a file from disk, guessing its content type from the extension.
    pub fn from_path(path: &Path) -> Result<Self, ApiError> {
        let bytes = std::fs::read(path).map_err(|source| ApiError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }
}
