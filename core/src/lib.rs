//! Client core for the carmod vehicle-photo backend.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). The host executes the actual
//! HTTP round-trip, making the core deterministic and testable.
//!
//! # Design
//! - `CarmodClient` is stateless; it holds only `base_url`.
//! - Each operation is split into `build_*` (produces request) and `parse_*`
//!   (consumes response), so the I/O boundary is explicit.
//! - `Studio` holds session and image-pipeline state and drives the client
//!   through the `Transport` and `TokenStore` seams.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod error;
pub mod http;
pub mod multipart;
pub mod studio;
pub mod types;

pub use client::{CarmodClient, DEFAULT_API_BASE};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use multipart::MultipartForm;
pub use studio::{
    AuthMode, DisplayImage, HsvAdjust, MemoryTokenStore, Pipeline, Studio, TokenStore, Transport,
    PLACEHOLDER_QUAD, TOKEN_KEY,
};
pub use types::{
    AuthToken, CompatibleWheels, Credentials, FitmentSummary, ImageMeta, ImageRecord, ImageUpload,
    MaskResult, Point, Project, ProjectDetail, ProjectImage, RecolorRequest, ShareLink,
    SharedProject, SharedVariant, UploadedImage, User, VariantResult, VehicleFilter, VehicleSpec,
    Wheel, WheelFilter,
};
