//! Stateless HTTP request builder and response parser for the carmod API.
//!
//! # Design
//! `CarmodClient` holds only a `base_url` and carries no mutable state
//! between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. The caller executes the actual HTTP round-trip, keeping
//! the core deterministic and free of I/O dependencies.
//!
//! Header order is fixed: `content-type` (when there is a body) and then
//! `authorization`. Any 2xx status is success.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::form_urlencoded;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::multipart::MultipartForm;
use crate::types::{
    AuthToken, CompatibleWheels, CreateProject, Credentials, ImageRecord, ImageUpload, MaskResult,
    OverlayWheelRequest, Point, Project, ProjectDetail, RecolorRequest, SegmentRequest, ShareLink,
    ShareProject, SharedProject, UploadedImage, User, VariantResult, VehicleFilter, VehicleSpec,
    Wheel, WheelFilter,
};

/// Default backend address when nothing is configured.
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

const API_PREFIX: &str = "/api/v1";
const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

/// Synchronous, stateless client for the carmod API.
#[derive(Debug, Clone)]
pub struct CarmodClient {
    base_url: String,
}

impl Default for CarmodClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

impl CarmodClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join a server-relative resource path (e.g. `media/variants/x.png`)
    /// with the base URL into a fetchable URL.
    pub fn media_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // -- auth ---------------------------------------------------------------

    pub fn build_signup(&self, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/auth/signup", credentials, None)
    }

    /// Login posts form-encoded `username`/`password`, the OAuth2 password
    /// flow the backend expects.
    pub fn build_login(&self, credentials: &Credentials) -> HttpRequest {
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("username", &credentials.email)
            .append_pair("password", &credentials.password)
            .finish();
        HttpRequest {
            method: HttpMethod::Post,
            path: self.api_url("/auth/login"),
            headers: headers(Some(FORM), None),
            body: Some(body.into_bytes()),
        }
    }

    pub fn build_current_user(&self, token: &str) -> HttpRequest {
        self.bare_request(HttpMethod::Get, "/auth/me", Some(token))
    }

    pub fn parse_signup(&self, response: HttpResponse) -> Result<AuthToken, ApiError> {
        parse_json(response)
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<AuthToken, ApiError> {
        parse_json(response)
    }

    pub fn parse_current_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        parse_json(response)
    }

    // -- projects -----------------------------------------------------------

    pub fn build_create_project(&self, title: &str, token: &str) -> Result<HttpRequest, ApiError> {
        let input = CreateProject {
            title: title.to_string(),
        };
        self.json_request(HttpMethod::Post, "/projects", &input, Some(token))
    }

    pub fn build_list_projects(&self, token: &str) -> HttpRequest {
        self.bare_request(HttpMethod::Get, "/projects", Some(token))
    }

    pub fn build_get_project(&self, id: i64, token: &str) -> HttpRequest {
        self.bare_request(HttpMethod::Get, &format!("/projects/{id}"), Some(token))
    }

    pub fn build_rename_project(
        &self,
        id: i64,
        title: &str,
        token: &str,
    ) -> Result<HttpRequest, ApiError> {
        let input = CreateProject {
            title: title.to_string(),
        };
        self.json_request(HttpMethod::Put, &format!("/projects/{id}"), &input, Some(token))
    }

    pub fn build_delete_project(&self, id: i64, token: &str) -> HttpRequest {
        self.bare_request(HttpMethod::Delete, &format!("/projects/{id}"), Some(token))
    }

    pub fn parse_create_project(&self, response: HttpResponse) -> Result<Project, ApiError> {
        parse_json(response)
    }

    pub fn parse_list_projects(&self, response: HttpResponse) -> Result<Vec<Project>, ApiError> {
        parse_json(response)
    }

    pub fn parse_get_project(&self, response: HttpResponse) -> Result<ProjectDetail, ApiError> {
        parse_json(response)
    }

    pub fn parse_rename_project(&self, response: HttpResponse) -> Result<Project, ApiError> {
        parse_json(response)
    }

    pub fn parse_delete_project(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    // -- images and ops -----------------------------------------------------

    pub fn build_upload_image(
        &self,
        upload: &ImageUpload,
        project_id: Option<i64>,
        token: Option<&str>,
    ) -> HttpRequest {
        self.build_upload_image_with(MultipartForm::new(), upload, project_id, token)
    }

    /// Same as `build_upload_image` but with a caller-supplied form, so the
    /// multipart boundary can be fixed.
    pub fn build_upload_image_with(
        &self,
        form: MultipartForm,
        upload: &ImageUpload,
        project_id: Option<i64>,
        token: Option<&str>,
    ) -> HttpRequest {
        let mut form = form.file("file", upload);
        if let Some(project_id) = project_id {
            form = form.text("project_id", project_id.to_string());
        }
        HttpRequest {
            method: HttpMethod::Post,
            path: self.api_url("/images"),
            headers: headers(Some(&form.content_type()), token),
            body: Some(form.encode()),
        }
    }

    pub fn build_segment(
        &self,
        image_path: &str,
        token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let input = SegmentRequest {
            image_path: image_path.to_string(),
        };
        self.json_request(HttpMethod::Post, "/ops/segment", &input, token)
    }

    pub fn build_recolor(
        &self,
        input: &RecolorRequest,
        token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/ops/recolor", input, token)
    }

    pub fn build_overlay_wheel(
        &self,
        base_image_path: &str,
        wheel_image_path: &str,
        dst_pts: [Point; 4],
        token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let input = OverlayWheelRequest {
            base_image_path: base_image_path.to_string(),
            wheel_image_path: wheel_image_path.to_string(),
            dst_pts,
        };
        self.json_request(HttpMethod::Post, "/ops/overlay/wheel", &input, token)
    }

    pub fn build_get_image(&self, image_id: i64, token: &str) -> HttpRequest {
        self.bare_request(HttpMethod::Get, &format!("/images/{image_id}"), Some(token))
    }

    pub fn build_delete_image(&self, image_id: i64, token: &str) -> HttpRequest {
        self.bare_request(HttpMethod::Delete, &format!("/images/{image_id}"), Some(token))
    }

    pub fn parse_get_image(&self, response: HttpResponse) -> Result<ImageRecord, ApiError> {
        parse_json(response)
    }

    pub fn parse_delete_image(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn parse_upload_image(&self, response: HttpResponse) -> Result<UploadedImage, ApiError> {
        parse_json(response)
    }

    pub fn parse_segment(&self, response: HttpResponse) -> Result<MaskResult, ApiError> {
        parse_json(response)
    }

    pub fn parse_recolor(&self, response: HttpResponse) -> Result<VariantResult, ApiError> {
        parse_json(response)
    }

    pub fn parse_overlay_wheel(&self, response: HttpResponse) -> Result<VariantResult, ApiError> {
        parse_json(response)
    }

    // -- catalog ------------------------------------------------------------

    pub fn build_list_wheels(&self, filter: &WheelFilter) -> HttpRequest {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(brand) = &filter.brand {
            query.append_pair("brand", brand);
        }
        self.query_request("/catalog/wheels", query.finish())
    }

    pub fn build_get_wheel(&self, id: i64) -> HttpRequest {
        self.bare_request(HttpMethod::Get, &format!("/catalog/wheels/{id}"), None)
    }

    /// Wheels that fit the given vehicle spec.
    pub fn build_compatible_wheels(&self, vehicle_spec_id: i64) -> HttpRequest {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("vehicle_spec_id", &vehicle_spec_id.to_string())
            .finish();
        self.query_request("/catalog/wheels/compatible", query)
    }

    pub fn parse_compatible_wheels(
        &self,
        response: HttpResponse,
    ) -> Result<CompatibleWheels, ApiError> {
        parse_json(response)
    }

    pub fn build_list_vehicle_specs(&self, filter: &VehicleFilter) -> HttpRequest {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(make) = &filter.make {
            query.append_pair("make", make);
        }
        if let Some(model) = &filter.model {
            query.append_pair("model", model);
        }
        if let Some(year) = filter.year {
            query.append_pair("year", &year.to_string());
        }
        self.query_request("/catalog/vehicles", query.finish())
    }

    pub fn build_get_vehicle_spec(&self, id: i64) -> HttpRequest {
        self.bare_request(HttpMethod::Get, &format!("/catalog/vehicles/{id}"), None)
    }

    pub fn parse_list_wheels(&self, response: HttpResponse) -> Result<Vec<Wheel>, ApiError> {
        parse_json(response)
    }

    pub fn parse_get_wheel(&self, response: HttpResponse) -> Result<Wheel, ApiError> {
        parse_json(response)
    }

    pub fn parse_list_vehicle_specs(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<VehicleSpec>, ApiError> {
        parse_json(response)
    }

    pub fn parse_get_vehicle_spec(&self, response: HttpResponse) -> Result<VehicleSpec, ApiError> {
        parse_json(response)
    }

    // -- sharing ------------------------------------------------------------

    /// Publish a project. With `public` false the backend issues a slug but
    /// does not serve it.
    pub fn build_share_project(
        &self,
        project_id: i64,
        public: bool,
        token: &str,
    ) -> Result<HttpRequest, ApiError> {
        let input = ShareProject { project_id, public };
        self.json_request(HttpMethod::Post, "/share/projects", &input, Some(token))
    }

    /// Public view of a shared project. Needs no token.
    pub fn build_get_shared_project(&self, slug: &str) -> HttpRequest {
        let slug: String = form_urlencoded::byte_serialize(slug.as_bytes()).collect();
        self.bare_request(HttpMethod::Get, &format!("/share/{slug}"), None)
    }

    pub fn parse_get_shared_project(&self, response: HttpResponse) -> Result<SharedProject, ApiError> {
        parse_json(response)
    }

    pub fn build_unshare_project(&self, project_id: i64, token: &str) -> HttpRequest {
        self.bare_request(
            HttpMethod::Delete,
            &format!("/share/projects/{project_id}"),
            Some(token),
        )
    }

    pub fn parse_share_project(&self, response: HttpResponse) -> Result<ShareLink, ApiError> {
        parse_json(response)
    }

    pub fn parse_unshare_project(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    // -- health -------------------------------------------------------------

    pub fn build_health(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/health", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_health(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    // -- helpers ------------------------------------------------------------

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}{API_PREFIX}{endpoint}", self.base_url)
    }

    fn bare_request(&self, method: HttpMethod, endpoint: &str, token: Option<&str>) -> HttpRequest {
        HttpRequest {
            method,
            path: self.api_url(endpoint),
            headers: headers(None, token),
            body: None,
        }
    }

    fn query_request(&self, endpoint: &str, query: String) -> HttpRequest {
        let mut path = self.api_url(endpoint);
        if !query.is_empty() {
            path.push('?');
            path.push_str(&query);
        }
        HttpRequest {
            method: HttpMethod::Get,
            path,
            headers: Vec::new(),
            body: None,
        }
    }

    fn json_request<T: Serialize>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        input: &T,
        token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_vec(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method,
            path: self.api_url(endpoint),
            headers: headers(Some(JSON), token),
            body: Some(body),
        })
    }
}

fn headers(content_type: Option<&str>, token: Option<&str>) -> Vec<(String, String)> {
    let mut headers = Vec::with_capacity(2);
    if let Some(content_type) = content_type {
        headers.push(("content-type".to_string(), content_type.to_string()));
    }
    if let Some(token) = token {
        headers.push(("authorization".to_string(), format!("Bearer {token}")));
    }
    headers
}

/// Map non-2xx status codes to `ApiError::Status`.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    debug!(status = response.status, "request rejected");
    Err(ApiError::Status {
        status: response.status,
        body: response.body.clone(),
    })
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}
