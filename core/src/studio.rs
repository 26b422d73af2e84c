//! Session, project, catalog and image-pipeline state behind the view.
//!
//! # Design
//! `Studio` is the one stateful piece of the client. It owns a stateless
//! `CarmodClient`, a `Transport` that performs the HTTP round-trip, and a
//! `TokenStore` that persists the auth token between runs. User actions are
//! `&mut self` methods, so each finishes before the next starts.
//!
//! Failures are flattened: an action that the user triggered pushes one alert
//! string for the view and logs the underlying `ApiError`. Background fetches
//! (projects, wheels, vehicle specs) only log. Missing prerequisites make an
//! action a silent no-op.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::client::CarmodClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{
    Credentials, FitmentSummary, ImageRecord, ImageUpload, Point, Project, ProjectDetail,
    RecolorRequest, ShareLink, SharedProject, User, VehicleFilter, VehicleSpec, Wheel,
    WheelFilter,
};

/// Key the auth token is persisted under.
pub const TOKEN_KEY: &str = "token";

/// Destination quad used for wheel overlay until the view collects clicks.
pub const PLACEHOLDER_QUAD: [Point; 4] = [
    Point::new(100.0, 100.0),
    Point::new(200.0, 100.0),
    Point::new(200.0, 200.0),
    Point::new(100.0, 200.0),
];

pub const AUTH_FAILED: &str = "Authentication failed. Please check your credentials.";
pub const CREATE_PROJECT_FAILED: &str = "Failed to create project";
pub const UPLOAD_FAILED: &str = "Image upload failed";
pub const SEGMENT_FAILED: &str = "Segmentation failed";
pub const RECOLOR_FAILED: &str = "Recoloring failed";
pub const OVERLAY_FAILED: &str = "Wheel overlay failed";
pub const SHARE_FAILED: &str = "Failed to share project";
pub const UNSHARE_FAILED: &str = "Failed to unshare project";
pub const RENAME_PROJECT_FAILED: &str = "Failed to rename project";
pub const DELETE_PROJECT_FAILED: &str = "Failed to delete project";
pub const DELETE_IMAGE_FAILED: &str = "Failed to delete image";

/// Executes one HTTP round-trip. Non-2xx statuses are returned as data;
/// only failures to get any response are errors.
pub trait Transport {
    fn execute(&mut self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Persistent home of the auth token.
pub trait TokenStore {
    fn load(&self) -> io::Result<Option<String>>;
    fn save(&mut self, token: &str) -> io::Result<()>;
    fn clear(&mut self) -> io::Result<()>;
}

/// Token store that lives only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    token: Option<String>,
}

impl MemoryTokenStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> io::Result<Option<String>> {
        Ok(self.token.clone())
    }

    fn save(&mut self, token: &str) -> io::Result<()> {
        self.token = Some(token.to_string());
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.token = None;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    Login,
    Signup,
}

#[derive(Debug, Clone, Default)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub email: String,
    pub password: String,
}

impl AuthForm {
    fn clear(&mut self) {
        self.email.clear();
        self.password.clear();
    }
}

/// Hue/saturation/value deltas sent with a recolor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HsvAdjust {
    pub dh: i32,
    pub ds: f64,
    pub dv: f64,
}

impl HsvAdjust {
    pub const HUE_RANGE: (i32, i32) = (-90, 90);
    pub const FACTOR_RANGE: (f64, f64) = (-1.0, 1.0);

    /// Build an adjustment with every component clamped to its slider range.
    pub fn clamped(dh: i32, ds: f64, dv: f64) -> Self {
        let (lo, hi) = Self::FACTOR_RANGE;
        let factor = |v: f64| if v.is_nan() { 0.0 } else { v.clamp(lo, hi) };
        Self {
            dh: dh.clamp(Self::HUE_RANGE.0, Self::HUE_RANGE.1),
            ds: factor(ds),
            dv: factor(dv),
        }
    }
}

/// Image pipeline for the photo currently on screen.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pub local_preview: Option<PathBuf>,
    pub image_path: Option<String>,
    pub mask_path: Option<String>,
    pub variant_path: Option<String>,
    pub adjust: HsvAdjust,
}

/// What the preview pane should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayImage {
    Remote(String),
    Local(PathBuf),
}

pub struct Studio<T, S> {
    client: CarmodClient,
    transport: T,
    store: S,
    token: Option<String>,
    user: Option<User>,
    projects: Vec<Project>,
    current_project: Option<i64>,
    wheels: Vec<Wheel>,
    selected_wheel: Option<Wheel>,
    vehicle_specs: Vec<VehicleSpec>,
    pipeline: Pipeline,
    busy: bool,
    pub auth_form: AuthForm,
    pub project_title: String,
    pub show_projects: bool,
    pub show_wheels: bool,
    alerts: Vec<String>,
}

impl<T: Transport, S: TokenStore> Studio<T, S> {
    pub fn new(client: CarmodClient, transport: T, store: S) -> Self {
        Self {
            client,
            transport,
            store,
            token: None,
            user: None,
            projects: Vec::new(),
            current_project: None,
            wheels: Vec::new(),
            selected_wheel: None,
            vehicle_specs: Vec::new(),
            pipeline: Pipeline::default(),
            busy: false,
            auth_form: AuthForm::default(),
            project_title: String::new(),
            show_projects: false,
            show_wheels: false,
            alerts: Vec::new(),
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn client(&self) -> &CarmodClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn current_project(&self) -> Option<&Project> {
        let id = self.current_project?;
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn wheels(&self) -> &[Wheel] {
        &self.wheels
    }

    /// The wheel picked for overlay. It stays selected when a later catalog
    /// fetch no longer lists it.
    pub fn selected_wheel(&self) -> Option<&Wheel> {
        self.selected_wheel.as_ref()
    }

    pub fn vehicle_specs(&self) -> &[VehicleSpec] {
        &self.vehicle_specs
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Drain alerts raised since the last call.
    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }

    // -- session ------------------------------------------------------------

    /// Restore a persisted session, if any.
    pub fn bootstrap(&mut self) {
        match self.store.load() {
            Ok(Some(token)) => {
                debug!("restoring persisted session");
                self.token = Some(token.clone());
                self.fetch_user(&token);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "could not read persisted token"),
        }
    }

    fn fetch_user(&mut self, token: &str) {
        let request = self.client.build_current_user(token);
        let result = self
            .roundtrip(request)
            .and_then(|response| self.client.parse_current_user(response));
        match result {
            Ok(user) => {
                info!(user_id = user.id, "signed in");
                self.user = Some(user);
                self.fetch_projects(token);
            }
            Err(e) => {
                error!(error = %e, "failed to fetch user");
                if let Err(e) = self.store.clear() {
                    warn!(error = %e, "could not clear persisted token");
                }
                self.token = None;
            }
        }
    }

    fn fetch_projects(&mut self, token: &str) {
        let request = self.client.build_list_projects(token);
        match self
            .roundtrip(request)
            .and_then(|response| self.client.parse_list_projects(response))
        {
            Ok(projects) => self.projects = projects,
            Err(e) => error!(error = %e, "failed to fetch projects"),
        }
    }

    pub fn toggle_auth_mode(&mut self) {
        self.auth_form.mode = match self.auth_form.mode {
            AuthMode::Login => AuthMode::Signup,
            AuthMode::Signup => AuthMode::Login,
        };
    }

    pub fn set_credentials(&mut self, email: &str, password: &str) {
        self.auth_form.email = email.to_string();
        self.auth_form.password = password.to_string();
    }

    /// Sign up or log in with the form's credentials, per the form's mode.
    pub fn submit_auth(&mut self) {
        self.busy = true;
        let credentials = Credentials {
            email: self.auth_form.email.clone(),
            password: self.auth_form.password.clone(),
        };
        let result = match self.auth_form.mode {
            AuthMode::Signup => self
                .client
                .build_signup(&credentials)
                .and_then(|request| self.roundtrip(request))
                .and_then(|response| self.client.parse_signup(response)),
            AuthMode::Login => {
                let request = self.client.build_login(&credentials);
                self.roundtrip(request)
                    .and_then(|response| self.client.parse_login(response))
            }
        };
        match result {
            Ok(auth) => match auth.access_token {
                Some(token) => {
                    self.token = Some(token.clone());
                    if let Err(e) = self.store.save(&token) {
                        warn!(error = %e, "could not persist token");
                    }
                    self.fetch_user(&token);
                    self.auth_form.clear();
                }
                None => debug!("auth response carried no access token"),
            },
            Err(e) => self.fail(AUTH_FAILED, &e),
        }
        self.busy = false;
    }

    pub fn logout(&mut self) {
        self.token = None;
        self.user = None;
        self.projects.clear();
        self.current_project = None;
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "could not clear persisted token");
        }
    }

    // -- projects -----------------------------------------------------------

    /// Select a loaded project. Returns false if no such project is loaded.
    pub fn select_project(&mut self, id: i64) -> bool {
        if self.projects.iter().any(|p| p.id == id) {
            self.current_project = Some(id);
            true
        } else {
            false
        }
    }

    /// Create a project from `project_title`. The title is sent as typed;
    /// a blank title is ignored.
    pub fn create_project(&mut self) {
        let Some(token) = self.token.clone() else {
            return;
        };
        if self.project_title.trim().is_empty() {
            return;
        }
        self.busy = true;
        let title = self.project_title.clone();
        let result = self
            .client
            .build_create_project(&title, &token)
            .and_then(|request| self.roundtrip(request))
            .and_then(|response| self.client.parse_create_project(response));
        match result {
            Ok(project) => {
                self.current_project = Some(project.id);
                self.projects.push(project);
                self.project_title.clear();
                self.show_projects = false;
            }
            Err(e) => self.fail(CREATE_PROJECT_FAILED, &e),
        }
        self.busy = false;
    }

    /// Rename the current project in place.
    pub fn rename_current_project(&mut self, title: &str) {
        let (Some(token), Some(id)) = (self.token.clone(), self.current_project) else {
            return;
        };
        if title.trim().is_empty() {
            return;
        }
        self.busy = true;
        let result = self
            .client
            .build_rename_project(id, title, &token)
            .and_then(|request| self.roundtrip(request))
            .and_then(|response| self.client.parse_rename_project(response));
        match result {
            Ok(renamed) => {
                if let Some(slot) = self.projects.iter_mut().find(|p| p.id == renamed.id) {
                    *slot = renamed;
                }
            }
            Err(e) => self.fail(RENAME_PROJECT_FAILED, &e),
        }
        self.busy = false;
    }

    /// Delete the current project and drop it from the list.
    pub fn delete_current_project(&mut self) {
        let (Some(token), Some(id)) = (self.token.clone(), self.current_project) else {
            return;
        };
        let request = self.client.build_delete_project(id, &token);
        match self
            .roundtrip(request)
            .and_then(|response| self.client.parse_delete_project(response))
        {
            Ok(()) => {
                self.projects.retain(|p| p.id != id);
                self.current_project = None;
            }
            Err(e) => self.fail(DELETE_PROJECT_FAILED, &e),
        }
    }

    /// Publish the current project. A private share gets a slug the backend
    /// will not serve to anonymous readers.
    pub fn share_current_project(&mut self, public: bool) -> Option<ShareLink> {
        let (Some(token), Some(id)) = (self.token.clone(), self.current_project) else {
            return None;
        };
        let result = self
            .client
            .build_share_project(id, public, &token)
            .and_then(|request| self.roundtrip(request))
            .and_then(|response| self.client.parse_share_project(response));
        match result {
            Ok(link) => Some(link),
            Err(e) => {
                self.fail(SHARE_FAILED, &e);
                None
            }
        }
    }

    pub fn unshare_current_project(&mut self) -> bool {
        let (Some(token), Some(id)) = (self.token.clone(), self.current_project) else {
            return false;
        };
        let request = self.client.build_unshare_project(id, &token);
        match self
            .roundtrip(request)
            .and_then(|response| self.client.parse_unshare_project(response))
        {
            Ok(()) => true,
            Err(e) => {
                self.fail(UNSHARE_FAILED, &e);
                false
            }
        }
    }

    /// Fetch the current project with its images. Failure is logged only.
    pub fn current_project_detail(&mut self) -> Option<ProjectDetail> {
        let (Some(token), Some(id)) = (self.token.clone(), self.current_project) else {
            return None;
        };
        let request = self.client.build_get_project(id, &token);
        match self
            .roundtrip(request)
            .and_then(|response| self.client.parse_get_project(response))
        {
            Ok(detail) => Some(detail),
            Err(e) => {
                error!(error = %e, project_id = id, "failed to fetch project");
                None
            }
        }
    }

    /// Read a shared project by its slug. No session is needed.
    pub fn fetch_shared_project(&mut self, slug: &str) -> Option<SharedProject> {
        let request = self.client.build_get_shared_project(slug);
        match self
            .roundtrip(request)
            .and_then(|response| self.client.parse_get_shared_project(response))
        {
            Ok(shared) => Some(shared),
            Err(e) => {
                warn!(error = %e, slug, "failed to fetch shared project");
                None
            }
        }
    }

    pub fn toggle_projects(&mut self) {
        self.show_projects = !self.show_projects;
    }

    // -- images -------------------------------------------------------------

    pub fn fetch_image(&mut self, id: i64) -> Option<ImageRecord> {
        let token = self.token.clone()?;
        let request = self.client.build_get_image(id, &token);
        match self
            .roundtrip(request)
            .and_then(|response| self.client.parse_get_image(response))
        {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, image_id = id, "failed to fetch image");
                None
            }
        }
    }

    pub fn delete_image(&mut self, id: i64) -> bool {
        let Some(token) = self.token.clone() else {
            return false;
        };
        self.busy = true;
        let request = self.client.build_delete_image(id, &token);
        let deleted = match self
            .roundtrip(request)
            .and_then(|response| self.client.parse_delete_image(response))
        {
            Ok(()) => {
                info!(image_id = id, "image deleted");
                true
            }
            Err(e) => {
                self.fail(DELETE_IMAGE_FAILED, &e);
                false
            }
        };
        self.busy = false;
        deleted
    }

    // -- catalog ------------------------------------------------------------

    /// Flip the wheel panel, loading the catalog on first open.
    pub fn toggle_wheels(&mut self) {
        if self.wheels.is_empty() {
            self.fetch_wheels(&WheelFilter::default());
        }
        self.show_wheels = !self.show_wheels;
    }

    pub fn fetch_wheels(&mut self, filter: &WheelFilter) {
        let request = self.client.build_list_wheels(filter);
        match self
            .roundtrip(request)
            .and_then(|response| self.client.parse_list_wheels(response))
        {
            Ok(wheels) => self.wheels = wheels,
            Err(e) => error!(error = %e, "failed to fetch wheels"),
        }
    }

    pub fn select_wheel(&mut self, id: i64) -> bool {
        match self.wheels.iter().find(|w| w.id == id) {
            Some(wheel) => {
                self.selected_wheel = Some(wheel.clone());
                true
            }
            None => false,
        }
    }

    /// Select a wheel by id, fetching it from the catalog if it is not loaded.
    pub fn load_wheel(&mut self, id: i64) -> bool {
        if self.select_wheel(id) {
            return true;
        }
        let request = self.client.build_get_wheel(id);
        match self
            .roundtrip(request)
            .and_then(|response| self.client.parse_get_wheel(response))
        {
            Ok(wheel) => {
                self.selected_wheel = Some(wheel.clone());
                self.wheels.push(wheel);
                true
            }
            Err(e) => {
                warn!(error = %e, wheel_id = id, "failed to fetch wheel");
                false
            }
        }
    }

    /// Replace the wheel list with the wheels that fit a vehicle spec and
    /// return the spec's summary.
    pub fn fetch_compatible_wheels(&mut self, vehicle_spec_id: i64) -> Option<FitmentSummary> {
        let request = self.client.build_compatible_wheels(vehicle_spec_id);
        match self
            .roundtrip(request)
            .and_then(|response| self.client.parse_compatible_wheels(response))
        {
            Ok(fitment) => {
                self.wheels = fitment.compatible_wheels;
                Some(fitment.vehicle_spec)
            }
            Err(e) => {
                error!(error = %e, vehicle_spec_id, "failed to fetch compatible wheels");
                None
            }
        }
    }

    pub fn fetch_vehicle_spec(&mut self, id: i64) -> Option<VehicleSpec> {
        let request = self.client.build_get_vehicle_spec(id);
        match self
            .roundtrip(request)
            .and_then(|response| self.client.parse_get_vehicle_spec(response))
        {
            Ok(spec) => Some(spec),
            Err(e) => {
                warn!(error = %e, vehicle_id = id, "failed to fetch vehicle spec");
                None
            }
        }
    }

    pub fn fetch_vehicle_specs(&mut self, filter: &VehicleFilter) {
        let request = self.client.build_list_vehicle_specs(filter);
        match self
            .roundtrip(request)
            .and_then(|response| self.client.parse_list_vehicle_specs(response))
        {
            Ok(specs) => self.vehicle_specs = specs,
            Err(e) => error!(error = %e, "failed to fetch vehicle specs"),
        }
    }

    // -- image pipeline -----------------------------------------------------

    /// Read a local photo and upload it into the current project.
    pub fn upload_image(&mut self, path: &Path) {
        self.busy = true;
        self.pipeline.image_path = None;
        self.pipeline.variant_path = None;
        self.pipeline.mask_path = None;
        self.pipeline.local_preview = Some(path.to_path_buf());
        let project_id = self.current_project;
        let token = self.token.clone();
        let result = ImageUpload::from_path(path).and_then(|upload| {
            let request = self
                .client
                .build_upload_image(&upload, project_id, token.as_deref());
            self.roundtrip(request)
                .and_then(|response| self.client.parse_upload_image(response))
        });
        match result {
            Ok(uploaded) => self.pipeline.image_path = Some(uploaded.image_path),
            Err(e) => self.fail(UPLOAD_FAILED, &e),
        }
        self.busy = false;
    }

    pub fn segment(&mut self) {
        let Some(image_path) = self.pipeline.image_path.clone() else {
            return;
        };
        self.busy = true;
        let token = self.token.clone();
        let result = self
            .client
            .build_segment(&image_path, token.as_deref())
            .and_then(|request| self.roundtrip(request))
            .and_then(|response| self.client.parse_segment(response));
        match result {
            Ok(mask) => self.pipeline.mask_path = Some(mask.mask_path),
            Err(e) => self.fail(SEGMENT_FAILED, &e),
        }
        self.busy = false;
    }

    pub fn set_adjustment(&mut self, dh: i32, ds: f64, dv: f64) {
        self.pipeline.adjust = HsvAdjust::clamped(dh, ds, dv);
    }

    pub fn recolor(&mut self) {
        let (Some(image_path), Some(mask_path)) = (
            self.pipeline.image_path.clone(),
            self.pipeline.mask_path.clone(),
        ) else {
            return;
        };
        self.busy = true;
        let HsvAdjust { dh, ds, dv } = self.pipeline.adjust;
        let input = RecolorRequest {
            image_path,
            mask_path,
            dh,
            ds,
            dv,
        };
        let token = self.token.clone();
        let result = self
            .client
            .build_recolor(&input, token.as_deref())
            .and_then(|request| self.roundtrip(request))
            .and_then(|response| self.client.parse_recolor(response));
        match result {
            Ok(variant) => self.pipeline.variant_path = Some(variant.image_path),
            Err(e) => self.fail(RECOLOR_FAILED, &e),
        }
        self.busy = false;
    }

    /// Composite the selected wheel onto the uploaded photo. `points` are the
    /// destination corners; `None` uses `PLACEHOLDER_QUAD`.
    pub fn overlay_wheel(&mut self, points: Option<[Point; 4]>) {
        let Some(image_path) = self.pipeline.image_path.clone() else {
            return;
        };
        let Some(wheel_path) = self
            .selected_wheel()
            .map(|w| w.thumb_url.clone().unwrap_or_default())
        else {
            return;
        };
        let Some(token) = self.token.clone() else {
            return;
        };
        self.busy = true;
        let quad = points.unwrap_or(PLACEHOLDER_QUAD);
        let result = self
            .client
            .build_overlay_wheel(&image_path, &wheel_path, quad, Some(&token))
            .and_then(|request| self.roundtrip(request))
            .and_then(|response| self.client.parse_overlay_wheel(response));
        match result {
            Ok(variant) => self.pipeline.variant_path = Some(variant.image_path),
            Err(e) => self.fail(OVERLAY_FAILED, &e),
        }
        self.busy = false;
    }

    /// Variant first, then the stored original, then the local file.
    pub fn display_image(&self) -> Option<DisplayImage> {
        if let Some(path) = &self.pipeline.variant_path {
            return Some(DisplayImage::Remote(self.client.media_url(path)));
        }
        if let Some(path) = &self.pipeline.image_path {
            return Some(DisplayImage::Remote(self.client.media_url(path)));
        }
        self.pipeline.local_preview.clone().map(DisplayImage::Local)
    }

    pub fn mask_url(&self) -> Option<String> {
        self.pipeline
            .mask_path
            .as_deref()
            .map(|path| self.client.media_url(path))
    }

    /// Ask the backend whether it is up.
    pub fn check_health(&mut self) -> Result<(), ApiError> {
        let request = self.client.build_health();
        let response = self.roundtrip(request)?;
        self.client.parse_health(response)
    }

    // -- plumbing -----------------------------------------------------------

    fn roundtrip(&mut self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, path = %request.path, "sending request");
        let response = self.transport.execute(request)?;
        debug!(status = response.status, "received response");
        Ok(response)
    }

    fn fail(&mut self, alert: &str, err: &ApiError) {
        error!(error = %err, "{alert}");
        self.alerts.push(alert.to_string());
    }
}
