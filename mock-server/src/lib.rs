//! In-memory stand-in for the carmod backend.
//!
//! Implements the REST contract the client speaks: bearer-token auth,
//! per-user projects, multipart image upload, the image ops, the wheel and
//! vehicle catalog, and project sharing. The ops do no image work; they only
//! check that the referenced media exists and hand back fresh paths.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{delete, get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub created_at: String,
    pub image_count: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectImage {
    pub id: i64,
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectDetail {
    pub id: i64,
    pub title: String,
    pub created_at: String,
    pub images: Vec<ProjectImage>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Wheel {
    pub id: i64,
    pub brand: String,
    pub model: String,
    pub thumb_url: Option<String>,
    pub meta_json: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct VehicleSpec {
    pub id: i64,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub trim: Option<String>,
    pub bolt_pattern: Option<String>,
    pub rim_diameter: Option<f64>,
    pub rim_width: Option<f64>,
    pub offset: Option<f64>,
    pub center_bore: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ProjectInput {
    pub title: String,
}

#[derive(Deserialize)]
pub struct SegmentInput {
    pub image_path: String,
}

#[derive(Deserialize)]
pub struct RecolorInput {
    pub image_path: String,
    pub mask_path: String,
    #[serde(default)]
    pub dh: i32,
    #[serde(default)]
    pub ds: f64,
    #[serde(default)]
    pub dv: f64,
}

#[derive(Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Deserialize)]
pub struct OverlayInput {
    pub base_image_path: String,
    pub wheel_image_path: String,
    pub dst_pts: Vec<Point>,
}

#[derive(Deserialize)]
pub struct ShareInput {
    pub project_id: i64,
    #[serde(default = "default_public")]
    pub public: bool,
}

fn default_public() -> bool {
    true
}

#[derive(Deserialize)]
pub struct WheelQuery {
    pub brand: Option<String>,
}

#[derive(Deserialize)]
pub struct CompatibleQuery {
    pub vehicle_spec_id: i64,
}

#[derive(Deserialize)]
pub struct VehicleQuery {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
}

struct Account {
    user: User,
    password: String,
}

struct ProjectRecord {
    owner: i64,
    title: String,
    created_at: String,
    images: Vec<ProjectImage>,
}

impl ProjectRecord {
    fn summary(&self, id: i64) -> Project {
        Project {
            id,
            title: self.title.clone(),
            created_at: self.created_at.clone(),
            image_count: self.images.len() as u32,
        }
    }
}

/// Everything the mock backend remembers.
pub struct Backend {
    accounts: Vec<Account>,
    tokens: HashMap<String, i64>,
    projects: BTreeMap<i64, ProjectRecord>,
    media: HashSet<String>,
    wheels: Vec<Wheel>,
    vehicles: Vec<VehicleSpec>,
    shares: HashMap<String, i64>,
    next_id: i64,
}

impl Default for Backend {
    fn default() -> Self {
        let wheels = seed_wheels();
        let media = wheels.iter().filter_map(|w| w.thumb_url.clone()).collect();
        Self {
            accounts: Vec::new(),
            tokens: HashMap::new(),
            projects: BTreeMap::new(),
            media,
            wheels,
            vehicles: seed_vehicles(),
            shares: HashMap::new(),
            next_id: 1,
        }
    }
}

impl Backend {
    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn issue_token(&mut self, user_id: i64) -> AccessToken {
        let token = format!("token-{}", Uuid::new_v4().simple());
        self.tokens.insert(token.clone(), user_id);
        AccessToken {
            access_token: token,
            token_type: "bearer".to_string(),
        }
    }

    fn user_for(&self, headers: &HeaderMap) -> Option<&User> {
        let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        let token = value.strip_prefix("Bearer ")?;
        let id = self.tokens.get(token)?;
        self.accounts.iter().map(|a| &a.user).find(|u| u.id == *id)
    }

    fn owned_project(&self, project_id: i64, user_id: i64) -> Result<&ProjectRecord, StatusCode> {
        self.projects
            .get(&project_id)
            .filter(|p| p.owner == user_id)
            .ok_or(StatusCode::NOT_FOUND)
    }

    /// The project holding `image_id`, if the user owns it.
    fn owned_image(&self, image_id: i64, user_id: i64) -> Result<(i64, &ProjectImage), StatusCode> {
        self.projects
            .iter()
            .filter(|(_, p)| p.owner == user_id)
            .find_map(|(id, p)| p.images.iter().find(|i| i.id == image_id).map(|i| (*id, i)))
            .ok_or(StatusCode::NOT_FOUND)
    }

    fn store_media(&mut self, subdir: &str, ext: &str) -> String {
        let path = format!("media/{subdir}/{}{ext}", Uuid::new_v4());
        self.media.insert(path.clone());
        path
    }
}

pub type Db = Arc<RwLock<Backend>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Backend::default()));
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/auth/signup", post(signup))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/me", get(me))
        .route("/api/v1/projects", get(list_projects).post(create_project))
        .route(
            "/api/v1/projects/{id}",
            get(get_project).put(rename_project).delete(delete_project),
        )
        .route("/api/v1/images", post(upload_image))
        .route("/api/v1/images/{id}", get(get_image).delete(delete_image))
        .route("/api/v1/ops/segment", post(segment))
        .route("/api/v1/ops/recolor", post(recolor))
        .route("/api/v1/ops/overlay/wheel", post(overlay_wheel))
        .route("/api/v1/catalog/wheels", get(list_wheels))
        .route("/api/v1/catalog/wheels/compatible", get(compatible_wheels))
        .route("/api/v1/catalog/wheels/{id}", get(get_wheel))
        .route("/api/v1/catalog/vehicles", get(list_vehicles))
        .route("/api/v1/catalog/vehicles/{id}", get(get_vehicle))
        .route("/api/v1/share/projects", post(share_project))
        .route("/api/v1/share/projects/{id}", delete(unshare_project))
        .route("/api/v1/share/{slug}", get(shared_project))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock backend listening");
    }
    axum::serve(listener, app()).await
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// --- auth ---

async fn signup(
    State(db): State<Db>,
    Json(input): Json<Credentials>,
) -> Result<Json<AccessToken>, StatusCode> {
    let mut db = db.write().await;
    if input.email.is_empty() || db.accounts.iter().any(|a| a.user.email == input.email) {
        return Err(StatusCode::BAD_REQUEST);
    }
    let id = db.allocate_id();
    db.accounts.push(Account {
        user: User {
            id,
            email: input.email,
        },
        password: input.password,
    });
    debug!(user_id = id, "signed up");
    Ok(Json(db.issue_token(id)))
}

async fn login(
    State(db): State<Db>,
    Form(input): Form<LoginForm>,
) -> Result<Json<AccessToken>, StatusCode> {
    let mut db = db.write().await;
    let id = db
        .accounts
        .iter()
        .find(|a| a.user.email == input.username && a.password == input.password)
        .map(|a| a.user.id)
        .ok_or(StatusCode::UNAUTHORIZED)?;
    Ok(Json(db.issue_token(id)))
}

async fn me(State(db): State<Db>, headers: HeaderMap) -> Result<Json<User>, StatusCode> {
    let db = db.read().await;
    db.user_for(&headers).cloned().map(Json).ok_or(StatusCode::UNAUTHORIZED)
}

// --- projects ---

async fn create_project(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<ProjectInput>,
) -> Result<Json<Project>, StatusCode> {
    let mut db = db.write().await;
    let owner = db.user_for(&headers).ok_or(StatusCode::UNAUTHORIZED)?.id;
    let id = db.allocate_id();
    let record = ProjectRecord {
        owner,
        title: input.title,
        created_at: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
        images: Vec::new(),
    };
    let summary = record.summary(id);
    db.projects.insert(id, record);
    Ok(Json(summary))
}

async fn list_projects(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Vec<Project>>, StatusCode> {
    let db = db.read().await;
    let owner = db.user_for(&headers).ok_or(StatusCode::UNAUTHORIZED)?.id;
    Ok(Json(
        db.projects
            .iter()
            .filter(|(_, p)| p.owner == owner)
            .map(|(id, p)| p.summary(*id))
            .collect(),
    ))
}

async fn get_project(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ProjectDetail>, StatusCode> {
    let db = db.read().await;
    let owner = db.user_for(&headers).ok_or(StatusCode::UNAUTHORIZED)?.id;
    let project = db.owned_project(id, owner)?;
    Ok(Json(ProjectDetail {
        id,
        title: project.title.clone(),
        created_at: project.created_at.clone(),
        images: project.images.clone(),
    }))
}

async fn rename_project(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<ProjectInput>,
) -> Result<Json<Project>, StatusCode> {
    let mut db = db.write().await;
    let owner = db.user_for(&headers).ok_or(StatusCode::UNAUTHORIZED)?.id;
    db.owned_project(id, owner)?;
    let project = db.projects.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    project.title = input.title;
    Ok(Json(project.summary(id)))
}

async fn delete_project(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let mut db = db.write().await;
    let owner = db.user_for(&headers).ok_or(StatusCode::UNAUTHORIZED)?.id;
    db.owned_project(id, owner)?;
    db.projects.remove(&id);
    Ok(Json(serde_json::json!({ "message": "Project deleted successfully" })))
}

// --- images ---

#[derive(Serialize)]
struct UploadReply {
    image_path: String,
    meta: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<i64>,
}

async fn upload_image(
    State(db): State<Db>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadReply>, StatusCode> {
    let mut file: Option<(String, usize)> = None;
    let mut project_id: Option<i64> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let is_image = field
                    .content_type()
                    .is_some_and(|ct| ct.starts_with("image/"));
                if !is_image {
                    return Err(StatusCode::BAD_REQUEST);
                }
                // Keep the client's extension only when it names an image type.
                let ext = field
                    .file_name()
                    .filter(|name| {
                        mime_guess::from_path(name)
                            .first()
                            .is_some_and(|mime| mime.type_() == mime_guess::mime::IMAGE)
                    })
                    .and_then(|name| name.rsplit_once('.'))
                    .map(|(_, ext)| ext.to_ascii_lowercase())
                    .unwrap_or_else(|| "png".to_string());
                let bytes = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                file = Some((format!(".{ext}"), bytes.len()));
            }
            "project_id" => {
                let text = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                let id = text
                    .trim()
                    .parse()
                    .map_err(|_| StatusCode::UNPROCESSABLE_ENTITY)?;
                project_id = Some(id);
            }
            _ => {}
        }
    }
    let (ext, size) = file.ok_or(StatusCode::UNPROCESSABLE_ENTITY)?;

    let mut db = db.write().await;
    if let Some(project_id) = project_id {
        let owner = db.user_for(&headers).ok_or(StatusCode::UNAUTHORIZED)?.id;
        db.owned_project(project_id, owner)?;
    }
    let image_path = db.store_media("images", &ext);
    debug!(%image_path, size, "stored upload");
    let mut reply = UploadReply {
        image_path: image_path.clone(),
        meta: serde_json::json!({}),
        image_id: None,
        project_id: None,
    };
    if let Some(project_id) = project_id {
        let image_id = db.allocate_id();
        if let Some(project) = db.projects.get_mut(&project_id) {
            project.images.push(ProjectImage {
                id: image_id,
                url: image_path,
                width: None,
                height: None,
            });
        }
        reply.image_id = Some(image_id);
        reply.project_id = Some(project_id);
    }
    Ok(Json(reply))
}

#[derive(Serialize)]
struct ImageRecord {
    id: i64,
    url: String,
    width: Option<u32>,
    height: Option<u32>,
    project_id: i64,
}

async fn get_image(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ImageRecord>, StatusCode> {
    let db = db.read().await;
    let owner = db.user_for(&headers).ok_or(StatusCode::UNAUTHORIZED)?.id;
    let (project_id, image) = db.owned_image(id, owner)?;
    Ok(Json(ImageRecord {
        id,
        url: image.url.clone(),
        width: image.width,
        height: image.height,
        project_id,
    }))
}

async fn delete_image(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let mut db = db.write().await;
    let owner = db.user_for(&headers).ok_or(StatusCode::UNAUTHORIZED)?.id;
    let (project_id, _) = db.owned_image(id, owner)?;
    if let Some(project) = db.projects.get_mut(&project_id) {
        project.images.retain(|i| i.id != id);
    }
    debug!(image_id = id, project_id, "deleted image");
    Ok(Json(serde_json::json!({ "message": "Image deleted successfully" })))
}

// --- ops ---

async fn segment(
    State(db): State<Db>,
    Json(input): Json<SegmentInput>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let mut db = db.write().await;
    if !db.media.contains(&input.image_path) {
        return Err(StatusCode::BAD_REQUEST);
    }
    let mask_path = db.store_media("masks", ".png");
    Ok(Json(serde_json::json!({ "mask_path": mask_path })))
}

async fn recolor(
    State(db): State<Db>,
    Json(input): Json<RecolorInput>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let mut db = db.write().await;
    if !db.media.contains(&input.image_path) || !db.media.contains(&input.mask_path) {
        return Err(StatusCode::BAD_REQUEST);
    }
    debug!(dh = input.dh, ds = input.ds, dv = input.dv, "recolor");
    let image_path = db.store_media("variants", ".png");
    Ok(Json(serde_json::json!({ "image_path": image_path })))
}

async fn overlay_wheel(
    State(db): State<Db>,
    Json(input): Json<OverlayInput>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let finite = input.dst_pts.iter().all(|p| p.x.is_finite() && p.y.is_finite());
    if input.dst_pts.len() != 4 || !finite {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let mut db = db.write().await;
    if !db.media.contains(&input.base_image_path) || !db.media.contains(&input.wheel_image_path) {
        return Err(StatusCode::BAD_REQUEST);
    }
    let image_path = db.store_media("variants", ".png");
    Ok(Json(serde_json::json!({ "image_path": image_path })))
}

// --- catalog ---

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

async fn list_wheels(State(db): State<Db>, Query(query): Query<WheelQuery>) -> Json<Vec<Wheel>> {
    let db = db.read().await;
    Json(
        db.wheels
            .iter()
            .filter(|w| {
                query
                    .brand
                    .as_deref()
                    .map_or(true, |brand| contains_ignore_case(&w.brand, brand))
            })
            .cloned()
            .collect(),
    )
}

async fn get_wheel(State(db): State<Db>, Path(id): Path<i64>) -> Result<Json<Wheel>, StatusCode> {
    let db = db.read().await;
    db.wheels
        .iter()
        .find(|w| w.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Every wheel fits a spec that has a rim diameter; none fit one without.
async fn compatible_wheels(
    State(db): State<Db>,
    Query(query): Query<CompatibleQuery>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let db = db.read().await;
    let spec = db
        .vehicles
        .iter()
        .find(|v| v.id == query.vehicle_spec_id)
        .ok_or(StatusCode::NOT_FOUND)?;
    let wheels: &[Wheel] = if spec.rim_diameter.is_some() {
        &db.wheels
    } else {
        &[]
    };
    Ok(Json(serde_json::json!({
        "vehicle_spec": {
            "make": spec.make,
            "model": spec.model,
            "year": spec.year,
            "rim_diameter": spec.rim_diameter,
        },
        "compatible_wheels": wheels,
    })))
}

async fn list_vehicles(
    State(db): State<Db>,
    Query(query): Query<VehicleQuery>,
) -> Json<Vec<VehicleSpec>> {
    let db = db.read().await;
    Json(
        db.vehicles
            .iter()
            .filter(|v| {
                query
                    .make
                    .as_deref()
                    .map_or(true, |make| contains_ignore_case(&v.make, make))
                    && query
                        .model
                        .as_deref()
                        .map_or(true, |model| contains_ignore_case(&v.model, model))
                    && query.year.map_or(true, |year| v.year == year)
            })
            .cloned()
            .collect(),
    )
}

async fn get_vehicle(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<VehicleSpec>, StatusCode> {
    let db = db.read().await;
    db.vehicles
        .iter()
        .find(|v| v.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

// --- sharing ---

async fn share_project(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<ShareInput>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let mut db = db.write().await;
    let owner = db.user_for(&headers).ok_or(StatusCode::UNAUTHORIZED)?.id;
    db.owned_project(input.project_id, owner)?;
    let slug = Uuid::new_v4().simple().to_string();
    if input.public {
        db.shares.insert(slug.clone(), input.project_id);
    }
    Ok(Json(serde_json::json!({
        "slug": slug,
        "public_url": format!("http://localhost:3000/share/{slug}"),
    })))
}

async fn unshare_project(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let mut db = db.write().await;
    let owner = db.user_for(&headers).ok_or(StatusCode::UNAUTHORIZED)?.id;
    db.owned_project(id, owner)?;
    db.shares.retain(|_, project| *project != id);
    Ok(Json(serde_json::json!({ "message": "Project unshared successfully" })))
}

/// Public view of a shared project. Slugs from private shares are never
/// stored, so they read as unknown.
async fn shared_project(
    State(db): State<Db>,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let db = db.read().await;
    let project_id = db.shares.get(&slug).ok_or(StatusCode::NOT_FOUND)?;
    let project = db.projects.get(project_id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(serde_json::json!({
        "title": project.title,
        "images": project.images,
        "variants": [],
    })))
}

// --- seed data ---

fn seed_wheels() -> Vec<Wheel> {
    let wheel = |id, brand: &str, model: &str, thumb: Option<&str>| Wheel {
        id,
        brand: brand.to_string(),
        model: model.to_string(),
        thumb_url: thumb.map(str::to_string),
        meta_json: None,
    };
    vec![
        wheel(1, "BBS", "CH-R", Some("media/wheels/bbs-chr.png")),
        wheel(2, "OZ Racing", "Superturismo", Some("media/wheels/oz-superturismo.png")),
        wheel(3, "Enkei", "RPF1", None),
    ]
}

fn seed_vehicles() -> Vec<VehicleSpec> {
    let spec = |id, make: &str, model: &str, year, bolt: &str, diameter| VehicleSpec {
        id,
        make: make.to_string(),
        model: model.to_string(),
        year,
        trim: None,
        bolt_pattern: Some(bolt.to_string()),
        rim_diameter: Some(diameter),
        rim_width: None,
        offset: None,
        center_bore: None,
    };
    vec![
        spec(1, "Volkswagen", "Golf", 2020, "5x112", 17.0),
        spec(2, "BMW", "3 Series", 2019, "5x112", 18.0),
        spec(3, "Toyota", "Corolla", 2021, "5x114.3", 16.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recolor_input_defaults_deltas() {
        let input: RecolorInput =
            serde_json::from_str(r#"{"image_path":"a","mask_path":"b"}"#).unwrap();
        assert_eq!(input.dh, 0);
        assert_eq!(input.ds, 0.0);
        assert_eq!(input.dv, 0.0);
    }

    #[test]
    fn share_input_defaults_public() {
        let input: ShareInput = serde_json::from_str(r#"{"project_id":4}"#).unwrap();
        assert!(input.public);
    }

    #[test]
    fn seeded_thumbs_count_as_media() {
        let backend = Backend::default();
        assert!(backend.media.contains("media/wheels/bbs-chr.png"));
        assert_eq!(backend.wheels.len(), 3);
    }

    #[test]
    fn tokens_resolve_to_their_user() {
        let mut backend = Backend::default();
        backend.accounts.push(Account {
            user: User {
                id: 7,
                email: "a@b.c".to_string(),
            },
            password: "pw".to_string(),
        });
        let token = backend.issue_token(7);
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {}", token.access_token).parse().unwrap(),
        );
        assert_eq!(backend.user_for(&headers).map(|u| u.id), Some(7));

        headers.insert(header::AUTHORIZATION, "Bearer nope".parse().unwrap());
        assert!(backend.user_for(&headers).is_none());
    }
}
