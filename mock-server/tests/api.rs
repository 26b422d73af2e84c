use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, Project, ProjectDetail, User, VehicleSpec, Wheel};
use tower::{Service, ServiceExt};

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body.to_string()).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<String> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(String::new()).unwrap()
}

fn upload_request(content_type: &str, project_id: Option<i64>, token: Option<&str>) -> Request<String> {
    upload_named("car.png", content_type, project_id, token)
}

fn upload_named(
    file_name: &str,
    content_type: &str,
    project_id: Option<i64>,
    token: Option<&str>,
) -> Request<String> {
    let mut body = format!(
        "--B\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
         Content-Type: {content_type}\r\n\r\nPNG\r\n"
    );
    if let Some(id) = project_id {
        body.push_str(&format!(
            "--B\r\nContent-Disposition: form-data; name=\"project_id\"\r\n\r\n{id}\r\n"
        ));
    }
    body.push_str("--B--\r\n");
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/images")
        .header(http::header::CONTENT_TYPE, "multipart/form-data; boundary=B");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body).unwrap()
}

async fn send(app: &mut axum::routing::RouterIntoService<String>, req: Request<String>) -> axum::response::Response {
    ServiceExt::ready(app).await.unwrap().call(req).await.unwrap()
}

async fn signed_up(app: &mut axum::routing::RouterIntoService<String>, email: &str) -> String {
    let resp = send(
        app,
        json_request(
            "POST",
            "/api/v1/auth/signup",
            None,
            &format!(r#"{{"email":"{email}","password":"secret"}}"#),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    body["access_token"].as_str().unwrap().to_string()
}

fn service() -> axum::routing::RouterIntoService<String> {
    let router: Router = app();
    router.into_service()
}

// --- health ---

#[tokio::test]
async fn health_is_ok() {
    let resp = app().oneshot(get_request("/health", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["status"], "ok");
}

// --- auth ---

#[tokio::test]
async fn me_without_token_is_401() {
    let resp = app().oneshot(get_request("/api/v1/auth/me", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_then_login_with_form() {
    let mut app = service();
    let token = signed_up(&mut app, "driver@example.com").await;

    let resp = send(&mut app, get_request("/api/v1/auth/me", Some(&token))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let user: User = body_json(resp).await;
    assert_eq!(user.email, "driver@example.com");

    let login = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body("username=driver%40example.com&password=secret".to_string())
        .unwrap();
    let resp = send(&mut app, login).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["token_type"], "bearer");
}

#[tokio::test]
async fn login_wrong_password_is_401() {
    let mut app = service();
    signed_up(&mut app, "driver@example.com").await;
    let login = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body("username=driver%40example.com&password=wrong".to_string())
        .unwrap();
    let resp = send(&mut app, login).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_signup_is_400() {
    let mut app = service();
    signed_up(&mut app, "driver@example.com").await;
    let resp = send(
        &mut app,
        json_request(
            "POST",
            "/api/v1/auth/signup",
            None,
            r#"{"email":"driver@example.com","password":"x"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- projects ---

#[tokio::test]
async fn projects_are_scoped_to_their_owner() {
    let mut app = service();
    let alice = signed_up(&mut app, "alice@example.com").await;
    let bob = signed_up(&mut app, "bob@example.com").await;

    let resp = send(
        &mut app,
        json_request("POST", "/api/v1/projects", Some(&alice), r#"{"title":"Golf"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let project: Project = body_json(resp).await;
    assert_eq!(project.title, "Golf");
    assert_eq!(project.image_count, 0);

    let resp = send(&mut app, get_request("/api/v1/projects", Some(&bob))).await;
    let projects: Vec<Project> = body_json(resp).await;
    assert!(projects.is_empty());

    let uri = format!("/api/v1/projects/{}", project.id);
    let resp = send(&mut app, get_request(&uri, Some(&bob))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(&mut app, get_request(&uri, Some(&alice))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let detail: ProjectDetail = body_json(resp).await;
    assert!(detail.images.is_empty());
}

#[tokio::test]
async fn create_project_without_token_is_401() {
    let resp = app()
        .oneshot(json_request("POST", "/api/v1/projects", None, r#"{"title":"x"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rename_and_delete_project() {
    let mut app = service();
    let token = signed_up(&mut app, "alice@example.com").await;
    let resp = send(
        &mut app,
        json_request("POST", "/api/v1/projects", Some(&token), r#"{"title":"Golf"}"#),
    )
    .await;
    let project: Project = body_json(resp).await;
    let uri = format!("/api/v1/projects/{}", project.id);

    let resp = send(&mut app, json_request("PUT", &uri, Some(&token), r#"{"title":"GTI"}"#)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let renamed: Project = body_json(resp).await;
    assert_eq!(renamed.title, "GTI");

    let delete = Request::builder()
        .method("DELETE")
        .uri(&uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .body(String::new())
        .unwrap();
    let resp = send(&mut app, delete).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&mut app, get_request(&uri, Some(&token))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- images and ops ---

#[tokio::test]
async fn upload_rejects_non_images() {
    let resp = app()
        .oneshot(upload_request("text/plain", None, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_keeps_image_extensions_only() {
    let mut app = service();
    for (name, expected) in [("scan.TIF", ".tif"), ("car.webp", ".webp"), ("car.exe", ".png"), ("car", ".png")] {
        let resp = send(&mut app, upload_named(name, "image/png", None, None)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let upload: serde_json::Value = body_json(resp).await;
        let path = upload["image_path"].as_str().unwrap();
        assert!(path.ends_with(expected), "{name} stored as {path}");
    }
}

#[tokio::test]
async fn image_records_are_owner_scoped_and_deletable() {
    let mut app = service();
    let alice = signed_up(&mut app, "alice@example.com").await;
    let bob = signed_up(&mut app, "bob@example.com").await;
    let resp = send(
        &mut app,
        json_request("POST", "/api/v1/projects", Some(&alice), r#"{"title":"Golf"}"#),
    )
    .await;
    let project: Project = body_json(resp).await;
    let resp = send(&mut app, upload_request("image/png", Some(project.id), Some(&alice))).await;
    let upload: serde_json::Value = body_json(resp).await;
    let image_id = upload["image_id"].as_i64().unwrap();
    let uri = format!("/api/v1/images/{image_id}");

    let resp = send(&mut app, get_request(&uri, None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let resp = send(&mut app, get_request(&uri, Some(&bob))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(&mut app, get_request(&uri, Some(&alice))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let record: serde_json::Value = body_json(resp).await;
    assert_eq!(record["project_id"], project.id);
    assert_eq!(record["url"], upload["image_path"]);

    let resp = send(&mut app, json_request("DELETE", &uri, Some(&alice), "")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = send(&mut app, get_request(&uri, Some(&alice))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(
        &mut app,
        get_request(&format!("/api/v1/projects/{}", project.id), Some(&alice)),
    )
    .await;
    let detail: ProjectDetail = body_json(resp).await;
    assert!(detail.images.is_empty());
}

#[tokio::test]
async fn upload_into_foreign_project_is_404() {
    let mut app = service();
    let alice = signed_up(&mut app, "alice@example.com").await;
    let bob = signed_up(&mut app, "bob@example.com").await;
    let resp = send(
        &mut app,
        json_request("POST", "/api/v1/projects", Some(&alice), r#"{"title":"Golf"}"#),
    )
    .await;
    let project: Project = body_json(resp).await;

    let resp = send(&mut app, upload_request("image/png", Some(project.id), Some(&bob))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pipeline_upload_segment_recolor_overlay() {
    let mut app = service();
    let token = signed_up(&mut app, "alice@example.com").await;
    let resp = send(
        &mut app,
        json_request("POST", "/api/v1/projects", Some(&token), r#"{"title":"Golf"}"#),
    )
    .await;
    let project: Project = body_json(resp).await;

    // upload into the project
    let resp = send(&mut app, upload_request("image/png", Some(project.id), Some(&token))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let upload: serde_json::Value = body_json(resp).await;
    let image_path = upload["image_path"].as_str().unwrap().to_string();
    assert!(image_path.starts_with("media/images/"));
    assert!(image_path.ends_with(".png"));
    assert_eq!(upload["project_id"], project.id);

    let resp = send(&mut app, get_request("/api/v1/projects", Some(&token))).await;
    let projects: Vec<Project> = body_json(resp).await;
    assert_eq!(projects[0].image_count, 1);

    // segment
    let resp = send(
        &mut app,
        json_request(
            "POST",
            "/api/v1/ops/segment",
            None,
            &format!(r#"{{"image_path":"{image_path}"}}"#),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let mask: serde_json::Value = body_json(resp).await;
    let mask_path = mask["mask_path"].as_str().unwrap().to_string();
    assert!(mask_path.starts_with("media/masks/"));

    // recolor
    let resp = send(
        &mut app,
        json_request(
            "POST",
            "/api/v1/ops/recolor",
            None,
            &format!(
                r#"{{"image_path":"{image_path}","mask_path":"{mask_path}","dh":30,"ds":0.1,"dv":0}}"#
            ),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let variant: serde_json::Value = body_json(resp).await;
    assert!(variant["image_path"].as_str().unwrap().starts_with("media/variants/"));

    // overlay a seeded wheel
    let resp = send(
        &mut app,
        json_request(
            "POST",
            "/api/v1/ops/overlay/wheel",
            Some(&token),
            &format!(
                r#"{{"base_image_path":"{image_path}","wheel_image_path":"media/wheels/bbs-chr.png",
                    "dst_pts":[{{"x":100,"y":100}},{{"x":200,"y":100}},{{"x":200,"y":200}},{{"x":100,"y":200}}]}}"#
            ),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn segment_unknown_image_is_400() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/v1/ops/segment",
            None,
            r#"{"image_path":"media/images/missing.png"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn overlay_needs_exactly_four_points() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/api/v1/ops/overlay/wheel",
            None,
            r#"{"base_image_path":"a","wheel_image_path":"b","dst_pts":[{"x":1,"y":1}]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- catalog ---

#[tokio::test]
async fn wheels_filter_by_brand_case_insensitively() {
    let resp = app()
        .oneshot(get_request("/api/v1/catalog/wheels?brand=oz", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let wheels: Vec<Wheel> = body_json(resp).await;
    assert_eq!(wheels.len(), 1);
    assert_eq!(wheels[0].brand, "OZ Racing");

    let resp = app().oneshot(get_request("/api/v1/catalog/wheels", None)).await.unwrap();
    let wheels: Vec<Wheel> = body_json(resp).await;
    assert_eq!(wheels.len(), 3);
}

#[tokio::test]
async fn vehicles_filter_by_make_and_year() {
    let resp = app()
        .oneshot(get_request("/api/v1/catalog/vehicles?make=bmw&year=2019", None))
        .await
        .unwrap();
    let specs: Vec<VehicleSpec> = body_json(resp).await;
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].model, "3 Series");

    let resp = app()
        .oneshot(get_request("/api/v1/catalog/vehicles?make=bmw&year=2020", None))
        .await
        .unwrap();
    let specs: Vec<VehicleSpec> = body_json(resp).await;
    assert!(specs.is_empty());
}

#[tokio::test]
async fn compatible_wheels_for_a_vehicle() {
    let mut app = service();
    let resp = send(
        &mut app,
        get_request("/api/v1/catalog/wheels/compatible?vehicle_spec_id=2", None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["vehicle_spec"]["make"], "BMW");
    assert_eq!(body["vehicle_spec"]["rim_diameter"], 18.0);
    let wheels: Vec<Wheel> = serde_json::from_value(body["compatible_wheels"].clone()).unwrap();
    assert_eq!(wheels.len(), 3);

    let resp = send(
        &mut app,
        get_request("/api/v1/catalog/wheels/compatible?vehicle_spec_id=99", None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_wheel_is_404() {
    let resp = app()
        .oneshot(get_request("/api/v1/catalog/wheels/99", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- sharing ---

#[tokio::test]
async fn share_and_unshare_project() {
    let mut app = service();
    let token = signed_up(&mut app, "alice@example.com").await;
    let resp = send(
        &mut app,
        json_request("POST", "/api/v1/projects", Some(&token), r#"{"title":"Golf"}"#),
    )
    .await;
    let project: Project = body_json(resp).await;

    let resp = send(
        &mut app,
        json_request(
            "POST",
            "/api/v1/share/projects",
            Some(&token),
            &format!(r#"{{"project_id":{}}}"#, project.id),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let link: serde_json::Value = body_json(resp).await;
    let slug = link["slug"].as_str().unwrap().to_string();
    assert!(link["public_url"].as_str().unwrap().ends_with(&slug));

    let shared_uri = format!("/api/v1/share/{slug}");
    let resp = send(&mut app, get_request(&shared_uri, None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let shared: serde_json::Value = body_json(resp).await;
    assert_eq!(shared["title"], "Golf");
    assert_eq!(shared["images"], serde_json::json!([]));

    let resp = send(
        &mut app,
        json_request(
            "POST",
            "/api/v1/share/projects",
            Some(&token),
            &format!(r#"{{"project_id":{},"public":false}}"#, project.id),
        ),
    )
    .await;
    let private: serde_json::Value = body_json(resp).await;
    let resp = send(
        &mut app,
        get_request(&format!("/api/v1/share/{}", private["slug"].as_str().unwrap()), None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let unshare = Request::builder()
        .method("DELETE")
        .uri(format!("/api/v1/share/projects/{}", project.id))
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .body(String::new())
        .unwrap();
    let resp = send(&mut app, unshare).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&mut app, get_request(&shared_uri, None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
