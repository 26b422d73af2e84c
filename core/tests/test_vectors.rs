//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results or error statuses. Comparing parsed JSON (not
//! raw strings) avoids false negatives from field-ordering differences.

use carmod_core::{
    ApiError, CarmodClient, HttpMethod, HttpRequest, HttpResponse, MaskResult, Point, Project,
    RecolorRequest, VariantResult, VehicleFilter, VehicleSpec, Wheel, WheelFilter,
};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:8000";

fn client() -> CarmodClient {
    CarmodClient::new(BASE_URL)
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn simulated(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse::new(
        sim["status"].as_u64().unwrap() as u16,
        sim["body"].as_str().unwrap(),
    )
}

/// Compare method, path, and (when listed) headers and JSON body.
fn assert_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.path, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: path");

    let expected_headers: Vec<(String, String)> = expected["headers"]
        .as_array()
        .map(|headers| {
            headers
                .iter()
                .map(|h| {
                    let pair = h.as_array().unwrap();
                    (pair[0].as_str().unwrap().to_string(), pair[1].as_str().unwrap().to_string())
                })
                .collect()
        })
        .unwrap_or_default();
    assert_eq!(req.headers, expected_headers, "{name}: headers");

    match expected.get("body") {
        Some(body) => {
            let actual: Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&actual, body, "{name}: body");
        }
        None => assert!(req.body.is_none(), "{name}: body should be None"),
    }
}

/// Either the parse matched `expected_result`, or it failed with `expected_error`.
fn assert_outcome<T>(name: &str, case: &Value, result: Result<T, ApiError>)
where
    T: serde::de::DeserializeOwned + PartialEq + std::fmt::Debug,
{
    if let Some(status) = case.get("expected_error") {
        let err = result.unwrap_err();
        assert_eq!(err.status(), Some(status.as_u64().unwrap() as u16), "{name}: error status");
    } else {
        let expected: T = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(result.unwrap(), expected, "{name}: parsed result");
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[test]
fn project_test_vectors() {
    let raw = include_str!("../../test-vectors/projects.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let token = vectors["token"].as_str().unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        match case["operation"].as_str().unwrap() {
            "create" => {
                let title = case["input"]["title"].as_str().unwrap();
                let req = c.build_create_project(title, token).unwrap();
                assert_request(name, &req, &case["expected_request"]);
                assert_outcome::<Project>(name, case, c.parse_create_project(simulated(case)));
            }
            "list" => {
                let req = c.build_list_projects(token);
                assert_request(name, &req, &case["expected_request"]);
                assert_outcome::<Vec<Project>>(name, case, c.parse_list_projects(simulated(case)));
            }
            other => panic!("{name}: unknown operation {other}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Ops
// ---------------------------------------------------------------------------

#[test]
fn ops_test_vectors() {
    let raw = include_str!("../../test-vectors/ops.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let token = case["token"].as_str();
        let input = &case["input"];
        match case["operation"].as_str().unwrap() {
            "segment" => {
                let req = c.build_segment(input["image_path"].as_str().unwrap(), token).unwrap();
                assert_request(name, &req, &case["expected_request"]);
                assert_outcome::<MaskResult>(name, case, c.parse_segment(simulated(case)));
            }
            "recolor" => {
                let input: RecolorRequest = serde_json::from_value(input.clone()).unwrap();
                let req = c.build_recolor(&input, token).unwrap();
                assert_request(name, &req, &case["expected_request"]);
                assert_outcome::<VariantResult>(name, case, c.parse_recolor(simulated(case)));
            }
            "overlay" => {
                let pts: Vec<Point> = serde_json::from_value(input["dst_pts"].clone()).unwrap();
                let quad: [Point; 4] = pts.try_into().unwrap();
                let req = c
                    .build_overlay_wheel(
                        input["base_image_path"].as_str().unwrap(),
                        input["wheel_image_path"].as_str().unwrap(),
                        quad,
                        token,
                    )
                    .unwrap();
                assert_request(name, &req, &case["expected_request"]);
                assert_outcome::<VariantResult>(name, case, c.parse_overlay_wheel(simulated(case)));
            }
            other => panic!("{name}: unknown operation {other}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[test]
fn catalog_test_vectors() {
    let raw = include_str!("../../test-vectors/catalog.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = &case["input"];
        match case["operation"].as_str().unwrap() {
            "wheels" => {
                let filter = WheelFilter {
                    brand: input["brand"].as_str().map(str::to_string),
                };
                let req = c.build_list_wheels(&filter);
                assert_request(name, &req, &case["expected_request"]);
                assert_outcome::<Vec<Wheel>>(name, case, c.parse_list_wheels(simulated(case)));
            }
            "vehicles" => {
                let filter = VehicleFilter {
                    make: input["make"].as_str().map(str::to_string),
                    model: input["model"].as_str().map(str::to_string),
                    year: input["year"].as_i64().map(|y| y as i32),
                };
                let req = c.build_list_vehicle_specs(&filter);
                assert_request(name, &req, &case["expected_request"]);
                assert_outcome::<Vec<VehicleSpec>>(
                    name,
                    case,
                    c.parse_list_vehicle_specs(simulated(case)),
                );
            }
            other => panic!("{name}: unknown operation {other}"),
        }
    }
}
