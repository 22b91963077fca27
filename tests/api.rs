use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use clap::Parser;
use http_body_util::BodyExt;
use image::{Rgb, RgbImage};
use ndarray::{Array3, Array4};
use serde_json::{json, Value};
use tower::ServiceExt;

use melanox::model::{ModelInfo, Probabilities};
use melanox::service::encode_data_url;
use melanox::{build_router, AnalysisService, Classifier, Config};

/// Fixed-output classifier standing in for the ONNX session.
struct StubClassifier;

impl Classifier for StubClassifier {
    fn predict(&self, _input: &Array4<f32>) -> anyhow::Result<Probabilities> {
        Ok(Probabilities {
            benign: 0.12,
            malignant: 0.88,
        })
    }

    fn activation_map(&self, _input: &Array4<f32>) -> anyhow::Result<Option<Array3<f32>>> {
        Ok(Some(Array3::from_elem((3, 7, 7), 0.25)))
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            input_shape: vec![-1, 224, 224, 3],
            output_shape: vec![-1, 1],
            total_params: Some(4_049_571),
            model_path: "models/melanoma.onnx".to_string(),
        }
    }
}

fn test_router(max_image_bytes: Option<usize>) -> Router {
    let mut config = Config::parse_from(["melanox"]);
    if let Some(max) = max_image_bytes {
        config.max_image_bytes = max;
    }
    let service = Arc::new(AnalysisService::new(&config, Arc::new(StubClassifier)));
    build_router(&config, service)
}

fn lesion_data_url() -> String {
    let mut img = RgbImage::from_pixel(200, 200, Rgb([220, 205, 195]));
    for y in 0..200i32 {
        for x in 0..200i32 {
            let (dx, dy) = (x - 100, y - 100);
            if dx * dx + dy * dy <= 60 * 60 {
                let n = ((x * 7 + y * 13) % 30) as u8;
                img.put_pixel(x as u32, y as u32, Rgb([40 + n, 30 + n, 28 + n]));
            }
        }
    }
    encode_data_url(&img).unwrap()
}

async fn send(router: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = router.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn health_reports_model_loaded() {
    let (status, body) = send(test_router(None), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_loaded"], true);
}

#[tokio::test]
async fn model_info_exposes_shapes() {
    let (status, body) = send(test_router(None), Method::GET, "/model-info", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["input_shape"], json!([-1, 224, 224, 3]));
    assert_eq!(body["output_shape"], json!([-1, 1]));
    assert_eq!(body["total_params"], json!(4_049_571));
}

#[tokio::test]
async fn analyze_returns_full_record() {
    let payload = json!({ "image": lesion_data_url() });
    let (status, body) = send(test_router(None), Method::POST, "/analyze", Some(payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["prediction"], "Maligno");
    assert_eq!(body["confidence"], json!(88.0));
    assert_eq!(body["confidence_level"], "High");
    assert_eq!(body["details"]["type"], "Melanoma");
    assert_eq!(body["details"]["risk"], "Alto");

    let benign = body["probabilities"]["benign"].as_f64().unwrap();
    let malignant = body["probabilities"]["malignant"].as_f64().unwrap();
    assert!((benign + malignant - 100.0).abs() < 0.1);

    assert_eq!(body["lesion_detected"], true);
    assert!(body["lesion_location"].is_object());
    assert!(body["lesion_metrics"].is_object());
    assert!(body["abcde_analysis"].is_object());
    assert!(body["processed_image"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));
    assert!(body["gradcam_image"].as_str().is_some());
}

#[tokio::test]
async fn missing_image_is_a_client_error() {
    let (status, body) = send(test_router(None), Method::POST, "/analyze", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "No image provided");
}

#[tokio::test]
async fn malformed_base64_is_a_client_error() {
    let payload = json!({ "image": "data:image/png;base64,@@not-base64@@" });
    let (status, body) = send(test_router(None), Method::POST, "/analyze", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn oversized_payload_is_a_client_error() {
    // Decoded size over the cap, raw body still under the transport limit,
    // so the per-request size check is what rejects it.
    let blob = BASE64.encode(vec![0u8; 1400]);
    let payload = json!({ "image": blob });
    let (status, body) = send(test_router(Some(1000)), Method::POST, "/analyze", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (status, body) = send(test_router(None), Method::GET, "/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Endpoint not found");
}

#[tokio::test]
async fn blank_image_yields_no_lesion_but_succeeds() {
    let blank = RgbImage::from_pixel(160, 160, Rgb([210, 200, 190]));
    let payload = json!({ "image": encode_data_url(&blank).unwrap() });
    let (status, body) = send(test_router(None), Method::POST, "/analyze", Some(payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["lesion_detected"], false);
    assert!(body["lesion_location"].is_null());
    assert!(body["lesion_metrics"].is_null());
    assert!(body["abcde_analysis"].is_null());
}
