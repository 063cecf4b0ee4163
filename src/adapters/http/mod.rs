pub mod error;
pub mod routes;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use crate::adapters::http::state::HttpState;

/// Ajustes de la capa HTTP que no son estado de la aplicación.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub max_upload_bytes: usize,
    pub cors_origins: Vec<String>,
}

pub fn router(state: HttpState, opts: &HttpOptions) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/predict", post(routes::predict))
        .route("/result/:filename", get(routes::result_image))
        .route("/uploads/:filename", get(routes::uploaded_image))
        .route("/health", get(routes::health))
        .layer(DefaultBodyLimit::max(opts.max_upload_bytes))
        .layer(cors_layer(&opts.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    layer.allow_origin(origins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::adapters::fs::image_store::LocalImageStore;
    use crate::application::fakes::{fertilizer_table, FailingDetector, FakeAnnotator, FakeDetector};
    use crate::application::ports::DetectorPort;
    use crate::application::services::PredictionService;

    const BOUNDARY: &str = "XyZboundary42";

    fn app(dir: &TempDir, detector: Arc<dyn DetectorPort>) -> Router {
        let store = LocalImageStore::new(dir.path().join("uploads"), dir.path().join("results"));
        let prediction = PredictionService::new(
            detector,
            Arc::new(FakeAnnotator),
            Arc::new(store),
            Arc::new(fertilizer_table()),
        );
        let state = HttpState { prediction: Arc::new(prediction), fallback_host: "localhost:5000".into() };
        let opts = HttpOptions { max_upload_bytes: 1024 * 1024, cors_origins: vec!["*".into()] };
        router(state, &opts)
    }

    /// (campo, filename opcional, contenido)
    fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, filename, content) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match filename {
                Some(f) => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\nContent-Type: image/jpeg\r\n\r\n")
                        .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn predict_request(parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header(header::HOST, "example.org:5000")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json(resp: axum::response::Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn index_serves_upload_form() {
        let dir = TempDir::new().unwrap();
        let resp = app(&dir, Arc::new(FakeDetector::labels(&[]))).oneshot(get("/")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains(r#"action="/predict""#));
        assert!(html.contains(r#"name="file""#));
    }

    #[tokio::test]
    async fn predict_without_file_is_400() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir, Arc::new(FakeDetector::labels(&[])));

        let resp = app
            .clone()
            .oneshot(predict_request(&[("other", Some("a.jpg"), b"x"), ("file", None, b"text only")]))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(resp).await["error"], "No image uploaded");

        let not_multipart = Request::builder().method("POST").uri("/predict").body(Body::empty()).unwrap();
        let resp = app.oneshot(not_multipart).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(resp).await["error"], "No image uploaded");
    }

    #[tokio::test]
    async fn predict_with_empty_filename_is_400() {
        let dir = TempDir::new().unwrap();
        let resp = app(&dir, Arc::new(FakeDetector::labels(&[])))
            .oneshot(predict_request(&[("file", Some(""), b"")]))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(resp).await["error"], "No image selected");
    }

    #[tokio::test]
    async fn predict_returns_enriched_detections_and_urls() {
        let dir = TempDir::new().unwrap();
        let resp = app(&dir, Arc::new(FakeDetector::weed_a(0.873)))
            .oneshot(predict_request(&[("file", Some("field.jpg"), b"jpeg-bytes")]))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = json(resp).await;
        let dets = body["detections"].as_array().unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0]["label"], "weed_A");
        assert_eq!(dets[0]["confidence"], 87.3);
        assert_eq!(dets[0]["fertilizer"], "Urea");
        assert_eq!(body["result_image_url"], "http://example.org:5000/result/result_field.jpg");
        assert_eq!(body["original_image_url"], "http://example.org:5000/uploads/field.jpg");
    }

    #[tokio::test]
    async fn every_record_has_five_keys_and_percent_confidence() {
        let dir = TempDir::new().unwrap();
        let labels = ["weed_A", "weed_B", "weed_C"];
        let resp = app(&dir, Arc::new(FakeDetector::labels(&labels)))
            .oneshot(predict_request(&[("image", Some("plot 7.png"), b"png-bytes")]))
            .await
            .unwrap();

        let body = json(resp).await;
        let dets = body["detections"].as_array().unwrap();
        assert_eq!(dets.len(), labels.len());
        for det in dets {
            let obj = det.as_object().unwrap();
            for key in ["label", "confidence", "fertilizer", "quantity", "frequency"] {
                assert!(obj.contains_key(key), "missing {key}");
            }
            let c = obj["confidence"].as_f64().unwrap();
            assert!((0.0..=100.0).contains(&c));
        }
        assert_eq!(dets[1]["fertilizer"], "Not found");
        assert_eq!(dets[1]["quantity"], "N/A");
        assert_eq!(dets[1]["frequency"], "N/A");
        assert!(body["original_image_url"].as_str().unwrap().ends_with("/uploads/plot_7.png"));
    }

    #[tokio::test]
    async fn file_field_takes_precedence_over_image() {
        let dir = TempDir::new().unwrap();
        let resp = app(&dir, Arc::new(FakeDetector::labels(&[])))
            .oneshot(predict_request(&[
                ("image", Some("second.jpg"), b"b"),
                ("file", Some("first.jpg"), b"a"),
            ]))
            .await
            .unwrap();

        let body = json(resp).await;
        assert!(body["original_image_url"].as_str().unwrap().ends_with("/uploads/first.jpg"));
    }

    #[tokio::test]
    async fn stored_and_result_files_are_served_as_jpeg() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir, Arc::new(FakeDetector::weed_a(0.5)));

        let resp = app
            .clone()
            .oneshot(predict_request(&[("file", Some("field.jpg"), b"jpeg-bytes")]))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        for uri in ["/uploads/field.jpg", "/result/result_field.jpg"] {
            let resp = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
            assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/jpeg");
            let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
            assert_eq!(&bytes[..], b"jpeg-bytes");
        }
    }

    #[tokio::test]
    async fn reupload_overwrites_previous_file() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir, Arc::new(FakeDetector::labels(&[])));

        for content in [&b"first"[..], &b"second"[..]] {
            let resp = app
                .clone()
                .oneshot(predict_request(&[("file", Some("field.jpg"), content)]))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let resp = app.oneshot(get("/uploads/field.jpg")).await.unwrap();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"second");
    }

    #[tokio::test]
    async fn missing_files_are_404() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir, Arc::new(FakeDetector::labels(&[])));

        for uri in ["/uploads/nope.jpg", "/result/nope.jpg", "/uploads/..%2FCargo.toml"] {
            let resp = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
            assert!(json(resp).await["error"].is_string());
        }
    }

    #[tokio::test]
    async fn detector_failure_is_500() {
        let dir = TempDir::new().unwrap();
        let resp = app(&dir, Arc::new(FailingDetector))
            .oneshot(predict_request(&[("file", Some("field.jpg"), b"x")]))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn health_reports_counts() {
        let dir = TempDir::new().unwrap();
        // 1 detección por petición, pero el modelo conoce 4 clases
        let detector = FakeDetector::weed_a(0.9).with_classes(&["weed_A", "weed_B", "sedge", "grass"]);
        let resp = app(&dir, Arc::new(detector)).oneshot(get("/health")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = json(resp).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["classes"], 4);
        assert_eq!(body["fertilizers"], 1);
    }

    #[tokio::test]
    async fn forwarded_host_and_proto_shape_urls() {
        let dir = TempDir::new().unwrap();
        let req = Request::builder()
            .method("POST")
            .uri("/predict")
            .header(header::HOST, "10.0.0.5:5000")
            .header("x-forwarded-host", "weeds.example.org")
            .header("x-forwarded-proto", "https")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(multipart_body(&[("file", Some("field.jpg"), b"jpeg-bytes")])))
            .unwrap();
        let resp = app(&dir, Arc::new(FakeDetector::weed_a(0.5))).oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = json(resp).await;
        assert_eq!(body["result_image_url"], "https://weeds.example.org/result/result_field.jpg");
        assert_eq!(body["original_image_url"], "https://weeds.example.org/uploads/field.jpg");
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let dir = TempDir::new().unwrap();
        let req = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "http://frontend.example")
            .body(Body::empty())
            .unwrap();
        let resp = app(&dir, Arc::new(FakeDetector::labels(&[]))).oneshot(req).await.unwrap();

        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
