use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use gateway::routes::app;
use gateway::state::AppState;
use http_body_util::BodyExt;
use image::RgbImage;
use inference::{Classifier, InferenceBackend, InferenceOutput};
use ndarray::{Array, ArrayD, IxDyn};
use std::io::Cursor;
use tower::ServiceExt;

/// Backend returning canned class probabilities.
struct FixedBackend {
    probabilities: Vec<f32>,
}

impl InferenceBackend for FixedBackend {
    fn load_model(_path: &str) -> anyhow::Result<Self> {
        Ok(Self {
            probabilities: vec![0.5, 0.5],
        })
    }

    fn infer(&mut self, input: &Array<f32, IxDyn>) -> anyhow::Result<InferenceOutput> {
        assert_eq!(input.shape(), &[1, 240, 240, 3]);
        Ok(InferenceOutput {
            probabilities: ArrayD::from_shape_vec(
                IxDyn(&[1, self.probabilities.len()]),
                self.probabilities.clone(),
            )?,
        })
    }
}

fn test_app(probabilities: Vec<f32>) -> axum::Router {
    let backend = FixedBackend { probabilities };
    let classifier = Classifier::new(Box::new(backend), (240, 240));
    app(AppState::new(classifier))
}

fn png_bytes() -> Vec<u8> {
    let image = RgbImage::from_pixel(64, 64, image::Rgb([180, 180, 180]));
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
    bytes.into_inner()
}

fn multipart_request(field_name: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let boundary = "x-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"{field_name}\"; filename=\"scan.png\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn root_returns_welcome_message() {
    let app = test_app(vec![0.5, 0.5]);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(
        json["message"],
        "Welcome to the Brain Tumor Classification API"
    );
}

#[tokio::test]
async fn predict_classifies_uploaded_image() {
    let app = test_app(vec![0.1, 0.9]);

    let response = app
        .oneshot(multipart_request("file", "image/png", &png_bytes()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["prediction"], "tumorous");
    assert!((json["confidence"].as_f64().unwrap() - 0.9).abs() < 1e-5);
}

#[tokio::test]
async fn predict_reports_non_tumorous_scans() {
    let app = test_app(vec![0.8, 0.2]);

    let response = app
        .oneshot(multipart_request("file", "image/jpeg", &png_bytes()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["prediction"], "non-tumorous");
    assert!((json["confidence"].as_f64().unwrap() - 0.8).abs() < 1e-5);
}

#[tokio::test]
async fn predict_rejects_missing_file_field() {
    let app = test_app(vec![0.5, 0.5]);

    let response = app
        .oneshot(multipart_request("attachment", "image/png", &png_bytes()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["detail"], "No file uploaded");
}

#[tokio::test]
async fn predict_rejects_non_image_content_type() {
    let app = test_app(vec![0.5, 0.5]);

    let response = app
        .oneshot(multipart_request("file", "text/plain", b"hello"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["detail"], "Uploaded file is not an image");
}

#[tokio::test]
async fn predict_rejects_undecodable_image_bytes() {
    let app = test_app(vec![0.5, 0.5]);

    let response = app
        .oneshot(multipart_request("file", "image/png", b"not a real png"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    let detail = json["detail"].as_str().unwrap();
    assert!(detail.starts_with("Could not decode image"), "{detail}");
}

#[tokio::test]
async fn predict_rejects_empty_upload() {
    let app = test_app(vec![0.5, 0.5]);

    let response = app
        .oneshot(multipart_request("file", "image/png", b""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["detail"], "No file uploaded");
}

#[tokio::test]
async fn backend_failure_maps_to_internal_error() {
    struct FailingBackend;

    impl InferenceBackend for FailingBackend {
        fn load_model(_path: &str) -> anyhow::Result<Self> {
            Ok(Self)
        }

        fn infer(&mut self, _input: &Array<f32, IxDyn>) -> anyhow::Result<InferenceOutput> {
            anyhow::bail!("session run failed")
        }
    }

    let classifier = Classifier::new(Box::new(FailingBackend), (240, 240));
    let app = app(AppState::new(classifier));

    let response = app
        .oneshot(multipart_request("file", "image/png", &png_bytes()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = response_json(response).await;
    let detail = json["detail"].as_str().unwrap();
    assert!(detail.starts_with("Prediction error"), "{detail}");
}
