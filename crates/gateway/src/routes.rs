use crate::config::MAX_UPLOAD_BYTES;
use crate::error::ApiError;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::time::Instant;
use tower_http::cors::CorsLayer;

#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: &'static str,
    pub confidence: f32,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/predict", post(predict))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the Brain Tumor Classification API",
    })
}

#[tracing::instrument(skip_all)]
async fn predict(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PredictResponse>, ApiError> {
    let start = Instant::now();

    let data = read_file_field(&mut multipart).await?;

    // Decoding a scan of up to MAX_UPLOAD_BYTES is CPU work too, so it runs
    // on the blocking pool alongside the forward pass.
    let classifier = state.classifier.clone();
    let result = tokio::task::spawn_blocking(move || {
        let image = preprocess::decode_image(&data)
            .map_err(|e| ApiError::bad_request(format!("Could not decode image: {e}")))?;

        let mut classifier = classifier
            .lock()
            .map_err(|_| ApiError::internal("classifier mutex poisoned"))?;
        classifier
            .classify(&image)
            .map_err(|e| ApiError::internal(format!("Prediction error: {e}")))
    })
    .await;

    state
        .metrics
        .request_duration
        .record(start.elapsed().as_secs_f64(), &[]);

    let prediction = match result {
        Ok(Ok(prediction)) => prediction,
        Ok(Err(e)) => {
            if e.status.is_server_error() {
                state.metrics.errors.add(1, &[]);
            }
            return Err(e);
        }
        Err(e) => {
            state.metrics.errors.add(1, &[]);
            return Err(ApiError::internal(format!("Prediction task failed: {e}")));
        }
    };

    state.metrics.predictions.add(1, &[]);

    tracing::info!(
        prediction = prediction.label.as_str(),
        confidence = prediction.confidence,
        "Prediction served"
    );

    Ok(Json(PredictResponse {
        prediction: prediction.label.as_str(),
        confidence: prediction.confidence,
    }))
}

/// Pull the `file` part out of the multipart form.
async fn read_file_field(multipart: &mut Multipart) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart request: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let is_image = field
            .content_type()
            .is_some_and(|ct| ct.starts_with("image/"));
        if !is_image {
            return Err(ApiError::bad_request("Uploaded file is not an image"));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {e}")))?;

        if data.is_empty() {
            return Err(ApiError::bad_request("No file uploaded"));
        }

        return Ok(data);
    }

    Err(ApiError::bad_request("No file uploaded"))
}
