use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE,
};
use hyper::{Body, Method, Request, Response, StatusCode};
use log::{error, warn};
use serde::Serialize;
use serde_json::json;
use verdict_serve::{Gateway, Timer};

use crate::intake;

pub struct AppState {
    pub gateway: Gateway,

    /// Model file served to browser clients at `/model.h5`
    pub model_file: PathBuf,
}

pub async fn handle(
    req: Request<Body>,
    state: Arc<AppState>,
) -> Result<Response<Body>, Infallible> {
    let t = Timer::start(format!("Handling {} {}", req.method(), req.uri().path()));

    let response = match (req.method(), req.uri().path()) {
        (&Method::POST, "/api/predict") => predict(req, &state).await,
        (&Method::GET, "/api/status") => {
            json_response(StatusCode::OK, &json!({ "status": "Server is running" }))
        }
        (&Method::GET, "/model.h5") => model_file(&state.model_file).await,
        (&Method::OPTIONS, _) => preflight(),
        _ => error_response(StatusCode::NOT_FOUND, "Not found"),
    };

    t.finish();

    Ok(with_cors(response))
}

async fn predict(req: Request<Body>, state: &AppState) -> Response<Body> {
    let image = match intake::read_image(req, state.gateway.max_upload_bytes()).await {
        Ok(image) => image,
        Err(err) => {
            warn!("Rejected upload: {:?}", err);
            return error_response(StatusCode::BAD_REQUEST, &err.to_string());
        }
    };

    match state.gateway.predict(&image).await {
        Ok(result) => json_response(StatusCode::OK, &result),
        Err(err) => {
            error!("Prediction error: {}", err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Error processing image")
        }
    }
}

async fn model_file(path: &Path) -> Response<Body> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let mut response = Response::new(Body::from(bytes));
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            );
            response
        }
        Err(e) => {
            warn!("Could not read model file {}: {}", path.display(), e);
            error_response(StatusCode::NOT_FOUND, "Not found")
        }
    }
}

fn preflight() -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    let headers = response.headers_mut();
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
    response
}

fn with_cors(mut response: Response<Body>) -> Response<Body> {
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Body> {
    match serde_json::to_vec(value) {
        Ok(body) => {
            let mut response = Response::new(Body::from(body));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(e) => {
            error!("Could not serialize response: {}", e);
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response<Body> {
    json_response(status, &json!({ "error": message }))
}
