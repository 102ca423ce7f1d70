//! HTTP surface.
//!
//! One route, `GET /thumbnail?url=<url>&width=<w>&height=<h>`, answering
//! `image/jpeg` on success. Failures come back as JSON:
//!
//! ```json
//! {"status_code": 400, "error_message": "Width and height must be positive integers, got: width=0, height=10"}
//! ```
//!
//! Bad parameters and unusable sources are the caller's problem (400);
//! failures producing the thumbnail are ours (500). Any other path is a 404
//! with the same body shape.

use crate::imaging::OUTPUT_CONTENT_TYPE;
use crate::transform::{ThumbnailRequest, TransformError, Transformer};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

const NOT_FOUND_MESSAGE: &str = "Sorry, this page doesn't exist";

/// JSON error body shared by every non-image response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status_code: u16,
    pub error_message: String,
}

impl ErrorBody {
    fn response(status: StatusCode, message: impl Into<String>) -> Response {
        let body = ErrorBody {
            status_code: status.as_u16(),
            error_message: message.into(),
        };
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for TransformError {
    fn into_response(self) -> Response {
        let status = match self {
            TransformError::InvalidArgument(_) | TransformError::SourceUnavailable(_) => {
                StatusCode::BAD_REQUEST
            }
            TransformError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ErrorBody::response(status, self.to_string())
    }
}

pub fn router(transformer: Arc<Transformer>) -> Router {
    Router::new()
        .route("/thumbnail", get(thumbnail))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(transformer)
}

/// Serve until Ctrl-C.
pub async fn serve(listener: TcpListener, transformer: Arc<Transformer>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("listening on http://{}", addr);
    }
    axum::serve(listener, router(transformer.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!(cache = %transformer.cache().stats(), "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}

async fn thumbnail(
    State(transformer): State<Arc<Transformer>>,
    query: Result<Query<ThumbnailRequest>, QueryRejection>,
) -> Response {
    let Query(request) = match query {
        Ok(q) => q,
        Err(rejection) => {
            return ErrorBody::response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    match transformer.handle(&request).await {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, OUTPUT_CONTENT_TYPE)],
            bytes,
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn not_found() -> Response {
    ErrorBody::response(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE)
}
