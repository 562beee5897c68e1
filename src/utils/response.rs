use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Body of every successful API reply: `{"success": true, "data": .., "message": ..}`.
#[derive(Serialize)]
pub struct Envelope<T: Serialize> {
    success: bool,
    data: T,
    message: &'static str,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(data: T, message: &'static str) -> Self {
        Self {
            success: true,
            data,
            message,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'static str,
    message: &'a str,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    success: bool,
    error: ErrorBody<'a>,
}

/// Error reply: `{"success": false, "error": {"code": .., "message": ..}}`.
pub fn rejection(status: StatusCode, code: &'static str, message: &str) -> Response {
    let body = ErrorEnvelope {
        success: false,
        error: ErrorBody { code, message },
    };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::{json, Value};

    async fn body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_envelope_carries_data_and_message() {
        let response =
            Envelope::new(json!({"status": "ok"}), "Health check successful").into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body(response).await,
            json!({
                "success": true,
                "data": {"status": "ok"},
                "message": "Health check successful",
            })
        );
    }

    #[tokio::test]
    async fn test_rejection_shape() {
        let response = rejection(
            StatusCode::FORBIDDEN,
            "FORBIDDEN",
            "CSRF failed: CSRF token missing",
        );
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            body(response).await,
            json!({
                "success": false,
                "error": {"code": "FORBIDDEN", "message": "CSRF failed: CSRF token missing"},
            })
        );
    }
}
