use axum::{http::StatusCode, response::Response};

use crate::api::extract::StrictJson;
use crate::api::models::echo::EchoRequest;
use crate::errors::Result;
use crate::response::{JsonResponse, write_json};

/// Decode the body strictly and send it back inside the envelope.
pub async fn echo(StrictJson(request): StrictJson<EchoRequest>) -> Result<Response> {
    let payload = JsonResponse::success("received", Some(serde_json::to_value(&request)?));
    Ok(write_json(StatusCode::OK, &payload, None)?)
}

#[cfg(test)]
mod tests {
    use crate::response::JsonResponse;
    use crate::test_utils::{create_test_app, create_test_app_with, test_config};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_echo_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let server = create_test_app(tmp.path()).await;

        let response = server.post("/api/v1/echo").json(&json!({"message": "hi", "tags": ["a", "b"]})).await;

        response.assert_status_ok();
        response.assert_header("content-type", "application/json");
        response.assert_json(&json!({
            "error": false,
            "message": "received",
            "data": {"message": "hi", "tags": ["a", "b"]}
        }));
    }

    #[tokio::test]
    async fn test_echo_without_content_type() {
        let tmp = tempfile::tempdir().unwrap();
        let server = create_test_app(tmp.path()).await;

        let response = server.post("/api/v1/echo").text(r#"{"message": "plain"}"#).await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn test_echo_rejections() {
        let tmp = tempfile::tempdir().unwrap();
        let server = create_test_app(tmp.path()).await;

        let cases = [
            ("", "body must not be empty"),
            (r#"{"message": 1}"#, "message"),
            (r#"{"message": "a"}{"message": "b"}"#, "single JSON value"),
            (r#"{"message": "a", "extra": true}"#, "extra"),
            (r#"{"message": "a""#, ""),
            ("Hello World", ""),
        ];

        for (input, needle) in cases {
            let response = server.post("/api/v1/echo").text(input).await;

            response.assert_status(StatusCode::BAD_REQUEST);
            let body: JsonResponse = response.json();
            assert!(body.error, "{input}");
            assert!(body.message.contains(needle), "{input}: {}", body.message);
        }
    }

    #[tokio::test]
    async fn test_echo_too_large() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = test_config(tmp.path());
        config.json.max_body_size = 8;
        let server = create_test_app_with(config).await;

        let response = server.post("/api/v1/echo").json(&json!({"message": "far too long"})).await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_echo_unknown_fields_allowed_by_config() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = test_config(tmp.path());
        config.json.allow_unknown_fields = true;
        let server = create_test_app_with(config).await;

        let response = server.post("/api/v1/echo").json(&json!({"message": "a", "extra": true})).await;

        response.assert_status_ok();
        let body: JsonResponse = response.json();
        assert_eq!(body.data, Some(json!({"message": "a", "tags": []})));
    }
}
