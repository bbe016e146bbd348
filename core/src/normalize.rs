//! Turns a completed `HttpResponse` into a decoded value or an error
//! envelope.
//!
//! Non-2xx responses become `ApiError::Upstream` with the literal status and
//! raw body. Successful responses never fail: a body that is not JSON
//! decodes to `Value::Null`.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::HttpResponse;

pub fn normalize(response: HttpResponse) -> Result<Value, ApiError> {
    if !response.is_success() {
        return Err(ApiError::Upstream {
            status: response.status,
            body: response.body,
        });
    }
    let declared_json = response.header("content-type").is_some_and(is_json_media_type);
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    match serde_json::from_str(&response.body) {
        Ok(value) => Ok(value),
        Err(e) => {
            if declared_json {
                tracing::debug!("JSON response failed to decode: {e}");
            }
            Ok(Value::Null)
        }
    }
}

/// Normalize, then decode into `T`.
pub fn decode<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    let value = normalize(response)?;
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

fn is_json_media_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, content_type: Option<&str>, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: content_type
                .map(|ct| vec![("content-type".to_string(), ct.to_string())])
                .unwrap_or_default(),
            body: body.to_string(),
        }
    }

    #[test]
    fn json_body_decodes_to_mapping() {
        let value = normalize(response(200, Some("application/json; charset=utf-8"), r#"{"balance": 500}"#)).unwrap();
        assert_eq!(value, json!({"balance": 500}));
    }

    #[test]
    fn text_body_holding_json_still_decodes() {
        let value = normalize(response(200, Some("text/plain"), r#"[1,2]"#)).unwrap();
        assert_eq!(value, json!([1, 2]));
    }

    #[test]
    fn plain_text_success_is_null_not_error() {
        let value = normalize(response(200, Some("text/plain"), "OK")).unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn malformed_json_success_is_null_not_error() {
        let value = normalize(response(200, Some("application/json"), "{oops")).unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn empty_no_content_is_null() {
        assert_eq!(normalize(response(204, None, "")).unwrap(), Value::Null);
    }

    #[test]
    fn not_found_keeps_raw_body() {
        let err = normalize(response(404, Some("text/plain"), "not found")).unwrap_err();
        match err {
            ApiError::Upstream { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "not found");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn error_body_is_never_parsed() {
        let raw = r#"{"message":"bad input"}"#;
        let err = normalize(response(400, Some("application/json"), raw)).unwrap_err();
        assert!(matches!(err, ApiError::Upstream { status: 400, ref body } if body == raw));
    }

    #[test]
    fn redirect_is_not_success() {
        let err = normalize(response(302, None, "")).unwrap_err();
        assert_eq!(err.status(), Some(302));
    }

    #[test]
    fn problem_json_counts_as_json() {
        assert!(is_json_media_type("application/problem+json"));
        assert!(!is_json_media_type("text/html"));
    }

    #[test]
    fn typed_decode_reports_shape_mismatch() {
        let err = decode::<Vec<u32>>(response(200, Some("application/json"), r#"{"a":1}"#)).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
