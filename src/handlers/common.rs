use crate::errors::{ApiError, DataValidationError, EntityKind, ServiceError};
use axum::{
    body::Bytes,
    http::{
        header::{CONTENT_TYPE, HOST, LOCATION},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

const JSON_MEDIA_TYPE: &str = "application/json";

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response, pointing `Location` at the new resource
pub fn created_response<T: Serialize>(data: T, location: Option<String>) -> Response {
    let mut response = (StatusCode::CREATED, Json(data)).into_response();
    if let Some(value) = location.and_then(|l| HeaderValue::from_str(&l).ok()) {
        response.headers_mut().insert(LOCATION, value);
    }
    response
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Map service errors to API errors
pub fn map_service_error(err: ServiceError) -> ApiError {
    ApiError::ServiceError(err)
}

/// Rejects submissions whose `Content-Type` is not JSON; parameters such as `charset` are allowed
pub fn require_json(headers: &HeaderMap) -> Result<(), ApiError> {
    let declared = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    let media_type = declared.split(';').next().unwrap_or("").trim();

    if media_type.eq_ignore_ascii_case(JSON_MEDIA_TYPE) {
        Ok(())
    } else {
        warn!("Invalid Content-Type: {:?}", declared);
        Err(ServiceError::UnsupportedMediaType(format!(
            "Content-Type must be {}",
            JSON_MEDIA_TYPE
        ))
        .into())
    }
}

/// Checks the media type, then parses the body as JSON for `entity`
pub fn json_payload(headers: &HeaderMap, body: &Bytes, entity: EntityKind) -> Result<Value, ApiError> {
    require_json(headers)?;
    serde_json::from_slice(body).map_err(|e| {
        warn!("Unparseable {} body: {}", entity, e);
        DataValidationError::MalformedBody { entity }.into()
    })
}

/// Absolute URL for `path` when the request named its host, otherwise the bare path
pub fn location_for(headers: &HeaderMap, path: &str) -> String {
    match headers.get(HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => format!("http://{}{}", host, path),
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    fn with_content_type(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[rstest]
    #[case("application/json")]
    #[case("application/json; charset=utf-8")]
    #[case("Application/JSON")]
    fn json_media_types_are_accepted(#[case] value: &str) {
        assert!(require_json(&with_content_type(value)).is_ok());
    }

    #[rstest]
    #[case("text/plain")]
    #[case("application/xml")]
    #[case("application/jsonp")]
    fn other_media_types_are_rejected(#[case] value: &str) {
        assert_matches!(
            require_json(&with_content_type(value)),
            Err(ApiError::ServiceError(ServiceError::UnsupportedMediaType(_)))
        );
    }

    #[test]
    fn missing_content_type_is_rejected() {
        assert_matches!(
            require_json(&HeaderMap::new()),
            Err(ApiError::ServiceError(ServiceError::UnsupportedMediaType(_)))
        );
    }

    #[test]
    fn invalid_json_is_a_malformed_body() {
        let headers = with_content_type("application/json");
        assert_matches!(
            json_payload(&headers, &Bytes::from_static(b"{not json"), EntityKind::Supplier),
            Err(ApiError::ServiceError(ServiceError::Validation(
                DataValidationError::MalformedBody { entity: EntityKind::Supplier }
            )))
        );
    }

    #[test]
    fn location_uses_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("localhost:8080"));
        assert_eq!(
            location_for(&headers, "/suppliers/3"),
            "http://localhost:8080/suppliers/3"
        );
        assert_eq!(location_for(&HeaderMap::new(), "/suppliers/3"), "/suppliers/3");
    }
}
