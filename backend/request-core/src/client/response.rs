use crate::error::ApiError;
use crate::transport::RawResponse;

use common::HttpStatusCode;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Turn a raw response into `T` or a classified error.
///
/// Non-2xx becomes `HtmlResponse` for HTML bodies and `HttpStatus` otherwise.
/// A 2xx must be JSON; 204 decodes from `null`, then `{}`.
pub(crate) fn decode_response<T: DeserializeOwned>(
    response: &RawResponse,
    endpoint: &str,
) -> Result<T, ApiError> {
    if !response.status.is_success() {
        return Err(status_error(response, endpoint));
    }

    if response.status == HttpStatusCode::NO_CONTENT {
        return serde_json::from_value(Value::Null)
            .or_else(|_| serde_json::from_value(Value::Object(Map::new())))
            .map_err(|e| ApiError::decode(endpoint, e.to_string()));
    }

    if !response.is_json() {
        return Err(ApiError::html_response(
            endpoint,
            response.status,
            response.content_type().map(str::to_string),
        ));
    }

    response
        .parse_json()
        .map_err(|e| ApiError::decode(endpoint, e.to_string()))
}

pub(crate) fn status_error(response: &RawResponse, endpoint: &str) -> ApiError {
    if response.is_html() {
        return ApiError::html_response(
            endpoint,
            response.status,
            response.content_type().map(str::to_string),
        );
    }

    let body = if response.is_json() {
        response.parse_json::<Value>().ok()
    } else {
        None
    };
    ApiError::http_status(endpoint, response.status, body)
}
