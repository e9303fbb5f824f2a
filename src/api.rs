//! Request parsing and response envelopes for the HTTP API handlers.
//!
//! Every body is `{success, data | error | message}`. Errors never fail the invocation;
//! they become a 400 or 500 response here.

use aws_lambda_events::apigw::{ApiGatewayV2httpRequest, ApiGatewayV2httpResponse};
use aws_lambda_events::encodings::Body;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use http::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
        }
    }
}

pub fn json_response<T: Serialize>(status: u16, body: &ApiResponse<T>) -> ApiGatewayV2httpResponse {
    let body = serde_json::to_string(body)
        .unwrap_or_else(|_| r#"{"success":false,"error":"Internal error"}"#.to_string());

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));

    ApiGatewayV2httpResponse {
        status_code: i64::from(status),
        headers,
        body: Some(Body::Text(body)),
        is_base64_encoded: false,
        ..Default::default()
    }
}

pub fn ok<T: Serialize>(data: T) -> ApiGatewayV2httpResponse {
    json_response(200, &ApiResponse::success(data))
}

pub fn error_response(err: &AppError) -> ApiGatewayV2httpResponse {
    json_response(err.status_code(), &ApiResponse::error(err.to_string()))
}

/// Reply for functions invoked directly with a JSON payload rather than through the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectResponse {
    pub status_code: u16,
    pub body: ApiResponse<serde_json::Value>,
}

impl DirectResponse {
    pub fn ok(body: ApiResponse<serde_json::Value>) -> Self {
        Self {
            status_code: 200,
            body,
        }
    }

    pub fn failure(err: &AppError) -> Self {
        Self {
            status_code: err.status_code(),
            body: ApiResponse {
                success: false,
                data: None,
                message: None,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Decodes the JSON request body, including base64-encoded bodies.
pub fn parse_body<T: DeserializeOwned>(request: &ApiGatewayV2httpRequest) -> AppResult<T> {
    let raw = match request.body.as_deref() {
        Some(body) if !body.trim().is_empty() => body,
        _ => return Err(AppError::invalid("Request body is missing")),
    };

    let parsed = if request.is_base64_encoded {
        let bytes = STANDARD
            .decode(raw)
            .map_err(|e| AppError::invalid(format!("Request body is not valid base64: {e}")))?;
        serde_json::from_slice(&bytes)
    } else {
        serde_json::from_str(raw)
    };

    parsed.map_err(|e| AppError::invalid(format!("Invalid request body: {e}")))
}

#[cfg(test)]
pub(crate) fn body_json(response: &ApiGatewayV2httpResponse) -> serde_json::Value {
    match &response.body {
        Some(Body::Text(text)) => serde_json::from_str(text).unwrap(),
        other => panic!("unexpected body: {other:?}"),
    }
}
