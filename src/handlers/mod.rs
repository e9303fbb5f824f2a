//! One module per Lambda function. Each exposes a `function_handler` the binary wires to
//! the runtime, plus the configuration-free core that tests drive against fakes.

use aws_lambda_events::apigw::ApiGatewayV2httpResponse;
use tracing::{error, warn};

use crate::api;
use crate::error::{AppError, AppResult};

pub mod analyze;
pub mod chat;
pub mod dispatch;
pub mod extract_metadata;
pub mod extract_text;
pub mod files;
pub mod ingest_csv;
pub mod reviews;
pub mod upload;
pub mod users;

pub(crate) fn log_failure(err: &AppError) {
    if err.status_code() >= 500 {
        error!(error = %err, "request failed");
    } else {
        warn!(error = %err, "request rejected");
    }
}

/// Turns a handler result into the response envelope; HTTP handlers never fail the invocation.
pub(crate) fn respond(result: AppResult<ApiGatewayV2httpResponse>) -> ApiGatewayV2httpResponse {
    result.unwrap_or_else(|err| {
        log_failure(&err);
        api::error_response(&err)
    })
}

/// Trims a required request field, rejecting blanks.
pub(crate) fn required_field(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
