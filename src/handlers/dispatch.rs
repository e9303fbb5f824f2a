//! Routes extracted report text to the metadata extractor for its category.

use aws_lambda_events::event::sqs::SqsEvent;
use lambda_runtime::Error;
use tracing::{error, info, warn};

use crate::classify::{classify_report, ReportCategory};
use crate::clients::FunctionInvoker;
use crate::config::RouteTable;
use crate::error::{AppError, AppResult};
use crate::model::{BatchResponse, ExtractionMessage, QueueRecord};

pub async fn function_handler(
    invoker: &dyn FunctionInvoker,
    event: SqsEvent,
) -> Result<BatchResponse, Error> {
    let routes = RouteTable::from_env()?;
    Ok(dispatch_batch(&routes, invoker, &QueueRecord::from_sqs(&event)).await)
}

/// Outcome for one queue record.
#[derive(Debug, PartialEq, Eq)]
pub enum Dispatch {
    Routed {
        category: ReportCategory,
        function: String,
    },
    Skipped,
    Unroutable,
}

pub async fn dispatch_batch(
    routes: &RouteTable,
    invoker: &dyn FunctionInvoker,
    records: &[QueueRecord],
) -> BatchResponse {
    let mut response = BatchResponse::default();
    for record in records {
        match dispatch_record(routes, invoker, record).await {
            Ok(Dispatch::Routed { .. }) | Ok(Dispatch::Skipped) => {}
            Ok(Dispatch::Unroutable) => response.fail(&record.message_id),
            Err(err) => {
                error!(message_id = %record.message_id, error = %err, "dispatch failed");
                response.fail(&record.message_id);
            }
        }
    }
    response
}

pub async fn dispatch_record(
    routes: &RouteTable,
    invoker: &dyn FunctionInvoker,
    record: &QueueRecord,
) -> AppResult<Dispatch> {
    let message = match parse_message(&record.body) {
        Ok(message) => message,
        Err(err) => {
            warn!(message_id = %record.message_id, error = %err, "skipping record");
            return Ok(Dispatch::Skipped);
        }
    };

    let category = classify_report(&message.text);
    let Some(function) = routes.function_for(category) else {
        warn!(file_key = %message.file_key, "report matched no category");
        return Ok(Dispatch::Unroutable);
    };

    invoker
        .invoke_async(function, serde_json::to_vec(&message)?)
        .await?;
    info!(file_key = %message.file_key, category = ?category, %function, "dispatched report");

    Ok(Dispatch::Routed {
        category,
        function: function.to_string(),
    })
}

fn parse_message(body: &str) -> AppResult<ExtractionMessage> {
    let message: ExtractionMessage =
        serde_json::from_str(body).map_err(|e| AppError::MalformedMessage(e.to_string()))?;
    if message.text.trim().is_empty() || message.file_key.trim().is_empty() {
        return Err(AppError::MalformedMessage(
            "text and fileKey are required".into(),
        ));
    }
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeInvoker;

    fn routes() -> RouteTable {
        RouteTable {
            school: "school-fn".into(),
            university: "university-fn".into(),
            programme: "programme-fn".into(),
            vocational_centre: "vocational-fn".into(),
        }
    }

    fn record(id: &str, body: serde_json::Value) -> QueueRecord {
        QueueRecord {
            message_id: id.into(),
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn each_report_goes_to_its_category_function() {
        let invoker = FakeInvoker::default();
        let records = vec![
            record("m1", serde_json::json!({"text": "Institutional Review Report 2023", "fileKey": "Files/uob.pdf"})),
            record("m2", serde_json::json!({"text": "Directorate of Vocational Reviews", "fileKey": "Files/agora.pdf"})),
        ];

        let response = dispatch_batch(&routes(), &invoker, &records).await;

        assert!(response.batch_item_failures.is_empty());
        let calls = invoker.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "university-fn");
        assert_eq!(
            calls[0].1,
            serde_json::json!({"text": "Institutional Review Report 2023", "fileKey": "Files/uob.pdf"})
        );
        assert_eq!(calls[1].0, "vocational-fn");
    }

    #[tokio::test]
    async fn malformed_and_incomplete_records_are_skipped() {
        let invoker = FakeInvoker::default();
        let records = vec![
            QueueRecord {
                message_id: "m1".into(),
                body: "{not json".into(),
            },
            record("m2", serde_json::json!({"text": "Schools Reviews"})),
            record("m3", serde_json::json!({"text": "  ", "fileKey": "Files/a.pdf"})),
        ];

        let response = dispatch_batch(&routes(), &invoker, &records).await;

        assert!(response.batch_item_failures.is_empty());
        assert!(invoker.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_reports_are_returned_to_the_queue() {
        let invoker = FakeInvoker::default();
        let records = vec![record(
            "m1",
            serde_json::json!({"text": "Quarterly budget summary", "fileKey": "Files/budget.pdf"}),
        )];

        let response = dispatch_batch(&routes(), &invoker, &records).await;

        assert_eq!(response.batch_item_failures.len(), 1);
        assert_eq!(response.batch_item_failures[0].item_identifier, "m1");
        assert!(invoker.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invocation_failures_fail_the_record() {
        let invoker = FakeInvoker {
            fail: true,
            ..Default::default()
        };
        let records = vec![record(
            "m1",
            serde_json::json!({"text": "Programme Review Report", "fileKey": "Files/it.pdf"}),
        )];

        let response = dispatch_batch(&routes(), &invoker, &records).await;
        assert_eq!(response.batch_item_failures.len(), 1);
    }
}
