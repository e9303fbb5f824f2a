use aws_config::BehaviorVersion;
use aws_lambda_events::event::sqs::SqsEvent;
use insight_ai::clients::{SqsQueue, TextractOcr};
use insight_ai::handlers::extract_text;
use insight_ai::telemetry;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();

    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let ocr = TextractOcr::new(aws_sdk_textract::Client::new(&config));
    let queue = SqsQueue::new(aws_sdk_sqs::Client::new(&config));
    let (ocr, queue) = (&ocr, &queue);

    run(service_fn(move |event: LambdaEvent<SqsEvent>| async move {
        extract_text::function_handler(ocr, queue, event.payload).await
    }))
    .await
}
