use aws_config::BehaviorVersion;
use aws_lambda_events::event::sqs::SqsEvent;
use insight_ai::clients::LambdaInvoker;
use insight_ai::handlers::dispatch;
use insight_ai::telemetry;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();

    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let invoker = LambdaInvoker::new(aws_sdk_lambda::Client::new(&config));
    let invoker = &invoker;

    run(service_fn(move |event: LambdaEvent<SqsEvent>| async move {
        dispatch::function_handler(invoker, event.payload).await
    }))
    .await
}
