use aws_config::BehaviorVersion;
use insight_ai::clients::DynamoTable;
use insight_ai::handlers::reviews;
use insight_ai::model::School;
use insight_ai::{runtime, telemetry};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();
    runtime::init_thread_pool(runtime::worker_count());

    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let table = DynamoTable::new(aws_sdk_dynamodb::Client::new(&config));
    let table = &table;

    run(service_fn(move |event: LambdaEvent<Value>| async move {
        reviews::function_handler::<School>(table, event.payload).await
    }))
    .await
}
