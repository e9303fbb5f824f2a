use aws_config::BehaviorVersion;
use aws_lambda_events::apigw::ApiGatewayV2httpRequest;
use insight_ai::clients::{DynamoTable, S3Store, SqsQueue};
use insight_ai::handlers::upload;
use insight_ai::telemetry;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();

    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let store = S3Store::new(aws_sdk_s3::Client::new(&config));
    let table = DynamoTable::new(aws_sdk_dynamodb::Client::new(&config));
    let queue = SqsQueue::new(aws_sdk_sqs::Client::new(&config));
    let (store, table, queue) = (&store, &table, &queue);

    run(service_fn(move |event: LambdaEvent<ApiGatewayV2httpRequest>| async move {
        upload::function_handler(store, table, queue, event.payload).await
    }))
    .await
}
