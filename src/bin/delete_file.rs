use aws_config::BehaviorVersion;
use aws_lambda_events::apigw::ApiGatewayV2httpRequest;
use insight_ai::clients::{DynamoTable, S3Store};
use insight_ai::handlers::files;
use insight_ai::telemetry;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();

    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let store = S3Store::new(aws_sdk_s3::Client::new(&config));
    let table = DynamoTable::new(aws_sdk_dynamodb::Client::new(&config));
    let (store, table) = (&store, &table);

    run(service_fn(move |event: LambdaEvent<ApiGatewayV2httpRequest>| async move {
        files::delete_file_handler(store, table, event.payload).await
    }))
    .await
}
