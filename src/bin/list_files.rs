use aws_config::BehaviorVersion;
use aws_lambda_events::apigw::ApiGatewayV2httpRequest;
use insight_ai::clients::DynamoTable;
use insight_ai::handlers::files;
use insight_ai::telemetry;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();

    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let table = DynamoTable::new(aws_sdk_dynamodb::Client::new(&config));
    let table = &table;

    run(service_fn(move |event: LambdaEvent<ApiGatewayV2httpRequest>| async move {
        files::list_files_handler(table, event.payload).await
    }))
    .await
}
