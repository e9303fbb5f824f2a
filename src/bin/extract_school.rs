use aws_config::BehaviorVersion;
use insight_ai::classify::ReportCategory;
use insight_ai::clients::{BedrockModel, DynamoTable, S3Store};
use insight_ai::handlers::extract_metadata;
use insight_ai::model::ExtractionMessage;
use insight_ai::telemetry;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();

    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let model = BedrockModel::new(aws_sdk_bedrockruntime::Client::new(&config));
    let table = DynamoTable::new(aws_sdk_dynamodb::Client::new(&config));
    let store = S3Store::new(aws_sdk_s3::Client::new(&config));
    let (model, table, store) = (&model, &table, &store);

    run(service_fn(move |event: LambdaEvent<ExtractionMessage>| async move {
        extract_metadata::function_handler(
            ReportCategory::School,
            model,
            table,
            store,
            event.payload,
        )
        .await
    }))
    .await
}
