use aws_config::BehaviorVersion;
use aws_lambda_events::apigw::ApiGatewayV2httpRequest;
use insight_ai::clients::ComprehendAnalyzer;
use insight_ai::handlers::analyze;
use insight_ai::telemetry;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();

    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let analyzer = ComprehendAnalyzer::new(aws_sdk_comprehend::Client::new(&config));
    let analyzer = &analyzer;

    run(service_fn(move |event: LambdaEvent<ApiGatewayV2httpRequest>| async move {
        analyze::function_handler(analyzer, event.payload).await
    }))
    .await
}
