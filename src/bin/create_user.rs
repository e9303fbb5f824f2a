use aws_config::BehaviorVersion;
use aws_lambda_events::apigw::ApiGatewayV2httpRequest;
use insight_ai::clients::CognitoDirectory;
use insight_ai::handlers::users;
use insight_ai::telemetry;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();

    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let directory = CognitoDirectory::new(aws_sdk_cognitoidentityprovider::Client::new(&config));
    let directory = &directory;

    run(service_fn(move |event: LambdaEvent<ApiGatewayV2httpRequest>| async move {
        users::function_handler(directory, event.payload).await
    }))
    .await
}
