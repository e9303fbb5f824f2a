use aws_config::BehaviorVersion;
use insight_ai::clients::LexBot;
use insight_ai::handlers::chat::{self, ChatRequest};
use insight_ai::telemetry;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();

    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let bot = LexBot::new(aws_sdk_lexruntimev2::Client::new(&config));
    let bot = &bot;

    run(service_fn(move |event: LambdaEvent<ChatRequest>| async move {
        chat::function_handler(bot, event.payload).await
    }))
    .await
}
