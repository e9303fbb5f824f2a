use async_trait::async_trait;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::InvocationType;
use aws_sdk_lambda::Client;

use super::FunctionInvoker;
use crate::error::{AppError, AppResult};

#[derive(Clone, Debug)]
pub struct LambdaInvoker {
    client: Client,
}

impl LambdaInvoker {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FunctionInvoker for LambdaInvoker {
    async fn invoke_async(&self, function_name: &str, payload: Vec<u8>) -> AppResult<()> {
        let output = self
            .client
            .invoke()
            .function_name(function_name)
            .invocation_type(InvocationType::Event)
            .payload(Blob::new(payload))
            .send()
            .await
            .map_err(|e| AppError::service("lambda.invoke", e))?;

        if let Some(error) = output.function_error() {
            return Err(AppError::Service {
                operation: "lambda.invoke",
                message: format!("{function_name} returned {error}"),
            });
        }
        Ok(())
    }
}
