//! Admin-side user creation in the Cognito user pool.

use aws_lambda_events::apigw::{ApiGatewayV2httpRequest, ApiGatewayV2httpResponse};
use lambda_runtime::Error;
use serde::Deserialize;
use tracing::info;

use crate::api::{self, ApiResponse};
use crate::clients::{NewUser, UserDirectory};
use crate::config::UserPoolConfig;
use crate::error::{AppError, AppResult};
use crate::handlers::{required_field, respond};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub temp_password: Option<String>,
    pub name: Option<String>,
}

impl CreateUserRequest {
    fn into_user(self) -> AppResult<NewUser> {
        match (
            required_field(self.email),
            required_field(self.name),
            self.temp_password.filter(|p| !p.is_empty()),
        ) {
            (Some(email), Some(name), Some(password)) => Ok(NewUser {
                email,
                name,
                password,
            }),
            _ => Err(AppError::invalid(
                "Missing required fields: email, name, or password.",
            )),
        }
    }
}

pub async fn function_handler(
    directory: &dyn UserDirectory,
    request: ApiGatewayV2httpRequest,
) -> Result<ApiGatewayV2httpResponse, Error> {
    Ok(respond(handle(directory, &request).await))
}

async fn handle(
    directory: &dyn UserDirectory,
    request: &ApiGatewayV2httpRequest,
) -> AppResult<ApiGatewayV2httpResponse> {
    let config = UserPoolConfig::from_env()?;
    let body: CreateUserRequest = api::parse_body(request)?;
    create_user(&config, directory, body).await?;
    Ok(api::json_response(
        201,
        &ApiResponse::message("User created successfully."),
    ))
}

pub async fn create_user(
    config: &UserPoolConfig,
    directory: &dyn UserDirectory,
    request: CreateUserRequest,
) -> AppResult<()> {
    let user = request.into_user()?;
    if directory.email_exists(&config.user_pool_id, &user.email).await? {
        return Err(AppError::invalid("Email already exists."));
    }
    directory.create_user(&config.user_pool_id, &user).await?;
    info!(email = %user.email, "created user");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDirectory;

    fn config() -> UserPoolConfig {
        UserPoolConfig {
            user_pool_id: "pool-1".into(),
        }
    }

    fn request(email: &str, password: &str, name: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: Some(email.into()),
            temp_password: Some(password.into()),
            name: Some(name.into()),
        }
    }

    #[tokio::test]
    async fn new_users_are_created_in_the_pool() {
        let directory = FakeDirectory::default();

        create_user(&config(), &directory, request("a@example.com", "Secret#1", "Amal"))
            .await
            .unwrap();

        let created = directory.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].0, "pool-1");
        assert_eq!(created[0].1.name, "Amal");
    }

    #[tokio::test]
    async fn existing_emails_are_rejected() {
        let directory = FakeDirectory {
            existing: vec!["a@example.com".into()],
            ..Default::default()
        };

        let err = create_user(&config(), &directory, request("a@example.com", "Secret#1", "Amal"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Email already exists.");
        assert!(directory.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn every_field_is_required() {
        let err = create_user(&config(), &FakeDirectory::default(), request("a@example.com", "", "Amal"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
