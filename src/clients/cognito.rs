use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::types::AttributeType;
use aws_sdk_cognitoidentityprovider::Client;

use super::{NewUser, UserDirectory};
use crate::error::{AppError, AppResult};

#[derive(Clone, Debug)]
pub struct CognitoDirectory {
    client: Client,
}

impl CognitoDirectory {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn attribute(name: &str, value: &str) -> AppResult<AttributeType> {
    AttributeType::builder()
        .name(name)
        .value(value)
        .build()
        .map_err(|e| AppError::service("cognito.admin_create_user", e))
}

#[async_trait]
impl UserDirectory for CognitoDirectory {
    async fn email_exists(&self, user_pool_id: &str, email: &str) -> AppResult<bool> {
        let output = self
            .client
            .list_users()
            .user_pool_id(user_pool_id)
            .filter(format!("email = \"{}\"", email.replace('"', "")))
            .limit(1)
            .send()
            .await
            .map_err(|e| AppError::service("cognito.list_users", e))?;
        Ok(!output.users().is_empty())
    }

    async fn create_user(&self, user_pool_id: &str, user: &NewUser) -> AppResult<()> {
        self.client
            .admin_create_user()
            .user_pool_id(user_pool_id)
            .username(&user.email)
            .temporary_password(&user.password)
            .user_attributes(attribute("email", &user.email)?)
            .user_attributes(attribute("email_verified", "true")?)
            .user_attributes(attribute("name", &user.name)?)
            .send()
            .await
            .map_err(|e| AppError::service("cognito.admin_create_user", e))?;

        self.client
            .admin_set_user_password()
            .user_pool_id(user_pool_id)
            .username(&user.email)
            .password(&user.password)
            .permanent(true)
            .send()
            .await
            .map_err(|e| AppError::service("cognito.admin_set_user_password", e))?;
        Ok(())
    }
}
