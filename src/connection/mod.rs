// This file is part of the terraform-provider-cognito project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::types::AttributeType;
use aws_sdk_cognitoidentityprovider::Client;
use tf_provider::Diagnostics;
use tokio::sync::RwLock;

use crate::attributes::UserAttributeApi;

mod error;
mod retry;

pub use error::{CognitoError, Result};
pub use retry::{retry_on_conflict, RetryPolicy};

/// Client handle shared between the provider and its resources.
///
/// Resources are instantiated before Terraform configures the provider, so the
/// client is filled in later by [`CognitoConnection::configure`].
#[derive(Debug, Default, Clone)]
pub struct CognitoConnection {
    inner: Arc<RwLock<Option<Connected>>>,
}

/// A configured client and the retry policy for concurrent modifications.
#[derive(Debug, Clone)]
pub struct Connected {
    pub client: Client,
    pub retry: RetryPolicy,
}

impl CognitoConnection {
    pub async fn configure(&self, client: Client, retry: RetryPolicy) {
        *self.inner.write().await = Some(Connected { client, retry });
    }

    pub async fn get(&self) -> Result<Connected> {
        self.inner
            .read()
            .await
            .clone()
            .ok_or(CognitoError::NotConfigured)
    }

    /// Same as [`CognitoConnection::get`], reporting the failure in `diags`.
    pub async fn connect(&self, diags: &mut Diagnostics) -> Option<Connected> {
        match self.get().await {
            Ok(connected) => Some(connected),
            Err(err) => {
                diags.root_error("Cognito client unavailable", err.to_string());
                None
            }
        }
    }
}

#[async_trait]
impl UserAttributeApi for Connected {
    async fn update_user_attributes(
        &self,
        user_pool_id: &str,
        username: &str,
        attributes: Vec<(String, String)>,
    ) -> Result<()> {
        let attributes = attributes
            .into_iter()
            .map(|(name, value)| AttributeType::builder().name(name).value(value).build())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tracing::debug!(
            user_pool_id,
            username,
            count = attributes.len(),
            "AdminUpdateUserAttributes"
        );

        let client = &self.client;
        let attributes = &attributes;
        retry_on_conflict(self.retry, "AdminUpdateUserAttributes", move || async move {
            client
                .admin_update_user_attributes()
                .user_pool_id(user_pool_id)
                .username(username)
                .set_user_attributes(Some(attributes.clone()))
                .send()
                .await?;
            Ok(())
        })
        .await
    }

    async fn delete_user_attributes(
        &self,
        user_pool_id: &str,
        username: &str,
        names: Vec<String>,
    ) -> Result<()> {
        tracing::debug!(
            user_pool_id,
            username,
            count = names.len(),
            "AdminDeleteUserAttributes"
        );

        let client = &self.client;
        let names = &names;
        retry_on_conflict(self.retry, "AdminDeleteUserAttributes", move || async move {
            client
                .admin_delete_user_attributes()
                .user_pool_id(user_pool_id)
                .username(username)
                .set_user_attribute_names(Some(names.clone()))
                .send()
                .await?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_connection_reports_root_error() {
        let connection = CognitoConnection::default();
        let mut diags = Diagnostics::default();

        assert!(connection.connect(&mut diags).await.is_none());
        assert_eq!(diags.errors.len(), 1);
        assert!(matches!(
            connection.get().await,
            Err(CognitoError::NotConfigured)
        ));
    }
}
