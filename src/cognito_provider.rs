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

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_cognitoidentityprovider::Client;
use serde::{Deserialize, Serialize};

use tf_provider::schema::{AttributeConstraint, AttributeType};
use tf_provider::value::{Value, ValueNumber, ValueString};
use tf_provider::schema::{Block, Description, Schema};
use tf_provider::{map, AttributePath, Provider};

use crate::{
    connection::{CognitoConnection, RetryPolicy},
    identity_provider::IdentityProviderResource,
    login_branding::ManagedLoginBrandingResource,
    managed_client::ManagedUserPoolClientResource,
    resource_server::ResourceServerResource,
    user::UserResource,
    utils::{attribute, known_str},
};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig<'a> {
    #[serde(borrow = "'a")]
    pub region: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub profile: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub endpoint: ValueString<'a>,
    pub max_retries: ValueNumber,
}

#[derive(Debug, Default, Clone)]
pub struct CognitoProvider {
    connection: CognitoConnection,
}

#[async_trait]
impl Provider for CognitoProvider {
    type Config<'a> = ProviderConfig<'a>;
    type MetaState<'a> = tf_provider::value::ValueEmpty;

    fn schema(&self, _diags: &mut tf_provider::Diagnostics) -> Option<tf_provider::schema::Schema> {
        use AttributeConstraint::Optional;
        Some(Schema {
            version: 1,
            block: Block {
                description: Description::plain("cognito"),
                attributes: map! {
                    "region" => attribute(AttributeType::String, Optional, "AWS region, defaults to the environment"),
                    "profile" => attribute(AttributeType::String, Optional, "Shared configuration profile"),
                    "endpoint" => attribute(AttributeType::String, Optional, "Override of the Cognito endpoint URL"),
                    "max_retries" => attribute(
                        AttributeType::Number,
                        Optional,
                        "Attempts on concurrent modification errors (default 5)",
                    ),
                },
                ..Default::default()
            },
        })
    }

    async fn validate<'a>(
        &self,
        diags: &mut tf_provider::Diagnostics,
        config: Self::Config<'a>,
    ) -> Option<()> {
        if let Value::Value(max_retries) = config.max_retries {
            if !(1..=20).contains(&max_retries) {
                diags.error(
                    "Invalid `max_retries`",
                    format!("`max_retries` must be between 1 and 20, got {max_retries}"),
                    AttributePath::new("max_retries"),
                );
            }
        }
        if let Some(endpoint) = known_str(&config.endpoint) {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                diags.error_short(
                    "`endpoint` must be an http(s) URL",
                    AttributePath::new("endpoint"),
                );
            }
        }

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn configure<'a>(
        &self,
        diags: &mut tf_provider::Diagnostics,
        terraform_version: String,
        config: Self::Config<'a>,
    ) -> Option<()> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = known_str(&config.region) {
            loader = loader.region(Region::new(region.to_owned()));
        }
        if let Some(profile) = known_str(&config.profile) {
            loader = loader.profile_name(profile);
        }
        if let Some(endpoint) = known_str(&config.endpoint) {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let Some(region) = sdk_config.region() else {
            diags.root_error(
                "Missing AWS region",
                "Set `region` in the provider block or configure a default region in the environment.",
            );
            return None;
        };
        tracing::info!(%terraform_version, region = region.as_ref(), "configuring cognito provider");

        let mut retry = RetryPolicy::default();
        if let Value::Value(max_retries) = config.max_retries {
            retry = retry.with_max_attempts(max_retries.clamp(1, 20) as u32);
        }
        self.connection
            .configure(Client::new(&sdk_config), retry)
            .await;
        Some(())
    }

    fn get_resources(
        &self,
        _diags: &mut tf_provider::Diagnostics,
    ) -> Option<std::collections::HashMap<String, Box<dyn tf_provider::DynamicResource>>>
    {
        let connection = &self.connection;
        Some(map! {
            "user" => UserResource::new(connection.clone()),
            "identity_provider" => IdentityProviderResource::new(connection.clone()),
            "resource_server" => ResourceServerResource::new(connection.clone()),
            "managed_user_pool_client" => ManagedUserPoolClientResource::new(connection.clone()),
            "managed_login_branding" => ManagedLoginBrandingResource::new(connection.clone()),
        })
    }

    fn get_data_sources(
        &self,
        _diags: &mut tf_provider::Diagnostics,
    ) -> Option<
        std::collections::HashMap<String, Box<dyn tf_provider::DynamicDataSource>>,
    > {
        Some(map! {})
    }
}
