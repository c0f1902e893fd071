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
use serde::{Deserialize, Serialize};
use tf_provider::schema::{AttributeConstraint, AttributeType};
use tf_provider::value::{Value, ValueString};
use tf_provider::schema::{Block, Description, Schema};
use tf_provider::{map, AttributePath, Diagnostics};

use crate::utils::{
    attribute, known_bool, known_str, unknown_if_null, WithNormalize, WithSchema, WithValidate,
};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginBrandingState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub user_pool_id: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub client_id: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub settings: ValueString<'a>,
    pub use_cognito_provided_values: Value<bool>,
    #[serde(borrow = "'a")]
    pub managed_login_branding_id: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub settings_all: ValueString<'a>,
}

impl<'a> LoginBrandingState<'a> {
    /// Configured settings as JSON, `None` when absent or unknown.
    pub(super) fn settings_json(&self) -> Option<serde_json::Result<serde_json::Value>> {
        known_str(&self.settings).map(serde_json::from_str)
    }
}

impl<'a> WithSchema for LoginBrandingState<'a> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, Optional, OptionalComputed, Required};
        Schema {
            version: 1,
            block: Block {
                description: Description::plain("Managed login branding style of an app client"),
                attributes: map! {
                    "id" => attribute(AttributeType::String, Computed, "`<user_pool_id>,<managed_login_branding_id>`"),
                    "user_pool_id" => attribute(AttributeType::String, Required, "Id of the user pool"),
                    "client_id" => attribute(AttributeType::String, Required, "Id of the app client"),
                    "settings" => attribute(AttributeType::String, Optional, "JSON document of the branding settings"),
                    "use_cognito_provided_values" => attribute(
                        AttributeType::Bool,
                        OptionalComputed,
                        "Use the default Cognito style instead of `settings`",
                    ),
                    "managed_login_branding_id" => attribute(AttributeType::String, Computed, "Id of the branding style"),
                    "settings_all" => attribute(
                        AttributeType::String,
                        Computed,
                        "Settings merged with the Cognito defaults, as JSON",
                    ),
                },
                ..Default::default()
            },
        }
    }
}

impl<'a> WithNormalize for LoginBrandingState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        unknown_if_null(&mut self.id);
        unknown_if_null(&mut self.managed_login_branding_id);
        unknown_if_null(&mut self.use_cognito_provided_values);
        unknown_if_null(&mut self.settings_all);
    }
}

#[async_trait]
impl<'a> WithValidate for LoginBrandingState<'a> {
    async fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        match self.settings_json() {
            Some(Ok(serde_json::Value::Object(_))) | None => (),
            Some(Ok(_)) => diags.error_short(
                "The settings must be a JSON object",
                attr_path.clone().attribute("settings"),
            ),
            Some(Err(err)) => diags.error(
                "Invalid JSON",
                err.to_string(),
                attr_path.clone().attribute("settings"),
            ),
        }

        if !self.settings.is_null() && known_bool(&self.use_cognito_provided_values) == Some(true)
        {
            diags.error_short(
                "`settings` cannot be set when `use_cognito_provided_values` is true",
                attr_path.attribute("use_cognito_provided_values"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;

    async fn errors(state: LoginBrandingState<'_>) -> usize {
        let mut diags = Diagnostics::default();
        state.validate(&mut diags, Default::default()).await;
        diags.errors.len()
    }

    #[tokio::test]
    async fn settings_must_be_a_json_object() {
        let with = |settings: &'static str| LoginBrandingState {
            settings: Value::Value(Cow::Borrowed(settings)),
            ..Default::default()
        };
        assert_eq!(errors(with(r#"{"categories": {}}"#)).await, 0);
        assert_eq!(errors(with("[1, 2]")).await, 1);
        assert_eq!(errors(with("{not json")).await, 1);
    }

    #[tokio::test]
    async fn settings_exclude_cognito_defaults() {
        let state = LoginBrandingState {
            settings: Value::Value(Cow::Borrowed("{}")),
            use_cognito_provided_values: Value::Value(true),
            ..Default::default()
        };
        assert_eq!(errors(state).await, 1);

        let state = LoginBrandingState {
            use_cognito_provided_values: Value::Value(true),
            ..Default::default()
        };
        assert_eq!(errors(state).await, 0);
    }
}
