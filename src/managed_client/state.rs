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

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::schema::{AttributeConstraint, AttributeType};
use tf_provider::value::{Value, ValueNumber, ValueString};
use tf_provider::schema::{Block, Description, Schema};
use tf_provider::{map, AttributePath, Diagnostics};

use crate::utils::{
    attribute, check_length, check_one_of, check_set_size, known_i32, known_str,
    sensitive_attribute, string_set_type, unknown_if_null, StringSet, WithNormalize, WithSchema,
    WithValidate,
};

const TIME_UNITS: &[&str] = &["seconds", "minutes", "hours", "days"];
const OAUTH_FLOWS: &[&str] = &["code", "implicit", "client_credentials"];
const EXPLICIT_AUTH_FLOWS: &[&str] = &[
    "ADMIN_NO_SRP_AUTH",
    "CUSTOM_AUTH_FLOW_ONLY",
    "USER_PASSWORD_AUTH",
    "ALLOW_ADMIN_USER_PASSWORD_AUTH",
    "ALLOW_CUSTOM_AUTH",
    "ALLOW_USER_PASSWORD_AUTH",
    "ALLOW_USER_SRP_AUTH",
    "ALLOW_REFRESH_TOKEN_AUTH",
    "ALLOW_USER_AUTH",
];
const PREVENT_USER_EXISTENCE_ERRORS: &[&str] = &["LEGACY", "ENABLED"];

/// Units applied by the service when none are configured.
pub(super) const DEFAULT_UNITS: [&str; 3] = ["hours", "hours", "days"];

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenValidityUnitsState<'a> {
    #[serde(borrow = "'a")]
    pub access_token: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub id_token: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub refresh_token: ValueString<'a>,
}

impl<'a> TokenValidityUnitsState<'a> {
    /// Configured units, falling back to the service defaults.
    pub(super) fn resolved(&self) -> [&str; 3] {
        [
            known_str(&self.access_token).unwrap_or(DEFAULT_UNITS[0]),
            known_str(&self.id_token).unwrap_or(DEFAULT_UNITS[1]),
            known_str(&self.refresh_token).unwrap_or(DEFAULT_UNITS[2]),
        ]
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedClientState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub user_pool_id: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub name_prefix: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub name_pattern: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub name: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub client_secret: ValueString<'a>,
    pub access_token_validity: ValueNumber,
    pub id_token_validity: ValueNumber,
    pub refresh_token_validity: ValueNumber,
    pub auth_session_validity: ValueNumber,
    #[serde(borrow = "'a")]
    pub allowed_oauth_flows: StringSet<'a>,
    pub allowed_oauth_flows_user_pool_client: Value<bool>,
    #[serde(borrow = "'a")]
    pub allowed_oauth_scopes: StringSet<'a>,
    #[serde(borrow = "'a")]
    pub callback_urls: StringSet<'a>,
    #[serde(borrow = "'a")]
    pub logout_urls: StringSet<'a>,
    #[serde(borrow = "'a")]
    pub default_redirect_uri: ValueString<'a>,
    pub enable_token_revocation: Value<bool>,
    pub enable_propagate_additional_user_context_data: Value<bool>,
    #[serde(borrow = "'a")]
    pub explicit_auth_flows: StringSet<'a>,
    #[serde(borrow = "'a")]
    pub prevent_user_existence_errors: ValueString<'a>,
    #[serde(borrow = "'a")]
    pub read_attributes: StringSet<'a>,
    #[serde(borrow = "'a")]
    pub write_attributes: StringSet<'a>,
    #[serde(borrow = "'a")]
    pub supported_identity_providers: StringSet<'a>,
    #[serde(borrow = "'a")]
    pub token_validity_units: Value<TokenValidityUnitsState<'a>>,
}

impl<'a> WithSchema for ManagedClientState<'a> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, Optional, OptionalComputed, Required};
        let units_type = AttributeType::Object(HashMap::from([
            ("access_token".to_owned(), AttributeType::String),
            ("id_token".to_owned(), AttributeType::String),
            ("refresh_token".to_owned(), AttributeType::String),
        ]));
        Schema {
            version: 1,
            block: Block {
                description: Description::plain(
                    "App client created by another service, adopted and configured in place",
                ),
                attributes: map! {
                    "id" => attribute(AttributeType::String, Computed, "Id of the app client"),
                    "user_pool_id" => attribute(AttributeType::String, Required, "Id of the user pool"),
                    "name_prefix" => attribute(AttributeType::String, Optional, "Prefix of the client name to adopt"),
                    "name_pattern" => attribute(AttributeType::String, Optional, "Regular expression matching the client name to adopt"),
                    "name" => attribute(AttributeType::String, Computed, "Name of the adopted client"),
                    "client_secret" => sensitive_attribute(AttributeType::String, Computed, "Secret of the client"),
                    "access_token_validity" => attribute(AttributeType::Number, OptionalComputed, "Access token lifetime"),
                    "id_token_validity" => attribute(AttributeType::Number, OptionalComputed, "Id token lifetime"),
                    "refresh_token_validity" => attribute(AttributeType::Number, OptionalComputed, "Refresh token lifetime"),
                    "auth_session_validity" => attribute(AttributeType::Number, OptionalComputed, "Session token lifetime, in minutes (3-15)"),
                    "allowed_oauth_flows" => attribute(string_set_type(), OptionalComputed, "`code`, `implicit` or `client_credentials`"),
                    "allowed_oauth_flows_user_pool_client" => attribute(AttributeType::Bool, OptionalComputed, "Whether the client may use OAuth"),
                    "allowed_oauth_scopes" => attribute(string_set_type(), OptionalComputed, "Allowed OAuth scopes"),
                    "callback_urls" => attribute(string_set_type(), OptionalComputed, "Allowed redirect URLs"),
                    "logout_urls" => attribute(string_set_type(), OptionalComputed, "Allowed sign-out URLs"),
                    "default_redirect_uri" => attribute(AttributeType::String, OptionalComputed, "Default redirect URL"),
                    "enable_token_revocation" => attribute(AttributeType::Bool, OptionalComputed, "Whether tokens can be revoked"),
                    "enable_propagate_additional_user_context_data" => attribute(
                        AttributeType::Bool,
                        OptionalComputed,
                        "Whether context data is propagated to threat protection",
                    ),
                    "explicit_auth_flows" => attribute(string_set_type(), OptionalComputed, "Allowed authentication flows"),
                    "prevent_user_existence_errors" => attribute(AttributeType::String, OptionalComputed, "`LEGACY` or `ENABLED`"),
                    "read_attributes" => attribute(string_set_type(), OptionalComputed, "User attributes the client can read"),
                    "write_attributes" => attribute(string_set_type(), OptionalComputed, "User attributes the client can write"),
                    "supported_identity_providers" => attribute(string_set_type(), OptionalComputed, "Identity providers of the client"),
                    "token_validity_units" => attribute(
                        units_type,
                        Optional,
                        "Units of the token validities (`seconds`, `minutes`, `hours` or `days`)",
                    ),
                },
                ..Default::default()
            },
        }
    }
}

impl<'a> WithNormalize for ManagedClientState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        unknown_if_null(&mut self.id);
        unknown_if_null(&mut self.name);
        unknown_if_null(&mut self.client_secret);
        unknown_if_null(&mut self.access_token_validity);
        unknown_if_null(&mut self.id_token_validity);
        unknown_if_null(&mut self.refresh_token_validity);
        unknown_if_null(&mut self.auth_session_validity);
        unknown_if_null(&mut self.allowed_oauth_flows);
        unknown_if_null(&mut self.allowed_oauth_flows_user_pool_client);
        unknown_if_null(&mut self.allowed_oauth_scopes);
        unknown_if_null(&mut self.callback_urls);
        unknown_if_null(&mut self.logout_urls);
        unknown_if_null(&mut self.default_redirect_uri);
        unknown_if_null(&mut self.enable_token_revocation);
        unknown_if_null(&mut self.enable_propagate_additional_user_context_data);
        unknown_if_null(&mut self.explicit_auth_flows);
        unknown_if_null(&mut self.prevent_user_existence_errors);
        unknown_if_null(&mut self.read_attributes);
        unknown_if_null(&mut self.write_attributes);
        unknown_if_null(&mut self.supported_identity_providers);
    }
}

/// Accepted lifetime of a token.
struct Validity {
    attr: &'static str,
    min: Duration,
    max: Duration,
}

const VALIDITIES: [Validity; 3] = [
    Validity {
        attr: "access_token_validity",
        min: Duration::from_secs(5 * 60),
        max: Duration::from_secs(24 * 3600),
    },
    Validity {
        attr: "id_token_validity",
        min: Duration::from_secs(5 * 60),
        max: Duration::from_secs(24 * 3600),
    },
    Validity {
        attr: "refresh_token_validity",
        min: Duration::from_secs(60 * 60),
        max: Duration::from_secs(315_360_000),
    },
];

fn unit_duration(unit: &str) -> Option<Duration> {
    match unit {
        "seconds" => Some(Duration::from_secs(1)),
        "minutes" => Some(Duration::from_secs(60)),
        "hours" => Some(Duration::from_secs(3600)),
        "days" => Some(Duration::from_secs(24 * 3600)),
        _ => None,
    }
}

impl<'a> ManagedClientState<'a> {
    fn units(&self) -> Option<[&str; 3]> {
        match &self.token_validity_units {
            Value::Value(units) => Some(units.resolved()),
            Value::Null => Some(DEFAULT_UNITS),
            Value::Unknown => None,
        }
    }

    fn validate_validities(&self, diags: &mut Diagnostics, attr_path: &AttributePath) {
        let Some(units) = self.units() else {
            return;
        };
        let values = [
            &self.access_token_validity,
            &self.id_token_validity,
            &self.refresh_token_validity,
        ];
        for ((validity, value), unit) in VALIDITIES.iter().zip(values).zip(units) {
            let (Some(value), Some(unit_len)) = (known_i32(value), unit_duration(unit)) else {
                continue;
            };
            let duration = unit_len.saturating_mul(value.max(0) as u32);
            if value < 0 || duration < validity.min || duration > validity.max {
                diags.error(
                    "Invalid token validity",
                    format!(
                        "The validity must last between {}s and {}s, got {value} {unit}.",
                        validity.min.as_secs(),
                        validity.max.as_secs(),
                    ),
                    attr_path.clone().attribute(validity.attr),
                );
            }
        }
    }
}

fn check_set_elements(
    diags: &mut Diagnostics,
    attr_path: AttributePath,
    value: &StringSet<'_>,
    allowed: &[&str],
) {
    if let Value::Value(set) = value {
        for element in set {
            check_one_of(diags, attr_path.clone(), element, allowed);
        }
    }
}

#[async_trait]
impl<'a> WithValidate for ManagedClientState<'a> {
    async fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        match (&self.name_prefix, &self.name_pattern) {
            (Value::Null, Value::Null) => diags.error_short(
                "One of `name_prefix` or `name_pattern` must be set",
                attr_path.clone().attribute("name_prefix"),
            ),
            (Value::Null, _) | (_, Value::Null) => (),
            _ => diags.error_short(
                "`name_prefix` and `name_pattern` are mutually exclusive",
                attr_path.clone().attribute("name_pattern"),
            ),
        }
        check_length(
            diags,
            attr_path.clone().attribute("name_prefix"),
            &self.name_prefix,
            1,
            128,
        );
        if let Some(pattern) = known_str(&self.name_pattern) {
            if let Err(err) = regex::Regex::new(pattern) {
                diags.error(
                    "Invalid regular expression",
                    err.to_string(),
                    attr_path.clone().attribute("name_pattern"),
                );
            }
        }

        self.validate_validities(diags, &attr_path);
        if let Some(minutes) = known_i32(&self.auth_session_validity) {
            if !(3..=15).contains(&minutes) {
                diags.error(
                    "Invalid session validity",
                    format!("The session validity must be between 3 and 15 minutes, got {minutes}."),
                    attr_path.clone().attribute("auth_session_validity"),
                );
            }
        }

        let path = attr_path.clone().attribute("allowed_oauth_flows");
        check_set_size(diags, path.clone(), &self.allowed_oauth_flows, 3);
        check_set_elements(diags, path, &self.allowed_oauth_flows, OAUTH_FLOWS);
        check_set_size(
            diags,
            attr_path.clone().attribute("allowed_oauth_scopes"),
            &self.allowed_oauth_scopes,
            50,
        );
        check_set_size(
            diags,
            attr_path.clone().attribute("callback_urls"),
            &self.callback_urls,
            100,
        );
        check_set_size(
            diags,
            attr_path.clone().attribute("logout_urls"),
            &self.logout_urls,
            100,
        );
        check_set_elements(
            diags,
            attr_path.clone().attribute("explicit_auth_flows"),
            &self.explicit_auth_flows,
            EXPLICIT_AUTH_FLOWS,
        );
        check_one_of(
            diags,
            attr_path.clone().attribute("prevent_user_existence_errors"),
            &self.prevent_user_existence_errors,
            PREVENT_USER_EXISTENCE_ERRORS,
        );

        if let Value::Value(units) = &self.token_validity_units {
            let path = attr_path.attribute("token_validity_units");
            for (name, unit) in [
                ("access_token", &units.access_token),
                ("id_token", &units.id_token),
                ("refresh_token", &units.refresh_token),
            ] {
                check_one_of(diags, path.clone().attribute(name), unit, TIME_UNITS);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;

    fn base<'a>() -> ManagedClientState<'a> {
        ManagedClientState {
            user_pool_id: Value::Value(Cow::Borrowed("us-east-1_abc")),
            name_prefix: Value::Value(Cow::Borrowed("AmazonOpenSearchService-")),
            ..Default::default()
        }
    }

    async fn errors(state: &ManagedClientState<'_>) -> usize {
        let mut diags = Diagnostics::default();
        state.validate(&mut diags, Default::default()).await;
        diags.errors.len()
    }

    #[tokio::test]
    async fn exactly_one_name_filter() {
        assert_eq!(errors(&base()).await, 0);

        let neither = ManagedClientState {
            name_prefix: Value::Null,
            ..base()
        };
        assert_eq!(errors(&neither).await, 1);

        let both = ManagedClientState {
            name_pattern: Value::Value(Cow::Borrowed("^Amazon.*$")),
            ..base()
        };
        assert_eq!(errors(&both).await, 1);

        let unknown = ManagedClientState {
            name_prefix: Value::Unknown,
            ..base()
        };
        assert_eq!(errors(&unknown).await, 0);
    }

    #[tokio::test]
    async fn invalid_pattern_is_reported() {
        let state = ManagedClientState {
            name_prefix: Value::Null,
            name_pattern: Value::Value(Cow::Borrowed("(unclosed")),
            ..base()
        };
        assert_eq!(errors(&state).await, 1);
    }

    #[tokio::test]
    async fn validities_use_configured_units() {
        // 30 hours exceeds a day.
        let state = ManagedClientState {
            access_token_validity: Value::Value(30),
            ..base()
        };
        assert_eq!(errors(&state).await, 1);

        let state = ManagedClientState {
            access_token_validity: Value::Value(30),
            token_validity_units: Value::Value(TokenValidityUnitsState {
                access_token: Value::Value(Cow::Borrowed("minutes")),
                ..Default::default()
            }),
            ..base()
        };
        assert_eq!(errors(&state).await, 0);

        // Refresh tokens default to days.
        let state = ManagedClientState {
            refresh_token_validity: Value::Value(30),
            ..base()
        };
        assert_eq!(errors(&state).await, 0);
    }

    #[tokio::test]
    async fn session_validity_and_flows_are_bounded() {
        let state = ManagedClientState {
            auth_session_validity: Value::Value(20),
            allowed_oauth_flows: Value::Value(
                [Value::Value(Cow::Borrowed("password"))].into_iter().collect(),
            ),
            ..base()
        };
        assert_eq!(errors(&state).await, 2);
    }
}
