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

use aws_sdk_cognitoidentityprovider::types::{
    ExplicitAuthFlowsType, OAuthFlowType, PreventUserExistenceErrorTypes, TimeUnitsType,
    TokenValidityUnitsType, UserPoolClientType,
};
use tf_provider::value::Value;

use crate::connection::{retry_on_conflict, CognitoError, Connected, Result};
use crate::utils::{
    known_bool, known_i32, known_str, known_strings, owned_number, owned_set, owned_string,
    take_planned, StringSet,
};

use super::state::{ManagedClientState, TokenValidityUnitsState, DEFAULT_UNITS};

fn owned_bool(value: Option<bool>) -> Value<bool> {
    value.map_or(Value::Null, Value::Value)
}

/// An empty remote set stays empty when it was explicitly configured so.
fn remote_set<'a, I, S>(values: I, prior: &StringSet<'_>) -> StringSet<'a>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    match (owned_set(values), prior) {
        (Value::Null, Value::Value(prior)) if prior.is_empty() => Value::Value(Default::default()),
        (set, _) => set,
    }
}

/// Units reported by the service; defaults the configuration left out stay null.
fn remote_units<'a>(
    units: Option<&TokenValidityUnitsType>,
    prior: &Value<TokenValidityUnitsState<'_>>,
) -> Value<TokenValidityUnitsState<'a>> {
    let unit = |get: fn(&TokenValidityUnitsType) -> Option<&TimeUnitsType>, i: usize| {
        units
            .and_then(get)
            .map(|unit| unit.as_str().to_owned())
            .unwrap_or_else(|| DEFAULT_UNITS[i].to_owned())
    };
    let remote = [
        unit(TokenValidityUnitsType::access_token, 0),
        unit(TokenValidityUnitsType::id_token, 1),
        unit(TokenValidityUnitsType::refresh_token, 2),
    ];
    let is_default = |i: usize| remote[i] == DEFAULT_UNITS[i];

    match prior {
        Value::Null if (0..3).all(is_default) => Value::Null,
        Value::Value(prior) => {
            let field = |configured: &Value<_>, i: usize| {
                if configured.is_null() && is_default(i) {
                    Value::Null
                } else {
                    owned_string(Some(&remote[i]))
                }
            };
            Value::Value(TokenValidityUnitsState {
                access_token: field(&prior.access_token, 0),
                id_token: field(&prior.id_token, 1),
                refresh_token: field(&prior.refresh_token, 2),
            })
        }
        _ => Value::Value(TokenValidityUnitsState {
            access_token: owned_string(Some(&remote[0])),
            id_token: owned_string(Some(&remote[1])),
            refresh_token: owned_string(Some(&remote[2])),
        }),
    }
}

impl<'a> ManagedClientState<'a> {
    /// Replace every client setting with the one reported by the service.
    pub(super) fn load_remote(&mut self, client: &UserPoolClientType) {
        if let Some(id) = client.client_id() {
            self.id = owned_string(Some(id));
        }
        if let Some(user_pool_id) = client.user_pool_id() {
            self.user_pool_id = owned_string(Some(user_pool_id));
        }
        self.name = owned_string(client.client_name());
        self.client_secret = owned_string(client.client_secret());
        self.access_token_validity = owned_number(client.access_token_validity());
        self.id_token_validity = owned_number(client.id_token_validity());
        self.refresh_token_validity = owned_number(Some(client.refresh_token_validity()));
        self.auth_session_validity = owned_number(client.auth_session_validity());
        self.allowed_oauth_flows = remote_set(
            client.allowed_o_auth_flows().iter().map(OAuthFlowType::as_str),
            &self.allowed_oauth_flows,
        );
        self.allowed_oauth_flows_user_pool_client =
            owned_bool(client.allowed_o_auth_flows_user_pool_client());
        self.allowed_oauth_scopes =
            remote_set(client.allowed_o_auth_scopes(), &self.allowed_oauth_scopes);
        self.callback_urls = remote_set(client.callback_urls(), &self.callback_urls);
        self.logout_urls = remote_set(client.logout_urls(), &self.logout_urls);
        self.default_redirect_uri = owned_string(client.default_redirect_uri());
        self.enable_token_revocation = owned_bool(client.enable_token_revocation());
        self.enable_propagate_additional_user_context_data =
            owned_bool(client.enable_propagate_additional_user_context_data());
        self.explicit_auth_flows = remote_set(
            client.explicit_auth_flows().iter().map(ExplicitAuthFlowsType::as_str),
            &self.explicit_auth_flows,
        );
        self.prevent_user_existence_errors = owned_string(
            client
                .prevent_user_existence_errors()
                .map(PreventUserExistenceErrorTypes::as_str),
        );
        self.read_attributes = remote_set(client.read_attributes(), &self.read_attributes);
        self.write_attributes = remote_set(client.write_attributes(), &self.write_attributes);
        self.supported_identity_providers = remote_set(
            client.supported_identity_providers(),
            &self.supported_identity_providers,
        );
        self.token_validity_units =
            remote_units(client.token_validity_units(), &self.token_validity_units);
    }

    /// Take every setting `plan` knows and that differs from the current one.
    ///
    /// Returns whether the client must be updated.
    pub(super) fn merge_planned(&mut self, plan: &ManagedClientState<'a>) -> bool {
        let mut dirty = false;
        dirty |= take_planned(&mut self.access_token_validity, &plan.access_token_validity);
        dirty |= take_planned(&mut self.id_token_validity, &plan.id_token_validity);
        dirty |= take_planned(&mut self.refresh_token_validity, &plan.refresh_token_validity);
        dirty |= take_planned(&mut self.auth_session_validity, &plan.auth_session_validity);
        dirty |= take_planned(&mut self.allowed_oauth_flows, &plan.allowed_oauth_flows);
        dirty |= take_planned(
            &mut self.allowed_oauth_flows_user_pool_client,
            &plan.allowed_oauth_flows_user_pool_client,
        );
        dirty |= take_planned(&mut self.allowed_oauth_scopes, &plan.allowed_oauth_scopes);
        dirty |= take_planned(&mut self.callback_urls, &plan.callback_urls);
        dirty |= take_planned(&mut self.logout_urls, &plan.logout_urls);
        dirty |= take_planned(&mut self.default_redirect_uri, &plan.default_redirect_uri);
        dirty |= take_planned(&mut self.enable_token_revocation, &plan.enable_token_revocation);
        dirty |= take_planned(
            &mut self.enable_propagate_additional_user_context_data,
            &plan.enable_propagate_additional_user_context_data,
        );
        dirty |= take_planned(&mut self.explicit_auth_flows, &plan.explicit_auth_flows);
        dirty |= take_planned(
            &mut self.prevent_user_existence_errors,
            &plan.prevent_user_existence_errors,
        );
        dirty |= take_planned(&mut self.read_attributes, &plan.read_attributes);
        dirty |= take_planned(&mut self.write_attributes, &plan.write_attributes);
        dirty |= take_planned(
            &mut self.supported_identity_providers,
            &plan.supported_identity_providers,
        );
        dirty |= take_planned(&mut self.token_validity_units, &plan.token_validity_units);
        dirty
    }

    /// Units to send; a removed block resets them to the service defaults.
    fn units_to_send(&self) -> TokenValidityUnitsType {
        let [access, id, refresh] = match &self.token_validity_units {
            Value::Value(units) => units.resolved(),
            _ => DEFAULT_UNITS,
        };
        TokenValidityUnitsType::builder()
            .access_token(TimeUnitsType::from(access))
            .id_token(TimeUnitsType::from(id))
            .refresh_token(TimeUnitsType::from(refresh))
            .build()
    }
}

pub(super) async fn describe_client(
    connected: &Connected,
    user_pool_id: &str,
    client_id: &str,
) -> Result<Option<UserPoolClientType>> {
    tracing::debug!(user_pool_id, client_id, "DescribeUserPoolClient");
    match connected
        .client
        .describe_user_pool_client()
        .user_pool_id(user_pool_id)
        .client_id(client_id)
        .send()
        .await
        .map_err(CognitoError::from)
    {
        Ok(output) => Ok(output.user_pool_client().cloned()),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

/// Send every setting of `state`: settings left out are reset by the service.
pub(super) async fn update_client(
    connected: &Connected,
    state: &ManagedClientState<'_>,
) -> Result<Option<UserPoolClientType>> {
    let user_pool_id = known_str(&state.user_pool_id).unwrap_or_default();
    let client_id = known_str(&state.id).unwrap_or_default();
    tracing::debug!(user_pool_id, client_id, "UpdateUserPoolClient");

    let client = &connected.client;
    retry_on_conflict(connected.retry, "UpdateUserPoolClient", move || async move {
        let output = client
            .update_user_pool_client()
            .user_pool_id(user_pool_id)
            .client_id(client_id)
            .set_client_name(known_str(&state.name).map(str::to_owned))
            .set_access_token_validity(known_i32(&state.access_token_validity))
            .set_id_token_validity(known_i32(&state.id_token_validity))
            .set_refresh_token_validity(known_i32(&state.refresh_token_validity))
            .set_auth_session_validity(known_i32(&state.auth_session_validity))
            .token_validity_units(state.units_to_send())
            .set_allowed_o_auth_flows(known_strings(&state.allowed_oauth_flows).map(|flows| {
                flows
                    .iter()
                    .map(|flow| OAuthFlowType::from(flow.as_str()))
                    .collect()
            }))
            .set_allowed_o_auth_flows_user_pool_client(known_bool(
                &state.allowed_oauth_flows_user_pool_client,
            ))
            .set_allowed_o_auth_scopes(known_strings(&state.allowed_oauth_scopes))
            .set_callback_urls(known_strings(&state.callback_urls))
            .set_logout_urls(known_strings(&state.logout_urls))
            .set_default_redirect_uri(known_str(&state.default_redirect_uri).map(str::to_owned))
            .set_enable_token_revocation(known_bool(&state.enable_token_revocation))
            .set_enable_propagate_additional_user_context_data(known_bool(
                &state.enable_propagate_additional_user_context_data,
            ))
            .set_explicit_auth_flows(known_strings(&state.explicit_auth_flows).map(|flows| {
                flows
                    .iter()
                    .map(|flow| ExplicitAuthFlowsType::from(flow.as_str()))
                    .collect()
            }))
            .set_prevent_user_existence_errors(
                known_str(&state.prevent_user_existence_errors)
                    .map(PreventUserExistenceErrorTypes::from),
            )
            .set_read_attributes(known_strings(&state.read_attributes))
            .set_write_attributes(known_strings(&state.write_attributes))
            .set_supported_identity_providers(known_strings(&state.supported_identity_providers))
            .send()
            .await?;
        Ok(output.user_pool_client().cloned())
    })
    .await
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;
    use crate::utils::WithNormalize;

    fn remote_client() -> UserPoolClientType {
        UserPoolClientType::builder()
            .user_pool_id("us-east-1_abc")
            .client_id("1a")
            .client_name("AmazonOpenSearchService-domain")
            .refresh_token_validity(30)
            .access_token_validity(1)
            .allowed_o_auth_flows(OAuthFlowType::Code)
            .allowed_o_auth_flows_user_pool_client(true)
            .allowed_o_auth_scopes("openid")
            .callback_urls("https://search.example.com/_dashboards/app/home")
            .supported_identity_providers("COGNITO")
            .build()
    }

    fn plan<'a>() -> ManagedClientState<'a> {
        let mut state = ManagedClientState {
            user_pool_id: Value::Value(Cow::Borrowed("us-east-1_abc")),
            name_prefix: Value::Value(Cow::Borrowed("AmazonOpenSearchService-")),
            ..Default::default()
        };
        state.normalize(&mut Default::default());
        state
    }

    #[test]
    fn unconfigured_settings_keep_remote_values() {
        let plan = plan();
        let mut current = plan.clone();
        current.load_remote(&remote_client());

        assert!(!current.merge_planned(&plan));
        assert_eq!(current.id, Value::Value(Cow::Owned("1a".to_owned())));
        assert_eq!(current.refresh_token_validity, Value::Value(30));
        assert!(current.token_validity_units.is_null());
        assert_eq!(
            known_strings(&current.allowed_oauth_scopes),
            Some(vec!["openid".to_owned()])
        );
    }

    #[test]
    fn user_pool_oauth_flag_follows_remote() {
        let mut current = plan();
        current.load_remote(&remote_client());
        assert_eq!(current.allowed_oauth_flows_user_pool_client, Value::Value(true));

        let bare = UserPoolClientType::builder()
            .user_pool_id("us-east-1_abc")
            .client_id("1a")
            .build();
        current.load_remote(&bare);
        assert!(current.allowed_oauth_flows_user_pool_client.is_null());
    }

    #[test]
    fn differing_planned_settings_mark_dirty() {
        let plan = ManagedClientState {
            access_token_validity: Value::Value(1),
            callback_urls: owned_set(["https://search.example.com/callback"]),
            ..plan()
        };
        let mut current = plan.clone();
        current.load_remote(&remote_client());

        assert!(current.merge_planned(&plan));
        assert_eq!(current.callback_urls, plan.callback_urls);
        // Same as remote: untouched.
        assert_eq!(current.access_token_validity, Value::Value(1));
    }

    #[test]
    fn default_units_are_hidden_unless_configured() {
        let defaults = TokenValidityUnitsType::builder()
            .access_token(TimeUnitsType::Hours)
            .id_token(TimeUnitsType::Hours)
            .refresh_token(TimeUnitsType::Days)
            .build();
        assert!(remote_units(Some(&defaults), &Value::Null).is_null());
        assert!(remote_units(None, &Value::Null).is_null());

        let configured = Value::Value(TokenValidityUnitsState {
            access_token: Value::Value(Cow::Borrowed("hours")),
            ..Default::default()
        });
        assert_eq!(
            remote_units(Some(&defaults), &configured),
            Value::Value(TokenValidityUnitsState {
                access_token: Value::Value(Cow::Owned("hours".to_owned())),
                id_token: Value::Null,
                refresh_token: Value::Null,
            })
        );

        let minutes = TokenValidityUnitsType::builder()
            .access_token(TimeUnitsType::Minutes)
            .build();
        let units = remote_units(Some(&minutes), &Value::Null);
        assert!(matches!(
            units,
            Value::Value(ref units) if units.resolved() == ["minutes", "hours", "days"]
        ));
    }

    #[test]
    fn removed_units_reset_to_defaults() {
        let state = ManagedClientState::default();
        let units = state.units_to_send();
        assert_eq!(units.access_token(), Some(&TimeUnitsType::Hours));
        assert_eq!(units.id_token(), Some(&TimeUnitsType::Hours));
        assert_eq!(units.refresh_token(), Some(&TimeUnitsType::Days));
    }

    #[test]
    fn explicit_empty_set_survives_read() {
        let empty: StringSet = Value::Value(Default::default());
        assert_eq!(remote_set(Vec::<String>::new(), &empty), empty);
        assert!(remote_set(Vec::<String>::new(), &Value::Unknown).is_null());
    }
}
