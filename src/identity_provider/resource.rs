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

use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::types::IdentityProviderTypeType;

use tf_provider::value::{Value, ValueEmpty};
use tf_provider::{schema::Schema, AttributePath, Diagnostics, Resource};

use crate::connection::{retry_on_conflict, CognitoConnection, CognitoError, Connected, Result};
use crate::utils::{
    known_list, known_map, known_str, owned_map, owned_string, split_id, StringMap,
    WithNormalize, WithSchema, WithValidate,
};

use super::state::IdentityProviderState;

/// Provider detail managed by the service for SAML providers.
const ACTIVE_ENCRYPTION_CERTIFICATE: &str = "ActiveEncryptionCertificate";

#[derive(Debug, Default, Clone)]
pub struct IdentityProviderResource {
    connection: CognitoConnection,
}

impl IdentityProviderResource {
    pub fn new(connection: CognitoConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl Resource for IdentityProviderResource {
    type State<'a> = IdentityProviderState<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(IdentityProviderState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        config.validate(diags, Default::default()).await;

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let connected = self.connection.connect(diags).await?;

        let mut state = state;
        match state.read(&connected).await {
            Ok(true) => Some((state, private_state)),
            Ok(false) => {
                tracing::warn!(
                    id = state.id.as_str(),
                    "identity provider not found, removing from state"
                );
                diags.root_warning(
                    "Identity provider not found",
                    format!(
                        "The identity provider `{}` does not exist anymore and has been removed from the state.",
                        state.id.as_str()
                    ),
                );
                None
            }
            Err(err) => {
                diags.root_error("Failed to read identity provider", err.to_string());
                None
            }
        }
    }

    async fn plan_create<'a>(
        &self,
        diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = proposed_state;
        state.normalize(diags);
        if let (Some(pool), Some(name)) = (
            known_str(&state.user_pool_id),
            known_str(&state.provider_name),
        ) {
            state.id = owned_string(Some(&format!("{pool}:{name}")));
        }
        Some((state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(
        Self::State<'a>,
        Self::PrivateState<'a>,
        Vec<tf_provider::AttributePath>,
    )> {
        let trigger_replace = [
            ("user_pool_id", prior_state.user_pool_id != proposed_state.user_pool_id),
            ("provider_name", prior_state.provider_name != proposed_state.provider_name),
            ("provider_type", prior_state.provider_type != proposed_state.provider_type),
        ]
        .into_iter()
        .filter(|(_, changed)| *changed)
        .map(|(name, _)| AttributePath::new(name))
        .collect();

        let mut state = proposed_state;
        state.normalize(diags);
        Some((state, prior_private_state, trigger_replace))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::PrivateState<'a>> {
        Some(prior_private_state)
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let connected = self.connection.connect(diags).await?;
        let mut state = planned_state;

        let user_pool_id = known_str(&state.user_pool_id).unwrap_or_default();
        let provider_name = known_str(&state.provider_name).unwrap_or_default();
        tracing::debug!(user_pool_id, provider_name, "CreateIdentityProvider");
        let result = connected
            .client
            .create_identity_provider()
            .user_pool_id(user_pool_id)
            .provider_name(provider_name)
            .provider_type(IdentityProviderTypeType::from(
                known_str(&state.provider_type).unwrap_or_default(),
            ))
            .set_provider_details(known_map(&state.provider_details))
            .set_attribute_mapping(known_map(&state.attribute_mapping))
            .set_idp_identifiers(known_list(&state.idp_identifiers))
            .send()
            .await;
        if let Err(err) = result {
            diags.root_error(
                "Failed to create identity provider",
                CognitoError::from(err).to_string(),
            );
            return None;
        }
        tracing::info!(id = state.id.as_str(), "identity provider created");

        match state.read(&connected).await {
            Ok(true) => Some((state, private_state)),
            Ok(false) => {
                diags.root_error(
                    "Failed to read created identity provider",
                    "The identity provider disappeared right after its creation.",
                );
                None
            }
            Err(err) => {
                diags.root_error("Failed to read created identity provider", err.to_string());
                None
            }
        }
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let connected = self.connection.connect(diags).await?;
        let mut state = planned_state;

        let provider_details = changed(&prior_state.provider_details, &state.provider_details)
            .then(|| known_map(&state.provider_details).unwrap_or_default());
        let attribute_mapping = changed(&prior_state.attribute_mapping, &state.attribute_mapping)
            .then(|| known_map(&state.attribute_mapping).unwrap_or_default());
        let idp_identifiers = (prior_state.idp_identifiers != state.idp_identifiers)
            .then(|| known_list(&state.idp_identifiers).unwrap_or_default());

        if provider_details.is_some() || attribute_mapping.is_some() || idp_identifiers.is_some() {
            let user_pool_id = known_str(&state.user_pool_id).unwrap_or_default();
            let provider_name = known_str(&state.provider_name).unwrap_or_default();
            tracing::debug!(user_pool_id, provider_name, "UpdateIdentityProvider");

            let client = &connected.client;
            let (provider_details, attribute_mapping, idp_identifiers) =
                (&provider_details, &attribute_mapping, &idp_identifiers);
            let result = retry_on_conflict(connected.retry, "UpdateIdentityProvider", move || async move {
                client
                    .update_identity_provider()
                    .user_pool_id(user_pool_id)
                    .provider_name(provider_name)
                    .set_provider_details(provider_details.clone())
                    .set_attribute_mapping(attribute_mapping.clone())
                    .set_idp_identifiers(idp_identifiers.clone())
                    .send()
                    .await?;
                Ok(())
            })
            .await;
            if let Err(err) = result {
                diags.root_error("Failed to update identity provider", err.to_string());
                return None;
            }
        }

        match state.read(&connected).await {
            Ok(true) => Some((state, private_state)),
            Ok(false) => {
                diags.root_error(
                    "Failed to read updated identity provider",
                    "The identity provider disappeared during its update.",
                );
                None
            }
            Err(err) => {
                diags.root_error("Failed to read updated identity provider", err.to_string());
                None
            }
        }
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        _planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        let connected = self.connection.connect(diags).await?;
        let user_pool_id = known_str(&state.user_pool_id).unwrap_or_default();
        let provider_name = known_str(&state.provider_name).unwrap_or_default();

        tracing::debug!(user_pool_id, provider_name, "DeleteIdentityProvider");
        let result = connected
            .client
            .delete_identity_provider()
            .user_pool_id(user_pool_id)
            .provider_name(provider_name)
            .send()
            .await
            .map_err(CognitoError::from);

        match result {
            Ok(_) => Some(()),
            Err(err) if err.is_not_found() => Some(()),
            Err(err) => {
                diags.root_error("Failed to delete identity provider", err.to_string());
                None
            }
        }
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let Some([user_pool_id, provider_name]) = split_id::<2>(&id, ':') else {
            diags.root_error(
                "Invalid import id",
                format!("Expected `<user_pool_id>:<provider_name>`, got `{id}`."),
            );
            return None;
        };

        let state = IdentityProviderState {
            id: owned_string(Some(&id)),
            user_pool_id: owned_string(Some(user_pool_id)),
            provider_name: owned_string(Some(provider_name)),
            ..Default::default()
        };
        Some((state, Default::default()))
    }
}

impl<'a> IdentityProviderState<'a> {
    async fn read(&mut self, connected: &Connected) -> Result<bool> {
        let user_pool_id = known_str(&self.user_pool_id).unwrap_or_default();
        let provider_name = known_str(&self.provider_name).unwrap_or_default();

        tracing::debug!(user_pool_id, provider_name, "DescribeIdentityProvider");
        let output = match connected
            .client
            .describe_identity_provider()
            .user_pool_id(user_pool_id)
            .provider_name(provider_name)
            .send()
            .await
            .map_err(CognitoError::from)
        {
            Ok(output) => output,
            Err(err) if err.is_not_found() => return Ok(false),
            Err(err) => return Err(err),
        };
        let Some(idp) = output.identity_provider() else {
            return Ok(false);
        };

        let mut details = idp.provider_details().cloned().unwrap_or_default();
        details.remove(ACTIVE_ENCRYPTION_CERTIFICATE);

        self.provider_type = owned_string(idp.provider_type().map(|t| t.as_str()));
        self.provider_details = restrict_to_configured(details, &self.provider_details);
        self.attribute_mapping = restrict_to_configured(
            idp.attribute_mapping().cloned().unwrap_or_default(),
            &self.attribute_mapping,
        );
        self.idp_identifiers = if idp.idp_identifiers().is_empty() && self.idp_identifiers.is_null() {
            Value::Null
        } else {
            Value::Value(
                idp.idp_identifiers()
                    .iter()
                    .map(|s| owned_string(Some(s)))
                    .collect(),
            )
        };
        if self.id.is_null() || self.id.is_unknown() {
            self.id = owned_string(Some(&format!("{user_pool_id}:{provider_name}")));
        }

        Ok(true)
    }
}

fn changed(prior: &StringMap<'_>, planned: &StringMap<'_>) -> bool {
    !planned.is_unknown() && prior != planned
}

/// Keep only the entries the configuration manages.
///
/// The service fills in defaults (endpoints, `username` mapping, ...) that the
/// configuration never mentions; they are reported only when nothing is known
/// about the configured entries (import).
fn restrict_to_configured<'a>(
    remote: HashMap<String, String>,
    configured: &StringMap<'_>,
) -> StringMap<'a> {
    match configured {
        Value::Value(configured) => owned_map(
            remote
                .into_iter()
                .filter(|(k, _)| configured.contains_key(k.as_str())),
        ),
        _ => owned_map(remote),
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn restrict_keeps_configured_keys_only() {
        let remote = HashMap::from([
            ("client_id".to_owned(), "abc".to_owned()),
            ("authorize_url".to_owned(), "https://accounts.google.com".to_owned()),
        ]);
        let configured: StringMap = Value::Value(BTreeMap::from([(
            Cow::Borrowed("client_id"),
            Value::Value(Cow::Borrowed("old")),
        )]));

        let restricted = known_map(&restrict_to_configured(remote.clone(), &configured));
        assert_eq!(
            restricted,
            Some(HashMap::from([("client_id".to_owned(), "abc".to_owned())]))
        );

        let all = known_map(&restrict_to_configured(remote.clone(), &Value::Null));
        assert_eq!(all, Some(remote));
    }

    #[test]
    fn unknown_plan_is_not_a_change() {
        let prior: StringMap = Value::Value(BTreeMap::new());
        assert!(!changed(&prior, &Value::Unknown));
        assert!(changed(&prior, &Value::Null));
        assert!(!changed(&prior, &prior.clone()));
    }
}
